//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::assignment::LmdbAssignmentStore;
use crate::rule::LmdbRuleStore;
use crate::LmdbError;

/// Default map size: 1 GiB. Assignments and rules are tiny; this is headroom.
const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    assignments_db: Database<Bytes, Bytes>,
    rules_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Io(e.to_string()))?;

        // SAFETY: the environment directory is owned by this process and is
        // not opened twice (heed's documented requirement for `open`).
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(DEFAULT_MAP_SIZE)
                .max_dbs(4)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let assignments_db = env.create_database(&mut wtxn, Some("assignments"))?;
        let rules_db = env.create_database(&mut wtxn, Some("rules"))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            assignments_db,
            rules_db,
        })
    }

    pub fn assignment_store(&self) -> LmdbAssignmentStore {
        LmdbAssignmentStore::new(Arc::clone(&self.env), self.assignments_db)
    }

    pub fn rule_store(&self) -> LmdbRuleStore {
        LmdbRuleStore::new(Arc::clone(&self.env), self.rules_db)
    }
}
