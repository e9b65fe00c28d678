//! LMDB implementation of RuleStore.
//!
//! Rules are keyed by big-endian rule id. Server and message lookups are
//! full scans: a deployment holds at most a few hundred rules, and rules are
//! read far more rarely than assignments.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use tokengate_store::{RuleStore, StoreError};
use tokengate_types::{MessageId, RuleId, ServerId, VerificationRule};

use crate::LmdbError;

pub struct LmdbRuleStore {
    env: Arc<Env>,
    db: Database<Bytes, Bytes>,
}

fn rule_key(id: RuleId) -> [u8; 8] {
    id.as_u64().to_be_bytes()
}

impl LmdbRuleStore {
    pub(crate) fn new(env: Arc<Env>, db: Database<Bytes, Bytes>) -> Self {
        Self { env, db }
    }

    fn scan<F>(&self, mut keep: F) -> Result<Vec<VerificationRule>, LmdbError>
    where
        F: FnMut(&VerificationRule) -> bool,
    {
        let rtxn = self.env.read_txn()?;
        let mut rules = Vec::new();
        for result in self.db.iter(&rtxn)? {
            let (_key, bytes) = result?;
            let rule: VerificationRule = bincode::deserialize(bytes)?;
            if keep(&rule) {
                rules.push(rule);
            }
        }
        Ok(rules)
    }
}

impl RuleStore for LmdbRuleStore {
    fn rules_for_message(
        &self,
        server: &ServerId,
        message: &MessageId,
    ) -> Result<Vec<VerificationRule>, StoreError> {
        self.scan(|r| &r.server_id == server && r.message_id.as_ref() == Some(message))
            .map_err(StoreError::from)
    }

    fn rules_for_server(&self, server: &ServerId) -> Result<Vec<VerificationRule>, StoreError> {
        self.scan(|r| &r.server_id == server).map_err(StoreError::from)
    }

    fn rule_by_id(&self, id: RuleId) -> Result<Option<VerificationRule>, StoreError> {
        let inner = || -> Result<Option<VerificationRule>, LmdbError> {
            let rtxn = self.env.read_txn()?;
            match self.db.get(&rtxn, &rule_key(id))? {
                Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
                None => Ok(None),
            }
        };
        inner().map_err(StoreError::from)
    }

    fn put_rule(&self, rule: VerificationRule) -> Result<(), StoreError> {
        let inner = || -> Result<(), LmdbError> {
            let mut wtxn = self.env.write_txn()?;
            let encoded = bincode::serialize(&rule)?;
            self.db.put(&mut wtxn, &rule_key(rule.id), &encoded)?;
            wtxn.commit()?;
            Ok(())
        };
        inner().map_err(StoreError::from)
    }

    fn delete_rule(&self, id: RuleId) -> Result<(), StoreError> {
        let inner = || -> Result<(), LmdbError> {
            let mut wtxn = self.env.write_txn()?;
            self.db.delete(&mut wtxn, &rule_key(id))?;
            wtxn.commit()?;
            Ok(())
        };
        inner().map_err(StoreError::from)
    }
}
