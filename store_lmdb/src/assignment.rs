//! LMDB implementation of AssignmentStore.
//!
//! Rows are keyed `subject \0 server \0 role` (platform ids never contain
//! NUL), values are bincode. The triple-as-key makes duplicate rows
//! structurally impossible, and `upsert` performs its read-modify-write
//! inside a single write transaction.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use tokengate_store::{AssignmentStore, StoreError};
use tokengate_types::{AssignmentKey, RoleAssignment};

use crate::LmdbError;

pub struct LmdbAssignmentStore {
    env: Arc<Env>,
    db: Database<Bytes, Bytes>,
}

fn triple_key(key: &AssignmentKey) -> Vec<u8> {
    let subject = key.subject_id.as_str().as_bytes();
    let server = key.server_id.as_str().as_bytes();
    let role = key.role_id.as_str().as_bytes();
    let mut out = Vec::with_capacity(subject.len() + server.len() + role.len() + 2);
    out.extend_from_slice(subject);
    out.push(0);
    out.extend_from_slice(server);
    out.push(0);
    out.extend_from_slice(role);
    out
}

impl LmdbAssignmentStore {
    pub(crate) fn new(env: Arc<Env>, db: Database<Bytes, Bytes>) -> Self {
        Self { env, db }
    }

    fn get_inner(&self, key: &AssignmentKey) -> Result<Option<RoleAssignment>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.db.get(&rtxn, &triple_key(key))? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    fn upsert_inner(
        &self,
        key: &AssignmentKey,
        apply: &mut dyn FnMut(Option<&RoleAssignment>) -> Option<RoleAssignment>,
    ) -> Result<Option<RoleAssignment>, LmdbError> {
        let raw_key = triple_key(key);
        let mut wtxn = self.env.write_txn()?;

        let current: Option<RoleAssignment> = match self.db.get(&wtxn, &raw_key)? {
            Some(bytes) => Some(bincode::deserialize(bytes)?),
            None => None,
        };
        match apply(current.as_ref()) {
            Some(next) => {
                let encoded = bincode::serialize(&next)?;
                self.db.put(&mut wtxn, &raw_key, &encoded)?;
                wtxn.commit()?;
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }

    fn all_active_inner(&self) -> Result<Vec<RoleAssignment>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let mut active = Vec::new();
        for result in self.db.iter(&rtxn)? {
            let (_key, bytes) = result?;
            let assignment: RoleAssignment = bincode::deserialize(bytes)?;
            if assignment.is_active() {
                active.push(assignment);
            }
        }
        active.sort_by_key(|a| a.last_checked_at);
        Ok(active)
    }
}

impl AssignmentStore for LmdbAssignmentStore {
    fn get(&self, key: &AssignmentKey) -> Result<Option<RoleAssignment>, StoreError> {
        self.get_inner(key).map_err(StoreError::from)
    }

    fn upsert(
        &self,
        key: &AssignmentKey,
        apply: &mut dyn FnMut(Option<&RoleAssignment>) -> Option<RoleAssignment>,
    ) -> Result<Option<RoleAssignment>, StoreError> {
        self.upsert_inner(key, apply).map_err(StoreError::from)
    }

    fn all_active(&self) -> Result<Vec<RoleAssignment>, StoreError> {
        self.all_active_inner().map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use tokengate_types::{AssignmentStatus, RuleId, Timestamp};

    fn assignment(subject: &str, checked: u64, status: AssignmentStatus) -> RoleAssignment {
        RoleAssignment {
            subject_id: subject.into(),
            server_id: "s1".into(),
            role_id: "r1".into(),
            rule_id: Some(RuleId::new(1)),
            status,
            verified_at: Timestamp::new(checked),
            last_checked_at: Timestamp::new(checked),
            expires_at: None,
        }
    }

    #[test]
    fn upsert_and_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path()).unwrap();
        let store = env.assignment_store();

        let a = assignment("u1", 100, AssignmentStatus::Active);
        let key = a.key();
        store.upsert(&key, &mut |_| Some(a.clone())).unwrap();
        assert_eq!(store.get(&key).unwrap().unwrap(), a);
    }

    #[test]
    fn upsert_updates_in_place_never_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path()).unwrap();
        let store = env.assignment_store();

        let a = assignment("u1", 100, AssignmentStatus::Revoked);
        let key = a.key();
        store.upsert(&key, &mut |_| Some(a.clone())).unwrap();
        store
            .upsert(&key, &mut |existing| {
                let mut row = existing.expect("row persisted").clone();
                row.status = AssignmentStatus::Active;
                row.last_checked_at = Timestamp::new(200);
                Some(row)
            })
            .unwrap();

        let row = store.get(&key).unwrap().unwrap();
        assert_eq!(row.status, AssignmentStatus::Active);
        assert_eq!(store.all_active().unwrap().len(), 1);
    }

    #[test]
    fn all_active_sorted_oldest_checked_first() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path()).unwrap();
        let store = env.assignment_store();

        for (subject, checked, status) in [
            ("u1", 300, AssignmentStatus::Active),
            ("u2", 100, AssignmentStatus::Active),
            ("u3", 200, AssignmentStatus::Expired),
        ] {
            let a = assignment(subject, checked, status);
            store.upsert(&a.key(), &mut |_| Some(a.clone())).unwrap();
        }

        let active = store.all_active().unwrap();
        let subjects: Vec<&str> = active.iter().map(|a| a.subject_id.as_str()).collect();
        assert_eq!(subjects, vec!["u2", "u1"]);
    }

    #[test]
    fn rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let a = assignment("u1", 100, AssignmentStatus::Active);
        let key = a.key();

        {
            let env = LmdbEnvironment::open(dir.path()).unwrap();
            env.assignment_store()
                .upsert(&key, &mut |_| Some(a.clone()))
                .unwrap();
        }

        let env = LmdbEnvironment::open(dir.path()).unwrap();
        assert_eq!(env.assignment_store().get(&key).unwrap().unwrap(), a);
    }
}
