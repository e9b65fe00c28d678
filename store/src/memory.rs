//! In-memory backends, used by tests and ephemeral (non-persistent) runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use tokengate_types::{
    AssignmentKey, MessageId, NonceEntry, RoleAssignment, RuleId, ServerId, SubjectId, Timestamp,
    VerificationRule,
};

use crate::{AssignmentStore, NonceStore, RuleStore, StoreError};

fn lock_err() -> StoreError {
    StoreError::Backend("store lock poisoned".to_string())
}

/// Bounded TTL nonce store.
///
/// At capacity, expired entries are dropped first; if none are expired the
/// entry closest to its deadline is evicted. Expired entries are also dropped
/// lazily on read.
pub struct MemoryNonceStore {
    entries: Mutex<HashMap<SubjectId, NonceEntry>>,
    capacity: usize,
}

impl MemoryNonceStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NonceStore for MemoryNonceStore {
    fn put(&self, subject: &SubjectId, entry: NonceEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| lock_err())?;

        if !entries.contains_key(subject) && entries.len() >= self.capacity {
            let now = Timestamp::now();
            entries.retain(|_, e| !e.is_expired(now));
            if entries.len() >= self.capacity {
                let victim = entries
                    .iter()
                    .min_by_key(|(_, e)| e.expires_at)
                    .map(|(subject, _)| subject.clone());
                if let Some(victim) = victim {
                    entries.remove(&victim);
                }
            }
        }

        entries.insert(subject.clone(), entry);
        Ok(())
    }

    fn get(&self, subject: &SubjectId) -> Result<Option<NonceEntry>, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| lock_err())?;
        match entries.get(subject) {
            Some(entry) if entry.is_expired(Timestamp::now()) => {
                entries.remove(subject);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }

    fn delete(&self, subject: &SubjectId) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| lock_err())?;
        entries.remove(subject);
        Ok(())
    }
}

/// In-memory rule store keyed by rule id.
#[derive(Default)]
pub struct MemoryRuleStore {
    rules: Mutex<BTreeMap<RuleId, VerificationRule>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RuleStore for MemoryRuleStore {
    fn rules_for_message(
        &self,
        server: &ServerId,
        message: &MessageId,
    ) -> Result<Vec<VerificationRule>, StoreError> {
        let rules = self.rules.lock().map_err(|_| lock_err())?;
        Ok(rules
            .values()
            .filter(|r| &r.server_id == server && r.message_id.as_ref() == Some(message))
            .cloned()
            .collect())
    }

    fn rules_for_server(&self, server: &ServerId) -> Result<Vec<VerificationRule>, StoreError> {
        let rules = self.rules.lock().map_err(|_| lock_err())?;
        Ok(rules
            .values()
            .filter(|r| &r.server_id == server)
            .cloned()
            .collect())
    }

    fn rule_by_id(&self, id: RuleId) -> Result<Option<VerificationRule>, StoreError> {
        let rules = self.rules.lock().map_err(|_| lock_err())?;
        Ok(rules.get(&id).cloned())
    }

    fn put_rule(&self, rule: VerificationRule) -> Result<(), StoreError> {
        let mut rules = self.rules.lock().map_err(|_| lock_err())?;
        rules.insert(rule.id, rule);
        Ok(())
    }

    fn delete_rule(&self, id: RuleId) -> Result<(), StoreError> {
        let mut rules = self.rules.lock().map_err(|_| lock_err())?;
        rules.remove(&id);
        Ok(())
    }
}

/// In-memory assignment store keyed by the (subject, server, role) triple.
#[derive(Default)]
pub struct MemoryAssignmentStore {
    rows: Mutex<HashMap<AssignmentKey, RoleAssignment>>,
}

impl MemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl AssignmentStore for MemoryAssignmentStore {
    fn get(&self, key: &AssignmentKey) -> Result<Option<RoleAssignment>, StoreError> {
        let rows = self.rows.lock().map_err(|_| lock_err())?;
        Ok(rows.get(key).cloned())
    }

    fn upsert(
        &self,
        key: &AssignmentKey,
        apply: &mut dyn FnMut(Option<&RoleAssignment>) -> Option<RoleAssignment>,
    ) -> Result<Option<RoleAssignment>, StoreError> {
        let mut rows = self.rows.lock().map_err(|_| lock_err())?;
        match apply(rows.get(key)) {
            Some(next) => {
                rows.insert(key.clone(), next.clone());
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }

    fn all_active(&self) -> Result<Vec<RoleAssignment>, StoreError> {
        let rows = self.rows.lock().map_err(|_| lock_err())?;
        let mut active: Vec<RoleAssignment> =
            rows.values().filter(|a| a.is_active()).cloned().collect();
        active.sort_by_key(|a| a.last_checked_at);
        Ok(active)
    }
}
