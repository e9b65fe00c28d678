//! Gating rule storage trait.

use crate::StoreError;
use tokengate_types::{MessageId, RuleId, ServerId, VerificationRule};

pub trait RuleStore: Send + Sync {
    /// Rules bound to a specific verification surface (message).
    fn rules_for_message(
        &self,
        server: &ServerId,
        message: &MessageId,
    ) -> Result<Vec<VerificationRule>, StoreError>;

    /// All rules configured for a server, regardless of binding.
    fn rules_for_server(&self, server: &ServerId) -> Result<Vec<VerificationRule>, StoreError>;

    /// Look up a single rule. Absent rules are a normal `Ok(None)`: the
    /// sweeper skips assignments whose originating rule was deleted.
    fn rule_by_id(&self, id: RuleId) -> Result<Option<VerificationRule>, StoreError>;

    /// Insert or replace a rule. Admin-side plumbing; the verification
    /// engine never mutates rules.
    fn put_rule(&self, rule: VerificationRule) -> Result<(), StoreError>;

    /// Delete a rule. Idempotent admin-side plumbing.
    fn delete_rule(&self, id: RuleId) -> Result<(), StoreError>;
}
