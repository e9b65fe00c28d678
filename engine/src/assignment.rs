//! The role-assignment state machine.
//!
//! Every status write for a (subject, server, role) triple goes through this
//! tracker; callers never touch the status field directly. Transitions:
//!
//! - none     -> active   ([`TransitionOutcome::Created`])
//! - active   -> active   (refresh, [`TransitionOutcome::Refreshed`])
//! - revoked  -> active   (reactivation in place, [`TransitionOutcome::Reactivated`])
//! - expired  -> active   (same)
//! - active   -> revoked  (reverification sweep only)
//! - active   -> expired  (external time-box policy)
//!
//! All writes run through the store's atomic keyed upsert, so concurrent
//! verification attempts for the same triple can never create a duplicate
//! row.

use std::sync::Arc;

use tokengate_store::{AssignmentStore, StoreError};
use tokengate_types::{
    AssignmentKey, AssignmentStatus, RoleAssignment, RuleId, Timestamp,
};

/// Which named transition a successful verification performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// First grant: a new row was created.
    Created,
    /// The triple was already active; bookkeeping was refreshed.
    Refreshed,
    /// A revoked or expired row was brought back to active in place.
    Reactivated,
}

pub struct RoleAssignmentTracker {
    store: Arc<dyn AssignmentStore>,
}

impl RoleAssignmentTracker {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self { store }
    }

    /// A successful verification for this triple: create, refresh, or
    /// reactivate. `verified_at` is preserved across refreshes and reset on
    /// reactivation (a reactivated grant is a new grant).
    pub fn record_verified(
        &self,
        key: &AssignmentKey,
        rule_id: Option<RuleId>,
        now: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut outcome = TransitionOutcome::Created;

        self.store.upsert(key, &mut |existing| {
            Some(match existing {
                None => {
                    outcome = TransitionOutcome::Created;
                    RoleAssignment {
                        subject_id: key.subject_id.clone(),
                        server_id: key.server_id.clone(),
                        role_id: key.role_id.clone(),
                        rule_id,
                        status: AssignmentStatus::Active,
                        verified_at: now,
                        last_checked_at: now,
                        expires_at,
                    }
                }
                Some(row) => {
                    let mut row = row.clone();
                    if row.status == AssignmentStatus::Active {
                        outcome = TransitionOutcome::Refreshed;
                    } else {
                        outcome = TransitionOutcome::Reactivated;
                        row.status = AssignmentStatus::Active;
                        row.verified_at = now;
                    }
                    row.rule_id = rule_id;
                    row.last_checked_at = now;
                    row.expires_at = expires_at;
                    row
                }
            })
        })?;

        tracing::debug!(key = %key, ?outcome, "assignment recorded");
        Ok(outcome)
    }

    /// active -> revoked. Returns `false` (and writes nothing) unless the
    /// row exists and is active.
    pub fn mark_revoked(&self, key: &AssignmentKey, now: Timestamp) -> Result<bool, StoreError> {
        self.transition_active(key, now, AssignmentStatus::Revoked)
    }

    /// active -> expired, for the external time-box policy.
    pub fn mark_expired(&self, key: &AssignmentKey, now: Timestamp) -> Result<bool, StoreError> {
        self.transition_active(key, now, AssignmentStatus::Expired)
    }

    /// Refresh `last_checked_at` on an active row without any status change.
    pub fn touch(&self, key: &AssignmentKey, now: Timestamp) -> Result<bool, StoreError> {
        let written = self.store.upsert(key, &mut |existing| {
            existing.filter(|row| row.is_active()).map(|row| {
                let mut row = row.clone();
                row.last_checked_at = now;
                row
            })
        })?;
        Ok(written.is_some())
    }

    /// All active rows, oldest `last_checked_at` first (sweep order).
    pub fn active_assignments(&self) -> Result<Vec<RoleAssignment>, StoreError> {
        self.store.all_active()
    }

    /// Read one row.
    pub fn get(&self, key: &AssignmentKey) -> Result<Option<RoleAssignment>, StoreError> {
        self.store.get(key)
    }

    fn transition_active(
        &self,
        key: &AssignmentKey,
        now: Timestamp,
        to: AssignmentStatus,
    ) -> Result<bool, StoreError> {
        let written = self.store.upsert(key, &mut |existing| {
            existing.filter(|row| row.is_active()).map(|row| {
                let mut row = row.clone();
                row.status = to;
                row.last_checked_at = now;
                row
            })
        })?;

        if written.is_some() {
            tracing::info!(key = %key, status = %to, "assignment transitioned");
        }
        Ok(written.is_some())
    }
}
