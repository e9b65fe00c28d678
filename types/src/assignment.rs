//! Role assignments: the persisted record that a subject holds a role.

use crate::ids::{RoleId, RuleId, ServerId, SubjectId};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a role assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    /// Granted and believed to still be justified by current holdings.
    Active,
    /// Timed out under an external expiry policy.
    Expired,
    /// Withdrawn by the reverification sweep: holdings no longer qualify.
    Revoked,
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        };
        write!(f, "{s}")
    }
}

/// The unique key of a role assignment. One row per triple, never duplicated.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentKey {
    pub subject_id: SubjectId,
    pub server_id: ServerId,
    pub role_id: RoleId,
}

impl AssignmentKey {
    pub fn new(subject_id: SubjectId, server_id: ServerId, role_id: RoleId) -> Self {
        Self {
            subject_id,
            server_id,
            role_id,
        }
    }
}

impl fmt::Display for AssignmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.subject_id, self.server_id, self.role_id
        )
    }
}

/// A persisted role assignment.
///
/// Status transitions are owned exclusively by the assignment tracker and the
/// reverification sweeper; nothing else writes the status field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub subject_id: SubjectId,
    pub server_id: ServerId,
    pub role_id: RoleId,
    /// The rule that granted this role. `None` for legacy single-role grants.
    pub rule_id: Option<RuleId>,
    pub status: AssignmentStatus,
    pub verified_at: Timestamp,
    pub last_checked_at: Timestamp,
    /// Deadline for time-boxed grants, when an expiry policy is configured.
    pub expires_at: Option<Timestamp>,
}

impl RoleAssignment {
    pub fn key(&self) -> AssignmentKey {
        AssignmentKey::new(
            self.subject_id.clone(),
            self.server_id.clone(),
            self.role_id.clone(),
        )
    }

    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }
}
