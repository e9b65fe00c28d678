//! Per-rule and per-request outcome types.
//!
//! Side effects can partially fail, so each rule's result is an explicit
//! value collected into a list rather than an exception thrown mid-loop.

use serde::Serialize;
use tokengate_types::{RoleId, RuleId, WalletAddress};

/// A per-rule side-effect failure, recovered locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFailure {
    /// The platform role API call failed.
    RoleApi(String),
    /// The assignment row could not be persisted.
    Persistence(String),
}

/// The outcome of evaluating one applicable rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum RuleOutcome {
    /// The rule was satisfied, the role granted, the assignment recorded.
    Assigned {
        rule_id: Option<RuleId>,
        role_id: RoleId,
        already_held: bool,
    },
    /// The rule was evaluated and not satisfied.
    Unsatisfied {
        rule_id: Option<RuleId>,
        role_id: RoleId,
    },
    /// The rule was satisfied but a side effect failed; excluded from the
    /// assigned set, other rules unaffected.
    Failed {
        rule_id: Option<RuleId>,
        role_id: RoleId,
        failure: RuleFailure,
    },
}

impl RuleOutcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }

    pub fn role_id(&self) -> &RoleId {
        match self {
            Self::Assigned { role_id, .. }
            | Self::Unsatisfied { role_id, .. }
            | Self::Failed { role_id, .. } => role_id,
        }
    }
}

/// Which resolution path the orchestrator took.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPath {
    /// Rules bound to the message the challenge was requested from.
    MessageScoped,
    /// Deprecated single-role ticket reference.
    LegacySingleRole,
    /// All rules for the server against one holdings snapshot.
    BroadScan,
}

/// The aggregate result of a successful verification request.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyOutcome {
    /// The proven signer address.
    pub address: WalletAddress,
    pub path: EvaluationPath,
    /// One entry per applicable rule, in evaluation order.
    pub outcomes: Vec<RuleOutcome>,
}

impl VerifyOutcome {
    /// Roles actually granted this request.
    pub fn assigned_roles(&self) -> Vec<RoleId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_assigned())
            .map(|o| o.role_id().clone())
            .collect()
    }
}

/// The best-effort summary delivered back to the requester.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum OutcomeNote {
    Verified { roles: Vec<RoleId> },
    Rejected { reason: String },
}
