//! Gating rules and the tagged wildcard type for their filterable fields.

use crate::ids::{MessageId, RoleId, RuleId, ServerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Historic wire literal meaning "match anything".
pub const WILDCARD_LITERAL: &str = "ALL";

/// A filterable rule field: either "match anything" or an exact value.
///
/// Historically this was a loosely-typed field serialized as `null` or the
/// literal string `"ALL"`, compared ad hoc at every call site. Both historic
/// encodings still deserialize to [`FieldMatch::Wildcard`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum FieldMatch {
    /// Match any value.
    Wildcard,
    /// Match this value exactly.
    Exact(String),
}

impl FieldMatch {
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Whether the candidate value satisfies this field.
    pub fn accepts(&self, candidate: &str) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Exact(value) => value == candidate,
        }
    }
}

impl Default for FieldMatch {
    fn default() -> Self {
        Self::Wildcard
    }
}

impl From<Option<String>> for FieldMatch {
    fn from(raw: Option<String>) -> Self {
        match raw {
            None => Self::Wildcard,
            Some(s) if s == WILDCARD_LITERAL => Self::Wildcard,
            Some(s) => Self::Exact(s),
        }
    }
}

impl From<FieldMatch> for Option<String> {
    fn from(field: FieldMatch) -> Self {
        match field {
            FieldMatch::Wildcard => Some(WILDCARD_LITERAL.to_string()),
            FieldMatch::Exact(value) => Some(value),
        }
    }
}

impl fmt::Display for FieldMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => write!(f, "{WILDCARD_LITERAL}"),
            Self::Exact(value) => write!(f, "{value}"),
        }
    }
}

/// A community operator's gating rule.
///
/// "A holder of ≥ `min_items` items from `collection` with
/// `attribute_key` = `attribute_value` gets `role_id`."
///
/// The attribute filter only activates when BOTH `attribute_key` and
/// `attribute_value` are exact; a half-specified filter is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRule {
    pub id: RuleId,
    pub server_id: ServerId,
    /// Verification surface this rule is bound to, if any.
    #[serde(default)]
    pub message_id: Option<MessageId>,
    #[serde(default)]
    pub channel: FieldMatch,
    #[serde(default)]
    pub collection: FieldMatch,
    #[serde(default)]
    pub attribute_key: FieldMatch,
    #[serde(default)]
    pub attribute_value: FieldMatch,
    /// Minimum holding count. `None` means an effective minimum of 1.
    #[serde(default)]
    pub min_items: Option<u32>,
    pub role_id: RoleId,
}

impl VerificationRule {
    /// The attribute filter, when fully specified (both key and value exact).
    pub fn attribute_filter(&self) -> Option<(&str, &str)> {
        match (&self.attribute_key, &self.attribute_value) {
            (FieldMatch::Exact(key), FieldMatch::Exact(value)) => Some((key, value)),
            _ => None,
        }
    }
}
