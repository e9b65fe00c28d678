//! Platform identifier newtypes.
//!
//! Subjects, servers, channels, messages, and roles are all identified by
//! opaque snowflake-style strings handed to us by the chat platform. Keeping
//! them as distinct types prevents the classic "passed the role id where the
//! server id goes" bug at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id! {
    /// The wallet holder attempting verification (stable platform user id).
    SubjectId
}

string_id! {
    /// The community/tenant scope a rule and role assignment belong to.
    ServerId
}

string_id! {
    /// A channel within a server; rules may be bound to one.
    ChannelId
}

string_id! {
    /// A verification surface: the message a challenge was requested from.
    MessageId
}

string_id! {
    /// An access-control role granted on successful verification.
    RoleId
}

/// Database identifier of a [`crate::VerificationRule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(u64);

impl RuleId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RuleId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
