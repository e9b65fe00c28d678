//! Single-use challenge entries and their request context.

use crate::ids::{ChannelId, MessageId};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Where a challenge was requested from.
///
/// A challenge issued from a rule-bearing message carries that binding so the
/// later verification can be evaluated message-scoped; a bare challenge (no
/// binding) falls through to the broad server-wide scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeContext {
    pub message_id: Option<MessageId>,
    pub channel_id: Option<ChannelId>,
}

impl ChallengeContext {
    /// Context for a challenge requested from a specific message.
    pub fn for_message(message_id: MessageId, channel_id: ChannelId) -> Self {
        Self {
            message_id: Some(message_id),
            channel_id: Some(channel_id),
        }
    }

    /// A context with no message binding.
    pub fn unbound() -> Self {
        Self::default()
    }
}

/// A stored challenge: one live entry per subject.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NonceEntry {
    /// The unpredictable challenge token (hex).
    pub value: String,
    /// The context the challenge was requested from.
    pub context: ChallengeContext,
    /// Hard deadline after which the entry is dead even if never consumed.
    pub expires_at: Timestamp,
}

impl NonceEntry {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_expiry_is_inclusive() {
        let entry = NonceEntry {
            value: "ab".into(),
            context: ChallengeContext::unbound(),
            expires_at: Timestamp::new(100),
        };
        assert!(!entry.is_expired(Timestamp::new(99)));
        assert!(entry.is_expired(Timestamp::new(100)));
    }

    #[test]
    fn message_context_carries_both_ids() {
        let ctx = ChallengeContext::for_message("m1".into(), "c1".into());
        assert_eq!(ctx.message_id.unwrap().as_str(), "m1");
        assert_eq!(ctx.channel_id.unwrap().as_str(), "c1");
    }
}
