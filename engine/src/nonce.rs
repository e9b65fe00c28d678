//! Single-use challenge issuance and consumption.
//!
//! One live nonce per subject. Creating a new one unconditionally replaces
//! any prior entry. That overwrite is a deliberate, cheap substitute for a
//! per-subject lock: of two concurrent verification attempts, only the one
//! holding the most recently issued nonce can ever complete.

use std::sync::Arc;

use rand::RngCore;

use tokengate_store::{NonceStore, StoreError};
use tokengate_types::{ChallengeContext, NonceEntry, SubjectId, Timestamp};

/// Byte length of the random challenge token (hex-encoded on the wire).
const TOKEN_BYTES: usize = 32;

/// Result of a consume attempt. Absence and mismatch are normal negative
/// results, never errors.
#[derive(Clone, Debug)]
pub struct NonceCheck {
    pub valid: bool,
    /// The stored challenge context, present only on a valid match.
    pub context: Option<ChallengeContext>,
}

impl NonceCheck {
    fn invalid() -> Self {
        Self {
            valid: false,
            context: None,
        }
    }
}

pub struct NonceManager {
    store: Arc<dyn NonceStore>,
    ttl_secs: u64,
}

impl NonceManager {
    pub fn new(store: Arc<dyn NonceStore>, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a fresh challenge for a subject, replacing any existing one.
    pub fn create(
        &self,
        subject: &SubjectId,
        context: ChallengeContext,
    ) -> Result<String, StoreError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let entry = NonceEntry {
            value: token.clone(),
            context,
            expires_at: Timestamp::now().plus_secs(self.ttl_secs),
        };
        self.store.put(subject, entry)?;

        tracing::debug!(subject = %subject, ttl_secs = self.ttl_secs, "challenge issued");
        Ok(token)
    }

    /// Read-and-compare the live challenge for a subject. Does NOT delete;
    /// the caller invalidates after reading the context so a failing
    /// signature check still burns the nonce.
    pub fn consume(&self, subject: &SubjectId, candidate: &str) -> NonceCheck {
        let entry = match self.store.get(subject) {
            Ok(Some(entry)) => entry,
            Ok(None) => return NonceCheck::invalid(),
            Err(e) => {
                tracing::warn!(subject = %subject, error = %e, "nonce store read failed");
                return NonceCheck::invalid();
            }
        };

        if entry.value != candidate {
            return NonceCheck::invalid();
        }

        NonceCheck {
            valid: true,
            context: Some(entry.context),
        }
    }

    /// Delete the stored challenge. Idempotent; store failures are logged,
    /// never surfaced.
    pub fn invalidate(&self, subject: &SubjectId) {
        if let Err(e) = self.store.delete(subject) {
            tracing::warn!(subject = %subject, error = %e, "nonce invalidation failed");
        }
    }
}
