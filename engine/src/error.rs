use thiserror::Error;

/// Failures fatal to a whole verification request.
///
/// Nonce, expiry, and signature failures abort immediately with the nonce
/// already invalidated; no retry with the same nonce is possible. Per-rule
/// side-effect failures are NOT here; they are recovered locally and
/// reported through [`crate::RuleOutcome::Failed`].
#[derive(Debug, Error)]
pub enum VerifyError {
    /// No live challenge for this subject, or the submitted value does not
    /// match the most recently issued one.
    #[error("challenge is invalid or has expired; request a new one")]
    NonceInvalidOrExpired,

    /// The ticket's own deadline has passed (boundary inclusive).
    #[error("signed ticket expired at {expiry_unix_seconds}")]
    VerificationExpired { expiry_unix_seconds: u64 },

    /// The proof does not verify, or the recovered signer is not the
    /// claimed address.
    #[error("signature does not match the claimed address")]
    SignatureMismatch,

    /// The server has no rules configured for this evaluation path.
    #[error("no verification rules are configured for this server")]
    NoApplicableRules,

    /// Rules exist, but the holder's assets satisfy none of them.
    #[error("current holdings do not satisfy any configured rule")]
    InsufficientHoldings,

    /// The asset provider could not be queried; nothing was granted.
    #[error("asset lookup failed: {0}")]
    AssetProvider(String),

    /// Anything else. The nonce is still consumed exactly once; the detail
    /// is logged server-side and not shown to the requester.
    #[error("verification failed unexpectedly")]
    Unexpected(String),
}

impl VerifyError {
    /// The message shown to the requester. Deliberately distinguishes
    /// "no rules", "rules not satisfied", and "nonce/signature problem",
    /// since each requires a different user action.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unexpected(_) => "verification failed unexpectedly".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_detail_is_not_user_visible() {
        let err = VerifyError::Unexpected("lmdb mapsize exceeded at /var/db".to_string());
        assert!(!err.user_message().contains("lmdb"));
    }

    #[test]
    fn user_messages_disambiguate_failure_classes() {
        let no_rules = VerifyError::NoApplicableRules.user_message();
        let unsatisfied = VerifyError::InsufficientHoldings.user_message();
        let nonce = VerifyError::NonceInvalidOrExpired.user_message();
        assert_ne!(no_rules, unsatisfied);
        assert_ne!(unsatisfied, nonce);
    }
}
