//! Wallet address type with `gate_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A TokenGate wallet address, always prefixed with `gate_`.
///
/// Derived from the wallet's public key via Blake2b hashing + base32 encoding
/// (see `tokengate-crypto`). Addresses are canonical: lowercase base32 with an
/// embedded checksum, so two well-formed addresses are equal iff their bytes
/// are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// The standard prefix for all TokenGate wallet addresses.
    pub const PREFIX: &'static str = "gate_";

    /// Create a new wallet address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `gate_`. Untrusted wire input
    /// arrives through serde and must be validated with
    /// `tokengate_crypto::validate_address` before use.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with gate_");
        Self(s)
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cheap shape check: correct prefix and non-empty body.
    ///
    /// Full checksum validation lives in `tokengate-crypto`.
    pub fn is_wellformed(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_prefixed_address() {
        let addr = WalletAddress::new("gate_abc123");
        assert_eq!(addr.as_str(), "gate_abc123");
        assert!(addr.is_wellformed());
    }

    #[test]
    #[should_panic]
    fn rejects_foreign_prefix() {
        WalletAddress::new("nano_abc123");
    }

    #[test]
    fn deserialized_address_can_be_malformed() {
        // Serde is transparent; shape checks are the caller's job.
        let addr: WalletAddress = serde_json::from_str("\"not-an-address\"").unwrap();
        assert!(!addr.is_wellformed());
    }
}
