//! Engine parameters.
//!
//! Everything operationally tunable about the verification engine lives here;
//! the daemon fills this struct from its TOML config.

use serde::{Deserialize, Serialize};

/// Tunable parameters for the verification engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineParams {
    /// Challenge lifetime in seconds. Default: 5 minutes.
    pub nonce_ttl_secs: u64,

    /// Upper bound on simultaneously-live challenges. The nonce store is a
    /// keyed TTL store with bounded size; at capacity the oldest entry is
    /// evicted.
    pub nonce_capacity: usize,

    /// Signing domain name baked into every ticket digest.
    pub domain_name: String,

    /// Signing domain version. Bump to invalidate all previously signed
    /// tickets.
    pub domain_version: String,

    /// Chain the claimed addresses live on.
    pub chain_id: u64,

    /// Optional time-box for grants, in seconds from verification. `None`
    /// disables the external expiry policy.
    pub assignment_ttl_secs: Option<u64>,
}

impl EngineParams {
    pub fn defaults() -> Self {
        Self {
            nonce_ttl_secs: 300,
            nonce_capacity: 10_000,
            domain_name: "TokenGate Verification".to_string(),
            domain_version: "1".to_string(),
            chain_id: 1,
            assignment_ttl_secs: None,
        }
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self::defaults()
    }
}
