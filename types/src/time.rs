//! Timestamp type used throughout the engine.
//!
//! Timestamps are Unix epoch seconds (UTC). Ticket expiry and nonce TTLs are
//! compared in whole seconds; sub-second precision buys nothing here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch")
            .as_secs();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by `secs` (saturating).
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_expired(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_boundary_is_inclusive() {
        let t = Timestamp::new(100);
        assert!(!t.has_expired(10, Timestamp::new(109)));
        assert!(t.has_expired(10, Timestamp::new(110)));
        assert!(t.has_expired(10, Timestamp::new(111)));
    }

    #[test]
    fn plus_secs_saturates() {
        let t = Timestamp::new(u64::MAX);
        assert_eq!(t.plus_secs(5).as_secs(), u64::MAX);
    }

    #[test]
    fn elapsed_never_underflows() {
        let t = Timestamp::new(100);
        assert_eq!(t.elapsed_since(Timestamp::new(50)), 0);
        assert_eq!(t.elapsed_since(Timestamp::new(150)), 50);
    }
}
