//! Shared utilities for TokenGate.

pub mod logging;
pub mod stats;
pub mod time;

pub use logging::{init_tracing, init_tracing_with_level};
pub use stats::StatsCounter;
pub use time::format_duration;
