//! Abstract storage traits for the TokenGate engine.
//!
//! Every storage backend (LMDB, in-memory for testing and ephemeral runs)
//! implements these traits. The engine depends only on the traits; rule
//! mutation is admin plumbing that the verification engine itself never
//! touches.

pub mod assignment;
pub mod error;
pub mod memory;
pub mod nonce;
pub mod rule;

pub use assignment::AssignmentStore;
pub use error::StoreError;
pub use memory::{MemoryAssignmentStore, MemoryNonceStore, MemoryRuleStore};
pub use nonce::NonceStore;
pub use rule::RuleStore;
