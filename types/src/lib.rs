//! Fundamental types for the TokenGate verification engine.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: platform identifiers, wallet addresses, timestamps, the signed
//! verification ticket, gating rules, asset holdings, role assignments, and
//! engine parameters.

pub mod address;
pub mod assignment;
pub mod holding;
pub mod ids;
pub mod nonce;
pub mod params;
pub mod rule;
pub mod ticket;
pub mod time;

pub use address::WalletAddress;
pub use assignment::{AssignmentKey, AssignmentStatus, RoleAssignment};
pub use holding::AssetHolding;
pub use ids::{ChannelId, MessageId, RoleId, RuleId, ServerId, SubjectId};
pub use nonce::{ChallengeContext, NonceEntry};
pub use params::EngineParams;
pub use rule::{FieldMatch, VerificationRule, WILDCARD_LITERAL};
pub use ticket::VerificationTicket;
pub use time::Timestamp;
