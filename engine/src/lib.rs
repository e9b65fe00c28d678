//! The TokenGate verification engine.
//!
//! End-to-end flow: a holder requests a challenge (single-use nonce bound to
//! the surface it was requested from), signs a structured ticket with their
//! wallet, and submits it. The orchestrator consumes the nonce, proves the
//! signer controls the claimed address, evaluates the applicable gating
//! rules against the holder's assets, drives the platform role API, and
//! records the grant in the role-assignment state machine. A background
//! sweep later re-checks every active grant and revokes those no longer
//! justified by current holdings.
//!
//! External collaborators (asset marketplace, platform role API, outcome
//! notification) are trait objects defined in [`providers`]; storage is the
//! trait layer from `tokengate-store`.

pub mod assignment;
pub mod error;
pub mod matcher;
pub mod nonce;
pub mod orchestrator;
pub mod outcome;
pub mod providers;
pub mod signature;
pub mod sweeper;

pub use assignment::{RoleAssignmentTracker, TransitionOutcome};
pub use error::VerifyError;
pub use matcher::ZeroMinPolicy;
pub use nonce::{NonceCheck, NonceManager};
pub use orchestrator::VerificationOrchestrator;
pub use outcome::{EvaluationPath, OutcomeNote, RuleFailure, RuleOutcome, VerifyOutcome};
pub use providers::{AssetProvider, AssignOutcome, NotificationChannel, PlatformRoleApi, ProviderError};
pub use signature::SignatureVerifier;
pub use sweeper::{ReverificationSweeper, SweepReport};
