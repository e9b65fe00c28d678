//! External collaborator interfaces.
//!
//! The engine never talks to the marketplace, the chat platform, or the
//! requester directly; everything goes through these traits. Concrete HTTP
//! implementations live in `tokengate-connectors`; tests substitute
//! recording fakes.

use async_trait::async_trait;
use thiserror::Error;

use tokengate_types::{
    AssetHolding, FieldMatch, RoleId, ServerId, SubjectId, WalletAddress,
};

use crate::outcome::OutcomeNote;

/// Failure reported by an external collaborator.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProviderError(String);

impl ProviderError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Result of a role grant call against the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssignOutcome {
    /// The platform reported the subject already held the role.
    pub already_held: bool,
}

/// The marketplace data source for a holder's assets.
#[async_trait]
pub trait AssetProvider: Send + Sync {
    /// Server-side filtered count of a wallet's items in `collection` with
    /// the given attribute, for message-scoped checks. `min_items_hint` lets
    /// the provider stop counting early; it must not change the result.
    async fn count_matching(
        &self,
        address: &WalletAddress,
        collection: &FieldMatch,
        attribute: Option<(&str, &str)>,
        min_items_hint: Option<u32>,
    ) -> Result<u64, ProviderError>;

    /// Full holdings snapshot for broad-scan evaluation.
    async fn snapshot(&self, address: &WalletAddress) -> Result<Vec<AssetHolding>, ProviderError>;

    /// Wallet addresses currently linked to a subject. Used by the
    /// reverification sweep, which starts from a subject rather than an
    /// address.
    async fn addresses_for(&self, subject: &SubjectId) -> Result<Vec<WalletAddress>, ProviderError>;
}

/// The platform calls that physically grant and withdraw roles.
#[async_trait]
pub trait PlatformRoleApi: Send + Sync {
    async fn assign(
        &self,
        subject: &SubjectId,
        role: &RoleId,
        server: &ServerId,
    ) -> Result<AssignOutcome, ProviderError>;

    /// Returns whether the role was actually removed (`false` when the
    /// subject did not hold it).
    async fn revoke(
        &self,
        subject: &SubjectId,
        role: &RoleId,
        server: &ServerId,
    ) -> Result<bool, ProviderError>;

    /// Whether the subject is still a member of the server.
    async fn is_member(&self, subject: &SubjectId, server: &ServerId)
        -> Result<bool, ProviderError>;
}

/// Best-effort delivery of an outcome summary to the original requester.
///
/// Delivery failures are logged and never escalated; the engine's result
/// does not depend on whether the notification landed.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn notify(
        &self,
        subject: &SubjectId,
        context: &tokengate_types::ChallengeContext,
        note: &OutcomeNote,
    ) -> Result<(), ProviderError>;
}
