//! HTTP implementations of the engine's collaborator interfaces.
//!
//! - [`HttpAssetProvider`]: marketplace data source for holdings
//! - [`RestPlatformApi`]: the chat platform's role management REST API
//! - [`WebhookNotifier`]: best-effort outcome delivery to a webhook
//!
//! All three are thin: build a request, check the status, decode JSON. The
//! engine owns retry-or-skip policy; these report failures and nothing else.

pub mod assets;
pub mod notify;
pub mod platform;

pub use assets::HttpAssetProvider;
pub use notify::WebhookNotifier;
pub use platform::RestPlatformApi;

use tokengate_engine::ProviderError;

pub(crate) fn transport_err(e: reqwest::Error) -> ProviderError {
    ProviderError::new(format!("transport error: {e}"))
}

pub(crate) fn status_err(context: &str, status: reqwest::StatusCode) -> ProviderError {
    ProviderError::new(format!("{context}: unexpected status {status}"))
}
