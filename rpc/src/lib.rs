//! HTTP API for TokenGate.
//!
//! Three routes: challenge issuance, verification submission, and health.
//! The submission wire format is `{ "data": base64(JSON ticket),
//! "signature": hex proof }`; the signature is produced client-side over the
//! domain-separated structured message from `tokengate-crypto`.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{RpcServer, RpcState};
