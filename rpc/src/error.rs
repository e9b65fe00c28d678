//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use tokengate_engine::VerifyError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("store error: {0}")]
    Store(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Verify(e) => match e {
                VerifyError::NonceInvalidOrExpired
                | VerifyError::VerificationExpired { .. }
                | VerifyError::SignatureMismatch => StatusCode::UNAUTHORIZED,
                VerifyError::NoApplicableRules => StatusCode::NOT_FOUND,
                VerifyError::InsufficientHoldings => StatusCode::FORBIDDEN,
                VerifyError::AssetProvider(_) => StatusCode::BAD_GATEWAY,
                VerifyError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(_) | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Verify(e) => e.user_message(),
            Self::InvalidRequest(msg) => format!("invalid request: {msg}"),
            // Internal detail stays in the logs.
            Self::Store(_) | Self::Server(_) => "internal error".to_string(),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}
