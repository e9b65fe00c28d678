//! Axum-based RPC server.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use tokengate_crypto::validate_address;
use tokengate_engine::VerificationOrchestrator;
use tokengate_types::{ChallengeContext, SubjectId, Timestamp};
use tokengate_utils::StatsCounter;

use crate::handlers::{
    decode_ticket, ChallengeRequest, ChallengeResponse, HealthResponse, VerifyRequest,
    VerifyResponse,
};
use crate::RpcError;

/// Shared state for the RPC routes.
pub struct RpcState {
    pub orchestrator: Arc<VerificationOrchestrator>,
    pub stats: Arc<StatsCounter>,
    pub started_at: Timestamp,
}

impl RpcState {
    pub fn new(orchestrator: Arc<VerificationOrchestrator>) -> Self {
        Self {
            orchestrator,
            stats: Arc::new(StatsCounter::new(&["verified", "rejected", "challenges"])),
            started_at: Timestamp::now(),
        }
    }
}

pub struct RpcServer {
    port: u16,
    state: Arc<RpcState>,
}

impl RpcServer {
    pub fn new(port: u16, state: Arc<RpcState>) -> Self {
        Self { port, state }
    }

    /// Build the router; separated from `start` so tests can drive it
    /// without binding a socket.
    pub fn router(state: Arc<RpcState>) -> Router {
        Router::new()
            .route("/api/challenge", post(challenge))
            .route("/api/verify", post(verify))
            .route("/api/health", get(health))
            .with_state(state)
    }

    /// Bind and serve until the process shuts down.
    pub async fn start(&self) -> Result<(), RpcError> {
        let app = Self::router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", self.port))
            .await
            .map_err(|e| RpcError::Server(format!("bind failed on port {}: {e}", self.port)))?;
        tracing::info!(port = self.port, "rpc server listening");
        axum::serve(listener, app)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}

async fn challenge(
    State(state): State<Arc<RpcState>>,
    Json(req): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, RpcError> {
    if req.subject_id.is_empty() {
        return Err(RpcError::InvalidRequest("subjectId is required".to_string()));
    }

    let subject = SubjectId::new(req.subject_id);
    let context = ChallengeContext {
        message_id: req.message_id.map(Into::into),
        channel_id: req.channel_id.map(Into::into),
    };

    let nonce = state
        .orchestrator
        .nonces()
        .create(&subject, context)
        .map_err(|e| RpcError::Store(e.to_string()))?;
    state.stats.increment("challenges");

    Ok(Json(ChallengeResponse {
        nonce,
        expires_in_secs: state.orchestrator.nonces().ttl_secs(),
    }))
}

async fn verify(
    State(state): State<Arc<RpcState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, RpcError> {
    let ticket = decode_ticket(&req.data)?;

    // Reject malformed claimed addresses before the pipeline runs; a failed
    // checksum can never verify, and the error is more actionable here.
    if !validate_address(ticket.claimed_address.as_str()) {
        state.stats.increment("rejected");
        return Err(RpcError::InvalidRequest(
            "claimed address is not a well-formed wallet address".to_string(),
        ));
    }

    match state.orchestrator.verify(&ticket, &req.signature).await {
        Ok(outcome) => {
            state.stats.increment("verified");
            Ok(Json(outcome.into()))
        }
        Err(e) => {
            state.stats.increment("rejected");
            Err(e.into())
        }
    }
}

async fn health(State(state): State<Arc<RpcState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed_since(Timestamp::now()),
        verified: state.stats.get("verified"),
        rejected: state.stats.get("rejected"),
    })
}
