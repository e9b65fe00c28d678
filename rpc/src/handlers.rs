//! Request/response DTOs and wire decoding.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use tokengate_engine::{EvaluationPath, RuleOutcome, VerifyOutcome};
use tokengate_types::VerificationTicket;

use crate::RpcError;

// ── Challenge ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    pub subject_id: String,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub nonce: String,
    pub expires_in_secs: u64,
}

// ── Verify ───────────────────────────────────────────────────────────────

/// The submission payload: a base64-encoded JSON ticket plus the hex proof
/// the wallet produced over its digest.
#[derive(Deserialize)]
pub struct VerifyRequest {
    pub data: String,
    pub signature: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub address: String,
    pub path: EvaluationPath,
    pub assigned_role_ids: Vec<String>,
    pub outcomes: Vec<RuleOutcome>,
}

impl From<VerifyOutcome> for VerifyResponse {
    fn from(outcome: VerifyOutcome) -> Self {
        Self {
            address: outcome.address.as_str().to_string(),
            path: outcome.path,
            assigned_role_ids: outcome
                .assigned_roles()
                .iter()
                .map(|r| r.as_str().to_string())
                .collect(),
            outcomes: outcome.outcomes,
        }
    }
}

// ── Health ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub verified: u64,
    pub rejected: u64,
}

/// Decode the base64 ticket blob into a typed ticket.
pub fn decode_ticket(data: &str) -> Result<VerificationTicket, RpcError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|_| RpcError::InvalidRequest("ticket is not valid base64".to_string()))?;
    serde_json::from_slice(&raw)
        .map_err(|e| RpcError::InvalidRequest(format!("ticket does not parse: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket_json() -> String {
        serde_json::json!({
            "subjectId": "u1",
            "subjectTag": "holder#0001",
            "avatarUrl": "",
            "serverId": "s1",
            "serverName": "Ape Club",
            "serverIconUrl": "",
            "nonce": "aabb",
            "expiryUnixSeconds": 1_700_000_000u64,
            "claimedAddress": "gate_abc"
        })
        .to_string()
    }

    #[test]
    fn decode_ticket_roundtrip() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(ticket_json());
        let ticket = decode_ticket(&encoded).unwrap();
        assert_eq!(ticket.subject_id.as_str(), "u1");
        assert_eq!(ticket.nonce, "aabb");
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let err = decode_ticket("!!! not base64 !!!").unwrap_err();
        assert!(matches!(err, RpcError::InvalidRequest(_)));
    }

    #[test]
    fn decode_rejects_non_ticket_json() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("{\"nope\": 1}");
        let err = decode_ticket(&encoded).unwrap_err();
        assert!(matches!(err, RpcError::InvalidRequest(_)));
    }

    #[test]
    fn challenge_request_accepts_missing_context() {
        let req: ChallengeRequest = serde_json::from_str(r#"{"subjectId": "u1"}"#).unwrap();
        assert!(req.message_id.is_none());
        assert!(req.channel_id.is_none());
    }
}
