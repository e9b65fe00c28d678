//! The signed verification ticket (wire payload).

use crate::address::WalletAddress;
use crate::ids::{RoleId, ServerId, SubjectId};
use serde::{Deserialize, Serialize};

/// The structured payload a holder's wallet signs.
///
/// Immutable once signed and single-use (bound to the nonce). The legacy
/// single-role fields remain in the signed schema for backward compatibility
/// with old clients even though new rule evaluation no longer requires them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationTicket {
    pub subject_id: SubjectId,
    pub subject_tag: String,
    pub avatar_url: String,
    pub server_id: ServerId,
    pub server_name: String,
    pub server_icon_url: String,
    #[serde(default)]
    pub legacy_role_id: Option<RoleId>,
    #[serde(default)]
    pub legacy_role_name: Option<String>,
    /// The single-use challenge this ticket is bound to.
    pub nonce: String,
    /// Unix seconds after which the ticket is no longer acceptable.
    pub expiry_unix_seconds: u64,
    /// The wallet address the holder claims to control.
    pub claimed_address: WalletAddress,
}
