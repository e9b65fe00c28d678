//! The domain-separated structured message a wallet signs.
//!
//! A verification ticket is never signed raw: the wallet signs a Blake2b-256
//! digest over a fixed field schema under a domain separator, so a signature
//! produced for one deployment (or one schema version) can never be replayed
//! against another. The legacy single-role fields are always part of the
//! signed schema, even when empty, so signatures from old clients that still
//! populate them keep verifying.
//!
//! Wire proof format: `public_key(32) || signature(64)`, hex-encoded.
//! "Recovering" the signer means verifying the embedded public key's
//! signature over the digest and deriving the wallet address from that key.

use tokengate_types::{VerificationTicket, WalletAddress};

use crate::address::derive_address;
use crate::hash::blake2b_256_multi;
use crate::keys::{KeyPair, PublicKey, Signature};
use crate::sign::{sign_message, verify_signature};

/// Length of the raw wire proof: 32-byte public key + 64-byte signature.
pub const PROOF_LEN: usize = 96;

/// Schema tag mixed into every domain separator.
const SCHEMA_TAG: &[u8] = b"tokengate-verification-ticket";

/// The signing domain: fixed per deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
}

impl SigningDomain {
    pub fn new(name: impl Into<String>, version: impl Into<String>, chain_id: u64) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
        }
    }

    /// The 32-byte separator hashed into every ticket digest.
    fn separator(&self) -> [u8; 32] {
        blake2b_256_multi(&[
            SCHEMA_TAG,
            &(self.name.len() as u32).to_le_bytes(),
            self.name.as_bytes(),
            &(self.version.len() as u32).to_le_bytes(),
            self.version.as_bytes(),
            &self.chain_id.to_le_bytes(),
        ])
    }
}

/// Append one length-prefixed field to the encoding buffer.
fn push_field(buf: &mut Vec<u8>, field: &[u8]) {
    buf.extend_from_slice(&(field.len() as u32).to_le_bytes());
    buf.extend_from_slice(field);
}

/// Compute the digest a wallet signs for this ticket under this domain.
///
/// The field order is the schema; changing it is a breaking change gated by
/// the domain version. Legacy role fields encode as empty strings when
/// absent, which keeps old and new clients byte-compatible.
pub fn ticket_digest(domain: &SigningDomain, ticket: &VerificationTicket) -> [u8; 32] {
    let mut encoded = Vec::with_capacity(256);
    push_field(&mut encoded, ticket.subject_id.as_str().as_bytes());
    push_field(&mut encoded, ticket.subject_tag.as_bytes());
    push_field(&mut encoded, ticket.avatar_url.as_bytes());
    push_field(&mut encoded, ticket.server_id.as_str().as_bytes());
    push_field(&mut encoded, ticket.server_name.as_bytes());
    push_field(&mut encoded, ticket.server_icon_url.as_bytes());
    push_field(
        &mut encoded,
        ticket
            .legacy_role_id
            .as_ref()
            .map(|r| r.as_str())
            .unwrap_or("")
            .as_bytes(),
    );
    push_field(
        &mut encoded,
        ticket.legacy_role_name.as_deref().unwrap_or("").as_bytes(),
    );
    push_field(&mut encoded, ticket.nonce.as_bytes());
    push_field(&mut encoded, &ticket.expiry_unix_seconds.to_le_bytes());
    push_field(&mut encoded, ticket.claimed_address.as_str().as_bytes());

    blake2b_256_multi(&[&domain.separator(), &encoded])
}

/// Produce a hex wire proof for a ticket: `pubkey || signature` over the
/// ticket digest. Used by client tooling and tests; the engine only verifies.
pub fn prove_ticket(domain: &SigningDomain, ticket: &VerificationTicket, keypair: &KeyPair) -> String {
    let digest = ticket_digest(domain, ticket);
    let sig = sign_message(&digest, &keypair.private);
    let mut raw = Vec::with_capacity(PROOF_LEN);
    raw.extend_from_slice(keypair.public.as_bytes());
    raw.extend_from_slice(&sig.0);
    hex::encode(raw)
}

/// Recover the signing wallet address from a raw proof.
///
/// Returns `None` when the proof is malformed or the signature does not
/// verify over this ticket's digest. The returned address is derived from
/// the embedded public key; whether it matches the ticket's claimed address
/// is the verifier's decision, not this function's.
pub fn recover_signer(
    domain: &SigningDomain,
    ticket: &VerificationTicket,
    proof: &[u8],
) -> Option<WalletAddress> {
    if proof.len() != PROOF_LEN {
        return None;
    }
    let mut pubkey_bytes = [0u8; 32];
    pubkey_bytes.copy_from_slice(&proof[..32]);
    let mut sig_bytes = [0u8; 64];
    sig_bytes.copy_from_slice(&proof[32..]);

    let public = PublicKey(pubkey_bytes);
    let digest = ticket_digest(domain, ticket);
    if !verify_signature(&digest, &Signature(sig_bytes), &public) {
        return None;
    }
    Some(derive_address(&public))
}
