//! Signature-based identity proof over verification tickets.

use tokengate_crypto::{recover_signer, SigningDomain};
use tokengate_types::{EngineParams, Timestamp, VerificationTicket, WalletAddress};

use crate::error::VerifyError;

/// Verifies a holder's wallet proof against a signed ticket.
///
/// Checks run in a fixed order: ticket expiry first (strict `now < expiry`,
/// equality counts as expired), then signature recovery, then an exact
/// string comparison of the recovered address against the claimed one.
/// Addresses are canonical lowercase with an embedded checksum, so exact
/// comparison is sound. The nonce is not this component's business.
pub struct SignatureVerifier {
    domain: SigningDomain,
}

impl SignatureVerifier {
    pub fn new(domain: SigningDomain) -> Self {
        Self { domain }
    }

    pub fn from_params(params: &EngineParams) -> Self {
        Self::new(SigningDomain::new(
            params.domain_name.clone(),
            params.domain_version.clone(),
            params.chain_id,
        ))
    }

    pub fn domain(&self) -> &SigningDomain {
        &self.domain
    }

    /// Verify the proof and return the recovered signer address.
    pub fn verify(
        &self,
        ticket: &VerificationTicket,
        proof_hex: &str,
        now: Timestamp,
    ) -> Result<WalletAddress, VerifyError> {
        if now.as_secs() >= ticket.expiry_unix_seconds {
            return Err(VerifyError::VerificationExpired {
                expiry_unix_seconds: ticket.expiry_unix_seconds,
            });
        }

        let raw = hex::decode(proof_hex).map_err(|_| VerifyError::SignatureMismatch)?;
        let recovered =
            recover_signer(&self.domain, ticket, &raw).ok_or(VerifyError::SignatureMismatch)?;

        if recovered.as_str() != ticket.claimed_address.as_str() {
            return Err(VerifyError::SignatureMismatch);
        }

        Ok(recovered)
    }
}
