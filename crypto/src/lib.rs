//! Cryptographic primitives for TokenGate.
//!
//! - **Ed25519** for wallet signatures over verification tickets
//! - **Blake2b-256** for digests and address checksums
//! - Address derivation with `gate_` prefix and base32 encoding
//! - The domain-separated ticket digest (the "typed message" a wallet signs)

pub mod address;
pub mod hash;
pub mod keys;
pub mod sign;
pub mod ticket_digest;

pub use address::{decode_address, derive_address, validate_address};
pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_seed, public_from_private, KeyPair, PrivateKey, PublicKey, Signature};
pub use sign::{sign_message, verify_signature};
pub use ticket_digest::{prove_ticket, recover_signer, ticket_digest, SigningDomain, PROOF_LEN};
