//! Wallet address derivation from public keys.
//!
//! Address format: `gate_` + base32(public_key, 52 chars) + base32(checksum, 8 chars)
//!
//! Checksum: first 5 bytes of Blake2b-256(public_key).
//! Base32 alphabet: `13456789abcdefghijkmnopqrstuwxyz` (avoids ambiguous chars).
//! Total address length: 5 (prefix) + 52 + 8 = 65 characters. The alphabet is
//! lowercase-only, so a well-formed address has exactly one spelling; this is
//! what makes the verifier's exact string comparison sound.

use tokengate_types::WalletAddress;

use crate::keys::PublicKey;

/// Base32 alphabet (32 chars, avoids visually ambiguous 0/O, 2/Z, l/I, v).
const BASE32_ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

/// Reverse lookup table: ASCII byte -> 5-bit value (0xFF = invalid).
const BASE32_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE32_ALPHABET;
    let mut i = 0;
    while i < 32 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Number of base32 characters for the public key (256 bits -> ceil(256/5) = 52).
const PUBKEY_CHARS: usize = 52;
/// Expected length of the encoded part (after `gate_`): 52 pubkey + 8 checksum.
const ENCODED_LEN: usize = 60;

fn encode_base32(bytes: &[u8]) -> String {
    let total_bits = bytes.len() * 8;
    let num_chars = total_bits.div_ceil(5);
    let mut result = String::with_capacity(num_chars);

    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u64;
        bits_in_buffer += 8;
        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let idx = ((buffer >> bits_in_buffer) & 0x1F) as usize;
            result.push(BASE32_ALPHABET[idx] as char);
        }
    }
    // Remaining bits (padded with zeros on the right).
    if bits_in_buffer > 0 {
        let idx = ((buffer << (5 - bits_in_buffer)) & 0x1F) as usize;
        result.push(BASE32_ALPHABET[idx] as char);
    }

    result
}

/// Decode a base32 string into a fixed-size byte array. Returns `None` on
/// invalid characters or wrong length. Zero-allocation.
fn decode_base32_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;
    let mut result = [0u8; N];
    let mut pos = 0;

    for c in s.bytes() {
        if c >= 128 {
            return None;
        }
        let val = BASE32_DECODE[c as usize];
        if val == 0xFF {
            return None;
        }
        buffer = (buffer << 5) | val as u64;
        bits_in_buffer += 5;
        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            if pos < N {
                result[pos] = (buffer >> bits_in_buffer) as u8;
                pos += 1;
            }
        }
    }

    if pos < N {
        return None;
    }
    Some(result)
}

/// Derive a `gate_`-prefixed wallet address from a public key.
pub fn derive_address(public_key: &PublicKey) -> WalletAddress {
    let pubkey_encoded = encode_base32(public_key.as_bytes());
    let hash = crate::blake2b_256(public_key.as_bytes());
    let checksum_encoded = encode_base32(&hash[..5]);
    let address = format!(
        "{}{}{}",
        WalletAddress::PREFIX,
        pubkey_encoded,
        checksum_encoded
    );
    WalletAddress::new(address)
}

/// Extract the public key bytes from a valid TokenGate address.
///
/// Returns `None` if the address is malformed or has an invalid checksum.
pub fn decode_address(address: &str) -> Option<[u8; 32]> {
    let encoded = address.strip_prefix(WalletAddress::PREFIX)?;
    if encoded.len() != ENCODED_LEN {
        return None;
    }

    let pubkey_bytes: [u8; 32] = decode_base32_fixed(&encoded[..PUBKEY_CHARS])?;
    let checksum_bytes: [u8; 5] = decode_base32_fixed(&encoded[PUBKEY_CHARS..])?;

    let expected_checksum = &crate::blake2b_256(&pubkey_bytes)[..5];
    if checksum_bytes != *expected_checksum {
        return None;
    }

    Some(pubkey_bytes)
}

/// Validate that an address string is well-formed and its checksum is correct.
pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_some()
}
