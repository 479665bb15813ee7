//! Cryptographic helpers shared by all verifiers.
//!
//! Keyed hashes are computed over raw bytes. Nothing here converts a body to
//! a string first, since that can change the bytes a signer actually signed.

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Compute HMAC-SHA256 and return the raw 32-byte tag.
///
/// # Panics
///
/// Never in practice: HMAC accepts keys of any size per RFC 2104, so
/// `new_from_slice` cannot fail.
#[must_use]
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    // INVARIANT: HMAC-SHA256 accepts keys of any size per RFC 2104.
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts any key size");
    mac.update(message);

    let mut tag = [0u8; 32];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    tag
}

/// Compute HMAC-SHA256 over several message parts, hex-encoded.
///
/// The parts are fed to the MAC in order, equivalent to hashing their
/// concatenation without allocating it.
///
/// # Panics
///
/// Never in practice; see [`hmac_sha256`].
#[must_use]
pub fn hmac_sha256_hex_parts(key: &[u8], parts: &[&[u8]]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts any key size");
    for part in parts {
        mac.update(part);
    }
    hex::encode(mac.finalize().into_bytes())
}

/// Compute HMAC-SHA256 and return the lowercase hex encoding (64 chars).
#[must_use]
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    hex::encode(hmac_sha256(key, message))
}

/// Compute HMAC-SHA512 and return the lowercase hex encoding (128 chars).
///
/// # Panics
///
/// Never in practice: HMAC accepts keys of any size per RFC 2104.
#[must_use]
pub fn hmac_sha512_hex(key: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC-SHA512 accepts any key size");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time byte comparison.
///
/// Lengths are compared first and a mismatch returns early; the length of a
/// digest is public. Equal-length inputs are compared without data-dependent
/// branching.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Normalise a caller-supplied hex signature: surrounding whitespace removed,
/// ASCII lowercased. Computed digests are always lowercase.
#[must_use]
pub fn normalize_hex(signature: &str) -> String {
    signature.trim().to_ascii_lowercase()
}
