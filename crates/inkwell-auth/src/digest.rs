//! SHA-256 and HMAC-SHA256 helpers used by the signer

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Length of a raw SHA-256 / HMAC-SHA256 digest in bytes
pub const DIGEST_LEN: usize = 32;

/// Hex digest of zero bytes, sent as the payload hash of an empty body
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Calculate SHA256 and return lowercase hex (always 64 characters)
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Calculate HMAC-SHA256 of a UTF-8 message, returning the raw digest
#[must_use]
pub fn hmac_sha256(key: &[u8], message: &str) -> [u8; DIGEST_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}
