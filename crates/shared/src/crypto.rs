//! Hashing and random token helpers.
//!
//! Secrets that must be looked up later (refresh token ids, password reset
//! tokens) are stored only as SHA-256 hex digests.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes in an opaque token.
pub const TOKEN_BYTES: usize = 32;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates an opaque token of [`TOKEN_BYTES`] random bytes, hex encoded.
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
