//! Body digests recorded next to each cached entry.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a response body.
pub fn body_digest(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}
