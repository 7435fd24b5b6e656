use sha2::{Digest, Sha256};

/// SHA-256 of the exact bytes received, lowercase hex.
///
/// Hashes the raw buffer, not decoded text, so it matches what a client
/// computed before uploading.
pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
