use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of a byte slice, returning a lowercase hex string.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Split a hex digest into nested directory components (`ab/cd/ef/rest`),
/// keeping any single cache directory small.
pub fn sharded_path(digest: &str) -> Vec<&str> {
    if digest.len() <= 6 {
        return vec![digest];
    }
    vec![&digest[0..2], &digest[2..4], &digest[4..6], &digest[6..]]
}
