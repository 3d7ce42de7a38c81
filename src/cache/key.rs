//! Cache key generation using SHA-256 hashes

use sha2::{Digest, Sha256};

/// Generate a deterministic cache key from an endpoint path and query parameters.
///
/// The key is a SHA-256 hash of the path and the parameters sorted by name,
/// so the same request fingerprint is produced regardless of parameter order.
pub fn cache_key(path: &str, params: &[(&str, &str)]) -> String {
    let mut hasher = Sha256::new();

    hasher.update(path.as_bytes());
    hasher.update(b"?");

    let mut sorted_params: Vec<_> = params.iter().collect();
    sorted_params.sort();

    for (k, v) in sorted_params {
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
        hasher.update(b"&");
    }

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_deterministic() {
        let key1 = cache_key("/api/question/list", &[("subject", "math"), ("page", "1")]);
        let key2 = cache_key("/api/question/list", &[("page", "1"), ("subject", "math")]);

        assert_eq!(key1, key2);
    }

    #[test]
    fn test_cache_key_different_paths() {
        let key1 = cache_key("/api/image/result/t1", &[]);
        let key2 = cache_key("/api/question/result/t1", &[]);

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_cache_key_different_values() {
        let key1 = cache_key("/api/question/list", &[("page", "1")]);
        let key2 = cache_key("/api/question/list", &[("page", "2")]);

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_cache_key_is_hex_sha256() {
        let key = cache_key("/api/auth/me", &[]);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
