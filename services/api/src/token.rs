//! Opaque token generation and fingerprinting
//!
//! Raw tokens carry 256 bits of entropy and are URL-safe so they can be
//! embedded in magic-link URLs and cookie values. Only the SHA-256
//! fingerprint of a token is ever stored, so a leaked database never
//! exposes a usable credential.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a fresh opaque token (32 random bytes, URL-safe base64)
pub fn generate() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the storage fingerprint of a raw token (lowercase SHA-256 hex)
pub fn fingerprint(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_url_safe() {
        let token = generate();
        // 32 bytes -> 43 base64 chars without padding
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_does_not_collide() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let raw = generate();
        assert_eq!(fingerprint(&raw), fingerprint(&raw));
    }

    #[test]
    fn test_fingerprint_known_value() {
        assert_eq!(
            fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_differs_per_input() {
        assert_ne!(fingerprint(&generate()), fingerprint(&generate()));
    }
}
