//! Deletion capability tokens.
//!
//! The token travels inside the encrypted payload; storage only ever sees
//! its SHA-256 hash.

use psbthub_crypto::{base64url_encode, random_array, SecureRandom};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::DeleteCapabilityError;

const TOKEN_BYTES: usize = 32;
pub const TOKEN_LENGTH: usize = 43;
pub const HASH_LENGTH: usize = 64;

/// A fresh token and the hash that authorizes deletion with it.
#[derive(Clone, PartialEq, Eq)]
pub struct DeleteCapability {
    pub token: String,
    pub hash: String,
}

impl DeleteCapability {
    pub fn generate(rng: &dyn SecureRandom) -> Result<Self, DeleteCapabilityError> {
        let token = generate_token(rng)?;
        let hash = hash_token(&token)?;
        Ok(Self { token, hash })
    }
}

impl std::fmt::Debug for DeleteCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteCapability").finish_non_exhaustive()
    }
}

/// 32 random bytes as unpadded base64url.
pub fn generate_token(rng: &dyn SecureRandom) -> Result<String, DeleteCapabilityError> {
    let mut bytes = random_array::<TOKEN_BYTES>(rng)
        .map_err(|e| DeleteCapabilityError::PlatformCryptoUnavailable(e.to_string()))?;
    let token = base64url_encode(&bytes);
    bytes.zeroize();
    Ok(token)
}

pub fn normalize_token(raw: &str) -> &str {
    raw.trim()
}

pub fn normalize_hash(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Exactly 43 base64url characters after trimming.
pub fn is_valid_token(token: &str) -> bool {
    let token = normalize_token(token);
    token.len() == TOKEN_LENGTH
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Exactly 64 lowercase hex characters after trimming and lowercasing.
pub fn is_valid_hash(hash: &str) -> bool {
    let hash = normalize_hash(hash);
    hash.len() == HASH_LENGTH && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Lowercase hex SHA-256 of the trimmed token.
pub fn hash_token(token: &str) -> Result<String, DeleteCapabilityError> {
    let token = normalize_token(token);
    if !is_valid_token(token) {
        return Err(DeleteCapabilityError::InvalidDeleteCapability);
    }
    Ok(hex::encode(Sha256::digest(token.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingRandom, FixedRandom};
    use psbthub_crypto::OsRandom;

    #[test]
    fn generated_token_shape() {
        let token = generate_token(&OsRandom).unwrap();
        assert_eq!(token.len(), 43);
        assert!(is_valid_token(&token));
        assert_ne!(token, generate_token(&OsRandom).unwrap());
    }

    #[test]
    fn hash_is_lowercase_hex_and_deterministic() {
        let token = generate_token(&OsRandom).unwrap();
        let a = hash_token(&token).unwrap();
        let b = hash_token(&format!("  {token} ")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(is_valid_hash(&a));
        assert_eq!(a, a.to_lowercase());
    }

    #[test]
    fn hash_known_answer() {
        // 32 zero bytes as base64url
        let token = generate_token(&FixedRandom(0)).unwrap();
        assert_eq!(token, "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        assert_eq!(
            hash_token(&token).unwrap(),
            "0f007385b6f9d4b7eeb2748605afe1a984a0a3bfa3f014d09e2a784ce9e5cd1a"
        );
    }

    #[test]
    fn bad_token_rejected() {
        let too_long = "A".repeat(44);
        let plus = format!("{}+", "A".repeat(42));
        for bad in ["bad token", "", "short", too_long.as_str(), plus.as_str()] {
            let err = hash_token(bad).unwrap_err();
            assert_eq!(err.code(), "INVALID_DELETE_CAPABILITY");
        }
    }

    #[test]
    fn hash_validation_normalizes() {
        let hash = "A".repeat(64);
        assert!(is_valid_hash(&format!(" {hash} ")));
        assert!(!is_valid_hash(&"g".repeat(64)));
        assert!(!is_valid_hash(&"a".repeat(63)));
        assert_eq!(normalize_hash(" ABC "), "abc");
    }

    #[test]
    fn generate_pair() {
        let cap = DeleteCapability::generate(&OsRandom).unwrap();
        assert_eq!(hash_token(&cap.token).unwrap(), cap.hash);
        assert_eq!(format!("{cap:?}"), "DeleteCapability { .. }");
    }

    #[test]
    fn random_failure_reported() {
        let err = generate_token(&FailingRandom).unwrap_err();
        assert_eq!(err.code(), "PLATFORM_CRYPTO_UNAVAILABLE");
    }
}
