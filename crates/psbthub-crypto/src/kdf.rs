//! PBKDF2-SHA256 password key derivation.
//!
//! Password-derived keys land in the same 32-byte key space as random
//! fragment keys, so the envelope never needs to know which path produced a
//! key. Only the derivation parameters travel with the ciphertext.

use async_trait::async_trait;
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::base64url::{base64url_decode, base64url_encode, is_base64url};
use crate::error::CryptoError;
use crate::keys::ShareKey;
use crate::random::{random_array, SecureRandom};
use crate::types::{
    AES_KEY_LENGTH, MAX_PASSWORD_DERIVATION_ITERATIONS, MIN_PASSWORD_DERIVATION_ITERATIONS,
    PASSWORD_DERIVATION_TYPE, PASSWORD_SALT_LENGTH,
};

/// PBKDF2 parameters stored alongside a password-protected envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordKeyDerivation {
    /// Always `"PBKDF2-SHA256"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// base64url, 16 bytes decoded.
    pub salt: String,
    pub iterations: u32,
}

impl PasswordKeyDerivation {
    /// Check tag, salt charset, and iteration range.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.kind != PASSWORD_DERIVATION_TYPE {
            return Err(CryptoError::InvalidKeyDerivation(format!(
                "unsupported type \"{}\"",
                self.kind
            )));
        }
        if !is_base64url(&self.salt) {
            return Err(CryptoError::InvalidKeyDerivation(
                "salt is not base64url".into(),
            ));
        }
        if !is_valid_iterations(self.iterations) {
            return Err(iterations_error());
        }
        Ok(())
    }

    /// Decode the salt, requiring exactly 16 bytes.
    pub fn salt_bytes(&self) -> Result<[u8; PASSWORD_SALT_LENGTH], CryptoError> {
        let bytes = base64url_decode(&self.salt).map_err(|_| {
            CryptoError::InvalidKeyDerivation("salt could not be decoded".into())
        })?;
        bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidKeyDerivation(format!(
                "salt must be exactly {} bytes, got {}",
                PASSWORD_SALT_LENGTH,
                bytes.len()
            ))
        })
    }
}

fn is_valid_iterations(iterations: u32) -> bool {
    (MIN_PASSWORD_DERIVATION_ITERATIONS..=MAX_PASSWORD_DERIVATION_ITERATIONS).contains(&iterations)
}

fn iterations_error() -> CryptoError {
    CryptoError::InvalidKeyDerivation(format!(
        "iterations must be between {} and {}",
        MIN_PASSWORD_DERIVATION_ITERATIONS, MAX_PASSWORD_DERIVATION_ITERATIONS
    ))
}

/// Password-based key derivation primitive.
///
/// Async because platform providers may run off-thread or on hardware.
#[async_trait]
pub trait KeyDerivationFunction: Send + Sync {
    /// PBKDF2-HMAC-SHA256 of `password` into `output_len` bytes.
    async fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        output_len: usize,
    ) -> Result<Vec<u8>, CryptoError>;
}

/// In-process PBKDF2 using the RustCrypto `pbkdf2` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pbkdf2Sha256;

#[async_trait]
impl KeyDerivationFunction for Pbkdf2Sha256 {
    async fn pbkdf2_sha256(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        output_len: usize,
    ) -> Result<Vec<u8>, CryptoError> {
        if iterations == 0 {
            return Err(CryptoError::KeyDerivationFailed(
                "iteration count must be non-zero".into(),
            ));
        }
        let mut out = vec![0u8; output_len];
        pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
        Ok(out)
    }
}

/// Create fresh PBKDF2 parameters (random 16-byte salt) for a new share.
pub fn create_password_derivation_params(
    rng: &dyn SecureRandom,
    iterations: u32,
) -> Result<PasswordKeyDerivation, CryptoError> {
    if !is_valid_iterations(iterations) {
        return Err(iterations_error());
    }
    let salt = random_array::<PASSWORD_SALT_LENGTH>(rng)?;
    Ok(PasswordKeyDerivation {
        kind: PASSWORD_DERIVATION_TYPE.to_string(),
        salt: base64url_encode(&salt),
        iterations,
    })
}

/// Derive the 32-byte share key from a password and stored parameters.
///
/// The password is trimmed before use; an empty result is rejected.
pub async fn derive_key_from_password(
    kdf: &dyn KeyDerivationFunction,
    password: &str,
    params: &PasswordKeyDerivation,
) -> Result<ShareKey, CryptoError> {
    params.validate()?;

    let normalized = password.trim();
    if normalized.is_empty() {
        return Err(CryptoError::InvalidPassword);
    }

    let salt = params.salt_bytes()?;

    let mut derived = kdf
        .pbkdf2_sha256(
            normalized.as_bytes(),
            &salt,
            params.iterations,
            AES_KEY_LENGTH,
        )
        .await
        .map_err(|e| match e {
            CryptoError::KeyDerivationFailed(_) => e,
            other => CryptoError::KeyDerivationFailed(other.to_string()),
        })?;

    let key = ShareKey::from_slice(&derived).map_err(|_| {
        CryptoError::KeyDerivationFailed(format!(
            "derived key must be exactly {} bytes, got {}",
            AES_KEY_LENGTH,
            derived.len()
        ))
    });
    derived.zeroize();
    key
}
