//! AES-256-GCM as an injected AEAD capability.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use async_trait::async_trait;

use crate::error::CryptoError;
use crate::types::{AES_GCM_IV_LENGTH, AES_KEY_LENGTH};

/// Authenticated encryption primitive used by the envelope.
///
/// Implementations must return [`CryptoError::DecryptionFailed`] for every
/// `open` failure, whatever the cause.
#[async_trait]
pub trait AeadCipher: Send + Sync {
    /// Encrypt `plaintext`; returns ciphertext with the 16-byte tag appended.
    async fn seal(
        &self,
        key: &[u8; AES_KEY_LENGTH],
        iv: &[u8; AES_GCM_IV_LENGTH],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Verify the tag and decrypt `ciphertext` (tag appended).
    async fn open(
        &self,
        key: &[u8; AES_KEY_LENGTH],
        iv: &[u8; AES_GCM_IV_LENGTH],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;
}

/// RustCrypto `aes-gcm` backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256GcmCipher;

#[async_trait]
impl AeadCipher for Aes256GcmCipher {
    async fn seal(
        &self,
        key: &[u8; AES_KEY_LENGTH],
        iv: &[u8; AES_GCM_IV_LENGTH],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        cipher
            .encrypt(Nonce::from_slice(iv), plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }

    async fn open(
        &self,
        key: &[u8; AES_KEY_LENGTH],
        iv: &[u8; AES_GCM_IV_LENGTH],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::DecryptionFailed)?;
        cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}
