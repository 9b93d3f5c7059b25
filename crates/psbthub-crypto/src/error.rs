use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Secure platform crypto unavailable: {0}")]
    PlatformCryptoUnavailable(String),

    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Password is required to derive a key")]
    InvalidPassword,

    #[error("Invalid fragment key: {0}")]
    InvalidFragmentKey(String),

    #[error("Invalid key derivation parameters: {0}")]
    InvalidKeyDerivation(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Deliberately carries no detail: wrong key, corrupted ciphertext and a
    /// tampered tag must be indistinguishable.
    #[error("Ciphertext could not be decrypted with the provided key")]
    DecryptionFailed,
}

impl CryptoError {
    /// Stable taxonomy code for mapping to user-facing messages.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PlatformCryptoUnavailable(_) => "PLATFORM_CRYPTO_UNAVAILABLE",
            Self::InvalidKeyLength { .. } => "INVALID_KEY_LENGTH",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::InvalidFragmentKey(_) => "INVALID_FRAGMENT_KEY",
            Self::InvalidKeyDerivation(_) => "INVALID_KEY_DERIVATION",
            Self::KeyDerivationFailed(_) => "KEY_DERIVATION_FAILED",
            Self::InvalidEnvelope(_) => "INVALID_ENVELOPE",
            Self::EncryptionFailed(_) => "ENCRYPTION_FAILED",
            Self::DecryptionFailed => "DECRYPTION_FAILED",
        }
    }
}
