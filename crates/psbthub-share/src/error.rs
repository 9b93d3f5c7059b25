use chrono::{DateTime, Utc};
use thiserror::Error;

use psbthub_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum ExpiryError {
    #[error("Invalid expiry: {0}")]
    InvalidExpiry(String),

    #[error("Expiry must be at or after {min}")]
    TooSoon { min: DateTime<Utc> },

    #[error("Expiry must be at or before {max}")]
    TooLate { max: DateTime<Utc> },
}

impl ExpiryError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidExpiry(_) => "INVALID_EXPIRY",
            Self::TooSoon { .. } => "EXPIRY_TOO_SOON",
            Self::TooLate { .. } => "EXPIRY_TOO_LATE",
        }
    }
}

#[derive(Debug, Error)]
pub enum DeleteCapabilityError {
    #[error("Secure platform crypto unavailable: {0}")]
    PlatformCryptoUnavailable(String),

    #[error("Delete capability token has an invalid format")]
    InvalidDeleteCapability,

    #[error("Delete capability hash failed: {0}")]
    HashFailed(String),
}

impl DeleteCapabilityError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PlatformCryptoUnavailable(_) => "PLATFORM_CRYPTO_UNAVAILABLE",
            Self::InvalidDeleteCapability => "INVALID_DELETE_CAPABILITY",
            Self::HashFailed(_) => "HASH_FAILED",
        }
    }
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact input is empty")]
    EmptyInput,

    #[error("Artifact is neither base64 nor hex: {0}")]
    InvalidEncoding(String),

    #[error("Artifact is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("Artifact structure is invalid: {0}")]
    InvalidStructure(String),
}

impl ArtifactError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::InvalidEncoding(_) => "INVALID_ENCODING",
            Self::TooLarge { .. } => "TOO_LARGE",
            Self::InvalidStructure(_) => "INVALID_STRUCTURE",
        }
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Secure platform crypto unavailable: {0}")]
    PlatformCryptoUnavailable(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Payload does not carry a valid artifact: {0}")]
    InvalidArtifact(#[source] ArtifactError),

    #[error("Artifact byte length {0} is out of range")]
    ArtifactLengthOutOfRange(u64),
}

impl PayloadError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PlatformCryptoUnavailable(_) => "PLATFORM_CRYPTO_UNAVAILABLE",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::InvalidArtifact(_) | Self::ArtifactLengthOutOfRange(_) => "INVALID_ARTIFACT",
        }
    }
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Secure platform crypto unavailable: {0}")]
    PlatformCryptoUnavailable(String),
}

impl PasswordError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPassword(_) => "INVALID_PASSWORD",
            Self::PlatformCryptoUnavailable(_) => "PLATFORM_CRYPTO_UNAVAILABLE",
        }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Delete capability hash has an invalid format")]
    InvalidDeleteCapability,

    #[error("Share insert failed: {0}")]
    InsertFailed(String),

    #[error("Storage backend failed: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDeleteCapability => "INVALID_DELETE_CAPABILITY",
            Self::InsertFailed(_) => "INSERT_FAILED",
            Self::Storage(_) => "STORAGE_FAILED",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "INVALID_CONFIG"
    }
}

/// Top-level error for share creation, retrieval, and deletion.
///
/// Component errors pass through unchanged; [`ShareError::code`] reports the
/// code of the component that failed.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Expiry(#[from] ExpiryError),

    #[error(transparent)]
    DeleteCapability(#[from] DeleteCapabilityError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Share id has an invalid format")]
    InvalidShareId,

    #[error("Share was not found or has expired")]
    ShareNotFound,

    #[error("Share link has no decryption key in its fragment")]
    MissingFragmentKey,

    #[error("This share carries no delete capability")]
    DeleteCapabilityUnavailable,
}

impl ShareError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Crypto(e) => e.code(),
            Self::Expiry(e) => e.code(),
            Self::DeleteCapability(e) => e.code(),
            Self::Payload(e) => e.code(),
            Self::Artifact(e) => e.code(),
            Self::Password(e) => e.code(),
            Self::Repository(e) => e.code(),
            Self::Config(e) => e.code(),
            Self::InvalidShareId => "INVALID_SHARE_ID",
            Self::ShareNotFound => "SHARE_NOT_FOUND",
            Self::MissingFragmentKey => "MISSING_FRAGMENT_KEY",
            Self::DeleteCapabilityUnavailable => "DELETE_CAPABILITY_UNAVAILABLE",
        }
    }
}
