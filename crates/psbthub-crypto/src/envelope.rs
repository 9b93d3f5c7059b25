//! Versioned AES-256-GCM envelope and its JSON wire format.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base64url::{base64url_decode, base64url_encode, is_base64url};
use crate::error::CryptoError;
use crate::kdf::PasswordKeyDerivation;
use crate::keys::ShareKey;
use crate::provider::CryptoProvider;
use crate::random::random_array;
use crate::types::{AES_GCM_IV_LENGTH, ENVELOPE_ALGORITHM, ENVELOPE_VERSION};

/// How the key that sealed an envelope is recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyProtection {
    /// Random key carried out-of-band in the share URL fragment.
    Fragment,
    /// Key derived from a password with the stored parameters.
    Password(PasswordKeyDerivation),
}

/// An encrypted share payload.
///
/// Only produced by [`encrypt`] or [`EncryptionEnvelope::parse`], so every
/// value in circulation has a valid shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionEnvelope {
    iv: String,
    ciphertext: String,
    protection: KeyProtection,
}

/// JSON shape on the wire. `keyDerivation` is omitted for fragment shares.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct WireEnvelope {
    version: u32,
    algorithm: String,
    iv: String,
    ciphertext: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_derivation: Option<PasswordKeyDerivation>,
}

impl EncryptionEnvelope {
    pub fn version(&self) -> u8 {
        ENVELOPE_VERSION
    }

    pub fn algorithm(&self) -> &'static str {
        ENVELOPE_ALGORITHM
    }

    /// base64url IV.
    pub fn iv(&self) -> &str {
        &self.iv
    }

    /// base64url ciphertext with the GCM tag appended.
    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    pub fn protection(&self) -> &KeyProtection {
        &self.protection
    }

    pub fn is_password_protected(&self) -> bool {
        matches!(self.protection, KeyProtection::Password(_))
    }

    pub fn key_derivation(&self) -> Option<&PasswordKeyDerivation> {
        match &self.protection {
            KeyProtection::Password(params) => Some(params),
            KeyProtection::Fragment => None,
        }
    }

    /// Canonical JSON text for storage.
    pub fn serialize(&self) -> String {
        let wire = WireEnvelope {
            version: u32::from(ENVELOPE_VERSION),
            algorithm: ENVELOPE_ALGORITHM.to_string(),
            iv: self.iv.clone(),
            ciphertext: self.ciphertext.clone(),
            key_derivation: self.key_derivation().cloned(),
        };
        // A struct of strings and integers cannot fail to serialize.
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// Parse and validate stored JSON text.
    pub fn parse(text: &str) -> Result<Self, CryptoError> {
        let wire: WireEnvelope = serde_json::from_str(text)
            .map_err(|e| CryptoError::InvalidEnvelope(format!("malformed JSON: {e}")))?;

        if wire.version != u32::from(ENVELOPE_VERSION) {
            return Err(CryptoError::InvalidEnvelope(format!(
                "unsupported version {}",
                wire.version
            )));
        }
        if wire.algorithm != ENVELOPE_ALGORITHM {
            return Err(CryptoError::InvalidEnvelope(format!(
                "unsupported algorithm \"{}\"",
                wire.algorithm
            )));
        }

        let protection = match wire.key_derivation {
            Some(params) => {
                params
                    .validate()
                    .map_err(|e| CryptoError::InvalidEnvelope(e.to_string()))?;
                KeyProtection::Password(params)
            }
            None => KeyProtection::Fragment,
        };

        let envelope = Self {
            iv: wire.iv,
            ciphertext: wire.ciphertext,
            protection,
        };
        envelope.decoded_parts()?;
        Ok(envelope)
    }

    /// Decode IV and ciphertext, enforcing charset and IV length.
    fn decoded_parts(&self) -> Result<([u8; AES_GCM_IV_LENGTH], Vec<u8>), CryptoError> {
        if !is_base64url(&self.iv) || !is_base64url(&self.ciphertext) {
            return Err(CryptoError::InvalidEnvelope(
                "iv and ciphertext must be base64url".into(),
            ));
        }
        let iv_bytes = base64url_decode(&self.iv)
            .map_err(|_| CryptoError::InvalidEnvelope("iv could not be decoded".into()))?;
        let iv: [u8; AES_GCM_IV_LENGTH] = iv_bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidEnvelope(format!(
                "AES-GCM IV must be exactly {} bytes",
                AES_GCM_IV_LENGTH
            ))
        })?;
        let ciphertext = base64url_decode(&self.ciphertext)
            .map_err(|_| CryptoError::InvalidEnvelope("ciphertext could not be decoded".into()))?;
        Ok((iv, ciphertext))
    }
}

/// Encrypt `plaintext` under `key` with a fresh random IV.
///
/// `key_derivation` is attached verbatim for password-protected shares.
pub async fn encrypt(
    provider: &CryptoProvider,
    plaintext: &[u8],
    key: &ShareKey,
    key_derivation: Option<&PasswordKeyDerivation>,
) -> Result<EncryptionEnvelope, CryptoError> {
    if let Some(params) = key_derivation {
        params.validate()?;
    }

    let iv = random_array::<AES_GCM_IV_LENGTH>(provider.rng.as_ref())?;

    let sealed = provider
        .aead
        .seal(key.as_bytes(), &iv, plaintext)
        .await
        .map_err(|e| match e {
            CryptoError::EncryptionFailed(_) => e,
            other => CryptoError::EncryptionFailed(other.to_string()),
        })?;

    let protection = match key_derivation {
        Some(params) => KeyProtection::Password(params.clone()),
        None => KeyProtection::Fragment,
    };

    debug!(
        plaintext_len = plaintext.len(),
        ciphertext_len = sealed.len(),
        password = matches!(protection, KeyProtection::Password(_)),
        "envelope sealed"
    );

    Ok(EncryptionEnvelope {
        iv: base64url_encode(&iv),
        ciphertext: base64url_encode(&sealed),
        protection,
    })
}

/// Encrypt with a caller-supplied raw key, checking its length first.
pub async fn encrypt_with_key_bytes(
    provider: &CryptoProvider,
    plaintext: &[u8],
    key: &[u8],
    key_derivation: Option<&PasswordKeyDerivation>,
) -> Result<EncryptionEnvelope, CryptoError> {
    if let Some(params) = key_derivation {
        params.validate()?;
    }
    let key = ShareKey::from_slice(key)?;
    encrypt(provider, plaintext, &key, key_derivation).await
}

/// Authenticate and decrypt an envelope.
///
/// Every authentication or provider failure surfaces as
/// [`CryptoError::DecryptionFailed`].
pub async fn decrypt(
    provider: &CryptoProvider,
    envelope: &EncryptionEnvelope,
    key: &ShareKey,
) -> Result<Vec<u8>, CryptoError> {
    let (iv, ciphertext) = envelope.decoded_parts()?;

    let plaintext = provider
        .aead
        .open(key.as_bytes(), &iv, &ciphertext)
        .await
        .map_err(|_| CryptoError::DecryptionFailed)?;

    debug!(
        ciphertext_len = ciphertext.len(),
        plaintext_len = plaintext.len(),
        password = envelope.is_password_protected(),
        "envelope opened"
    );
    Ok(plaintext)
}

/// Decrypt with a caller-supplied raw key, checking its length first.
pub async fn decrypt_with_key_bytes(
    provider: &CryptoProvider,
    envelope: &EncryptionEnvelope,
    key: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    envelope.decoded_parts()?;
    let key = ShareKey::from_slice(key)?;
    decrypt(provider, envelope, &key).await
}
