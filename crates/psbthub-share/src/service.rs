//! Upload and retrieval orchestration.
//!
//! Creating a share: validate artifact, resolve expiry, obtain a key, mint a
//! delete capability, encode and encrypt the payload, then store ciphertext
//! under a fresh id. Opening a share runs the same steps backwards.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use zeroize::Zeroize;

use psbthub_crypto::{
    build_fragment, create_password_derivation_params, decode_key_from_fragment, decrypt,
    derive_key_from_password, encode_key_for_fragment, encrypt, extract_fragment_key,
    generate_key_bytes, CryptoError, CryptoProvider, EncryptionEnvelope, PasswordKeyDerivation,
    ShareKey,
};

use crate::artifact::{ArtifactValidator, PsbtValidator};
use crate::config::ShareConfig;
use crate::delete_capability::{hash_token, DeleteCapability};
use crate::error::ShareError;
use crate::expiry;
use crate::password;
use crate::payload::{self, PayloadFormat};
use crate::repository::{CreateShareInput, ShareRepository};
use crate::share_id;

/// How the creator wants the share key protected.
#[derive(Clone, PartialEq, Eq)]
pub enum SecurityMode {
    /// Random key, delivered in the link's `#k=` fragment.
    LinkFragment,
    /// Key derived from this password; the link carries no key.
    Password(String),
}

impl std::fmt::Debug for SecurityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LinkFragment => f.write_str("LinkFragment"),
            Self::Password(_) => f.write_str("Password(..)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    LinkFragment,
    Password,
}

#[derive(Debug, Clone)]
pub struct CreatedShare {
    pub share_id: String,
    /// `{base}/p/{id}`, plus `#k=<key>` in fragment mode.
    pub share_url: String,
    pub access: AccessMode,
    /// Normalized password, echoed back in password mode.
    pub password: Option<String>,
    pub expires_at_iso: String,
    pub size_bytes: u64,
}

/// A stored share whose envelope parsed, not yet decrypted.
#[derive(Debug, Clone)]
pub struct FetchedShare {
    pub share_id: String,
    pub envelope: EncryptionEnvelope,
    pub expires_at: DateTime<Utc>,
    pub size_bytes: u64,
}

impl FetchedShare {
    pub fn requires_password(&self) -> bool {
        self.envelope.is_password_protected()
    }
}

#[derive(Debug, Clone)]
pub struct OpenedShare {
    pub share_id: String,
    /// Canonical padded standard base64.
    pub artifact_base64: String,
    pub artifact_bytes: usize,
    pub access: AccessMode,
    pub format: PayloadFormat,
    /// Present when the payload carried a delete token.
    pub delete_capability_hash: Option<String>,
}

impl OpenedShare {
    pub fn can_delete(&self) -> bool {
        self.delete_capability_hash.is_some()
    }
}

pub struct ShareService {
    repository: Arc<dyn ShareRepository>,
    validator: Arc<dyn ArtifactValidator>,
    provider: CryptoProvider,
    config: ShareConfig,
}

impl ShareService {
    pub fn new(
        repository: Arc<dyn ShareRepository>,
        validator: Arc<dyn ArtifactValidator>,
        provider: CryptoProvider,
        config: ShareConfig,
    ) -> Result<Self, ShareError> {
        config.validate()?;
        Ok(Self {
            repository,
            validator,
            provider,
            config,
        })
    }

    /// PSBT validation, system crypto, default configuration.
    pub fn with_defaults(repository: Arc<dyn ShareRepository>) -> Self {
        Self {
            repository,
            validator: Arc::new(PsbtValidator),
            provider: CryptoProvider::system(),
            config: ShareConfig::default(),
        }
    }

    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    fn share_path(&self, id: &str) -> String {
        format!("{}/p/{}", self.config.base_url(), id)
    }

    pub async fn create_share(
        &self,
        input_text: &str,
        expires_at: Option<DateTime<Utc>>,
        security: SecurityMode,
    ) -> Result<CreatedShare, ShareError> {
        let rng = self.provider.rng.as_ref();
        let max = self.config.max_artifact_bytes;

        let artifact = self.validator.validate_text(input_text, max)?;
        let resolved = expiry::resolve(expires_at, Utc::now())?;

        let (key, params, password) = match security {
            SecurityMode::LinkFragment => (generate_key_bytes(rng)?, None, None),
            SecurityMode::Password(raw) => {
                let password = password::validate(&raw)?;
                let params = create_password_derivation_params(rng, self.config.password_iterations)?;
                let key =
                    derive_key_from_password(self.provider.kdf.as_ref(), &password, &params).await?;
                (key, Some(params), Some(password))
            }
        };

        let capability = DeleteCapability::generate(rng)?;
        let mut encoded = payload::encode(rng, &artifact, Some(&capability.token))?;
        let sealed = encrypt(&self.provider, &encoded.bytes, &key, params.as_ref()).await;
        encoded.bytes.zeroize();
        let envelope = sealed?;

        let size_bytes = payload::obfuscate_size(rng, artifact.byte_length as u64, max as u64)?;
        let id = share_id::generate(rng)?;

        self.repository
            .insert_share(CreateShareInput {
                id: id.clone(),
                ciphertext_payload: envelope.serialize(),
                size_bytes,
                version: self.config.payload_version,
                expires_at: resolved.expires_at,
                delete_token_hash: capability.hash.clone(),
            })
            .await
            .map_err(|e| {
                warn!(code = e.code(), "share insert failed");
                e
            })?;

        let (share_url, access) = match password {
            None => (
                format!(
                    "{}#{}",
                    self.share_path(&id),
                    build_fragment(&encode_key_for_fragment(key.as_ref())?)
                ),
                AccessMode::LinkFragment,
            ),
            Some(_) => (self.share_path(&id), AccessMode::Password),
        };

        debug!(
            share_id = %id,
            access = ?access,
            decoy_length = encoded.decoy_length,
            size_bytes,
            "share created"
        );

        Ok(CreatedShare {
            share_id: id,
            share_url,
            access,
            password,
            expires_at_iso: resolved.expires_at_iso,
            size_bytes,
        })
    }

    pub async fn fetch_share(&self, id: &str) -> Result<FetchedShare, ShareError> {
        let id = id.trim();
        if !share_id::is_valid(id) {
            return Err(ShareError::InvalidShareId);
        }

        let record = self
            .repository
            .get_share(id)
            .await
            .map_err(|e| {
                warn!(code = e.code(), "share lookup failed");
                e
            })?
            .ok_or(ShareError::ShareNotFound)?;

        let envelope = EncryptionEnvelope::parse(&record.ciphertext_payload)?;
        Ok(FetchedShare {
            share_id: record.id,
            envelope,
            expires_at: record.expires_at,
            size_bytes: record.size_bytes,
        })
    }

    /// Open with the key from a share URL fragment (`#k=...`).
    pub async fn open_with_fragment(
        &self,
        fetched: &FetchedShare,
        url_fragment: &str,
    ) -> Result<OpenedShare, ShareError> {
        let encoded_key = extract_fragment_key(url_fragment).ok_or(ShareError::MissingFragmentKey)?;
        let key = decode_key_from_fragment(&encoded_key)?;
        self.open(fetched, &key, AccessMode::LinkFragment).await
    }

    pub async fn open_with_password(
        &self,
        fetched: &FetchedShare,
        password: &str,
    ) -> Result<OpenedShare, ShareError> {
        let password = password::validate(password)?;
        let params: &PasswordKeyDerivation = fetched.envelope.key_derivation().ok_or_else(|| {
            CryptoError::InvalidEnvelope("share is not password-protected".into())
        })?;
        let key = derive_key_from_password(self.provider.kdf.as_ref(), &password, params).await?;
        self.open(fetched, &key, AccessMode::Password).await
    }

    async fn open(
        &self,
        fetched: &FetchedShare,
        key: &ShareKey,
        access: AccessMode,
    ) -> Result<OpenedShare, ShareError> {
        let mut plaintext = decrypt(&self.provider, &fetched.envelope, key).await?;
        let decoded = payload::decode(
            self.validator.as_ref(),
            &plaintext,
            self.config.max_artifact_bytes,
        );
        plaintext.zeroize();
        let decoded = decoded?;

        let delete_capability_hash = decoded.delete_token().map(hash_token).transpose()?;

        debug!(
            share_id = %fetched.share_id,
            access = ?access,
            format = decoded.format.as_str(),
            "share opened"
        );

        Ok(OpenedShare {
            share_id: fetched.share_id.clone(),
            artifact_base64: decoded.artifact.base64,
            artifact_bytes: decoded.artifact.byte_length,
            access,
            format: decoded.format,
            delete_capability_hash,
        })
    }

    /// Delete an opened share using the capability recovered from its payload.
    pub async fn delete_share(&self, opened: &OpenedShare) -> Result<bool, ShareError> {
        let hash = opened
            .delete_capability_hash
            .as_deref()
            .ok_or(ShareError::DeleteCapabilityUnavailable)?;

        let deleted = self
            .repository
            .delete_share(&opened.share_id, hash)
            .await
            .map_err(|e| {
                warn!(code = e.code(), "share delete failed");
                e
            })?;
        debug!(share_id = %opened.share_id, deleted, "share delete requested");
        Ok(deleted)
    }
}
