//! Plaintext payload codec.
//!
//! Version 1 payloads are JSON carrying the artifact, a random-length decoy
//! to blur the ciphertext size, and an optional delete token. Shares written
//! before the JSON format held the raw artifact bytes and are still readable.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use psbthub_crypto::{random_in_range, SecureRandom};

use crate::artifact::{ArtifactValidator, ValidatedArtifact};
use crate::delete_capability;
use crate::error::PayloadError;

pub const PAYLOAD_VERSION: u64 = 1;

const DECOY_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
pub const DECOY_LENGTH_MIN: u32 = 4096;
pub const DECOY_LENGTH_MAX: u32 = 24576;
pub const MAX_ACCEPTED_DECOY_LENGTH: usize = 128 * 1024;

pub const SIZE_JITTER_MIN: u32 = 2048;
pub const SIZE_JITTER_MAX: u32 = 16384;

/// Which plaintext layout a decrypted payload used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadFormat {
    V1Json {
        decoy_length: usize,
        delete_token: Option<String>,
    },
    LegacyRaw,
}

impl PayloadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1Json { .. } => "v1_json",
            Self::LegacyRaw => "legacy_raw",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EncodedPayload {
    pub bytes: Vec<u8>,
    pub decoy_length: usize,
}

#[derive(Debug, Clone)]
pub struct DecodedPayload {
    pub artifact: ValidatedArtifact,
    pub format: PayloadFormat,
}

impl DecodedPayload {
    pub fn delete_token(&self) -> Option<&str> {
        match &self.format {
            PayloadFormat::V1Json { delete_token, .. } => delete_token.as_deref(),
            PayloadFormat::LegacyRaw => None,
        }
    }

    pub fn decoy_length(&self) -> Option<usize> {
        match &self.format {
            PayloadFormat::V1Json { decoy_length, .. } => Some(*decoy_length),
            PayloadFormat::LegacyRaw => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePayload<'a> {
    version: u64,
    data: &'a str,
    decoy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete_token: Option<&'a str>,
}

fn unavailable(e: psbthub_crypto::CryptoError) -> PayloadError {
    PayloadError::PlatformCryptoUnavailable(e.to_string())
}

fn generate_decoy(rng: &dyn SecureRandom, length: usize) -> Result<String, PayloadError> {
    let mut bytes = vec![0u8; length];
    rng.fill_bytes(&mut bytes).map_err(unavailable)?;
    Ok(bytes
        .into_iter()
        .map(|b| char::from(DECOY_ALPHABET[usize::from(b & 63)]))
        .collect())
}

/// Wrap a validated artifact in a v1 payload with fresh decoy padding.
///
/// A blank `delete_token` is treated as absent.
pub fn encode(
    rng: &dyn SecureRandom,
    artifact: &ValidatedArtifact,
    delete_token: Option<&str>,
) -> Result<EncodedPayload, PayloadError> {
    let decoy_length =
        random_in_range(rng, DECOY_LENGTH_MIN, DECOY_LENGTH_MAX).map_err(unavailable)? as usize;

    let delete_token = delete_token.map(str::trim).filter(|t| !t.is_empty());
    if let Some(token) = delete_token {
        if !delete_capability::is_valid_token(token) {
            return Err(PayloadError::InvalidPayload(
                "delete capability token has an invalid format".into(),
            ));
        }
    }

    let wire = WirePayload {
        version: PAYLOAD_VERSION,
        data: &artifact.base64,
        decoy: generate_decoy(rng, decoy_length)?,
        delete_token,
    };
    let bytes =
        serde_json::to_vec(&wire).map_err(|e| PayloadError::InvalidPayload(e.to_string()))?;

    Ok(EncodedPayload {
        bytes,
        decoy_length,
    })
}

/// Decode decrypted plaintext back into a validated artifact.
///
/// JSON objects with `"version": 1` must be well-formed v1 payloads. Anything
/// else is treated as a legacy raw artifact.
pub fn decode(
    validator: &dyn ArtifactValidator,
    bytes: &[u8],
    max_artifact_bytes: usize,
) -> Result<DecodedPayload, PayloadError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map))
            if map.get("version").and_then(Value::as_u64) == Some(PAYLOAD_VERSION) =>
        {
            let decoded = decode_v1(validator, &map, max_artifact_bytes);
            if let Err(e) = &decoded {
                warn!(code = e.code(), "rejected v1 share payload");
            }
            decoded
        }
        _ => decode_legacy(validator, bytes, max_artifact_bytes),
    }
}

fn decode_v1(
    validator: &dyn ArtifactValidator,
    map: &serde_json::Map<String, Value>,
    max_artifact_bytes: usize,
) -> Result<DecodedPayload, PayloadError> {
    let data = map
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| PayloadError::InvalidPayload("data must be a string".into()))?;

    let decoy = map
        .get("decoy")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| PayloadError::InvalidPayload("decoy must be a non-empty string".into()))?;

    let delete_token = match map.get("deleteToken") {
        None => None,
        Some(Value::String(token)) if delete_capability::is_valid_token(token) => {
            Some(token.trim().to_string())
        }
        Some(_) => {
            return Err(PayloadError::InvalidPayload(
                "delete capability token has an invalid format".into(),
            ))
        }
    };

    let decoy_length = decoy.chars().count();
    if decoy_length > MAX_ACCEPTED_DECOY_LENGTH {
        return Err(PayloadError::InvalidPayload(format!(
            "decoy of {decoy_length} characters exceeds {MAX_ACCEPTED_DECOY_LENGTH}"
        )));
    }

    let artifact = validator
        .validate_text(data, max_artifact_bytes)
        .map_err(PayloadError::InvalidArtifact)?;

    debug!(
        format = "v1_json",
        artifact_len = artifact.byte_length,
        decoy_length,
        has_delete_token = delete_token.is_some(),
        "share payload decoded"
    );

    Ok(DecodedPayload {
        artifact,
        format: PayloadFormat::V1Json {
            decoy_length,
            delete_token,
        },
    })
}

fn decode_legacy(
    validator: &dyn ArtifactValidator,
    bytes: &[u8],
    max_artifact_bytes: usize,
) -> Result<DecodedPayload, PayloadError> {
    let artifact = validator
        .validate_bytes(bytes, max_artifact_bytes)
        .map_err(|e| {
            PayloadError::InvalidPayload(format!(
                "plaintext is neither a v1 payload nor a raw artifact: {e}"
            ))
        })?;

    debug!(
        format = "legacy_raw",
        artifact_len = artifact.byte_length,
        "share payload decoded"
    );

    Ok(DecodedPayload {
        artifact,
        format: PayloadFormat::LegacyRaw,
    })
}

/// Size to report to storage: the true length plus random jitter, capped at
/// the artifact limit.
pub fn obfuscate_size(
    rng: &dyn SecureRandom,
    true_len: u64,
    max_artifact_bytes: u64,
) -> Result<u64, PayloadError> {
    if true_len == 0 || true_len > max_artifact_bytes {
        return Err(PayloadError::ArtifactLengthOutOfRange(true_len));
    }
    let jitter = random_in_range(rng, SIZE_JITTER_MIN, SIZE_JITTER_MAX).map_err(unavailable)?;
    Ok((true_len + u64::from(jitter)).min(max_artifact_bytes))
}
