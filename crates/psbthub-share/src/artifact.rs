//! Artifact normalization.
//!
//! The share protocol treats the artifact as opaque bytes. A validator turns
//! user input into canonical bytes plus padded standard base64, and enforces
//! the size limit.

use base64ct::{Base64, Base64Unpadded, Encoding};

use crate::error::ArtifactError;

/// `psbt` followed by the `0xff` separator.
pub const PSBT_MAGIC: [u8; 5] = [0x70, 0x73, 0x62, 0x74, 0xff];

const PSBT_URI_PREFIX: &str = "psbt:";

/// A normalized artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedArtifact {
    /// Canonical padded standard base64.
    pub base64: String,
    pub bytes: Vec<u8>,
    pub byte_length: usize,
}

impl ValidatedArtifact {
    fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            base64: Base64::encode_string(&bytes),
            byte_length: bytes.len(),
            bytes,
        }
    }
}

/// Normalizes artifact input from text or raw bytes.
pub trait ArtifactValidator: Send + Sync {
    fn validate_bytes(&self, bytes: &[u8], max_bytes: usize)
        -> Result<ValidatedArtifact, ArtifactError>;

    fn validate_text(&self, text: &str, max_bytes: usize)
        -> Result<ValidatedArtifact, ArtifactError>;
}

/// Accepts PSBTs as base64 (optionally `psbt:`-prefixed), hex, or raw bytes.
///
/// Only the magic prefix is checked; the PSBT maps are never parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PsbtValidator;

impl PsbtValidator {
    fn decode_base64(candidate: &str) -> Result<Vec<u8>, ArtifactError> {
        let body = candidate.trim_end_matches('=');
        let padding = candidate.len() - body.len();
        let shape_ok = !body.is_empty()
            && padding <= 2
            && body
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/');
        if !shape_ok {
            return Err(ArtifactError::InvalidEncoding("not base64".into()));
        }
        Base64Unpadded::decode_vec(body)
            .map_err(|_| ArtifactError::InvalidEncoding("base64 could not be decoded".into()))
    }

    fn decode_hex(candidate: &str) -> Result<Vec<u8>, ArtifactError> {
        let body = candidate
            .strip_prefix("0x")
            .or_else(|| candidate.strip_prefix("0X"))
            .unwrap_or(candidate);
        if body.is_empty() || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ArtifactError::InvalidEncoding("not hex".into()));
        }
        hex::decode(body).map_err(|e| ArtifactError::InvalidEncoding(e.to_string()))
    }

    /// Decode one candidate encoding and check it as bytes.
    fn attempt(
        &self,
        decoded: Result<Vec<u8>, ArtifactError>,
        max_bytes: usize,
    ) -> Result<ValidatedArtifact, ArtifactError> {
        self.validate_bytes(&decoded?, max_bytes)
    }
}

fn rank(err: &ArtifactError) -> u8 {
    match err {
        ArtifactError::TooLarge { .. } => 3,
        ArtifactError::InvalidStructure(_) => 2,
        ArtifactError::InvalidEncoding(_) => 1,
        ArtifactError::EmptyInput => 0,
    }
}

impl ArtifactValidator for PsbtValidator {
    fn validate_bytes(
        &self,
        bytes: &[u8],
        max_bytes: usize,
    ) -> Result<ValidatedArtifact, ArtifactError> {
        if bytes.is_empty() {
            return Err(ArtifactError::EmptyInput);
        }
        if bytes.len() > max_bytes {
            return Err(ArtifactError::TooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }
        if !bytes.starts_with(&PSBT_MAGIC) {
            return Err(ArtifactError::InvalidStructure(
                "missing PSBT magic bytes".into(),
            ));
        }
        Ok(ValidatedArtifact::from_bytes(bytes.to_vec()))
    }

    fn validate_text(
        &self,
        text: &str,
        max_bytes: usize,
    ) -> Result<ValidatedArtifact, ArtifactError> {
        let trimmed = text.trim();
        let unprefixed = match trimmed.get(..PSBT_URI_PREFIX.len()) {
            Some(head) if head.eq_ignore_ascii_case(PSBT_URI_PREFIX) => {
                &trimmed[PSBT_URI_PREFIX.len()..]
            }
            _ => trimmed,
        };
        let candidate: String = unprefixed.chars().filter(|c| !c.is_whitespace()).collect();
        if candidate.is_empty() {
            return Err(ArtifactError::EmptyInput);
        }

        let base64_err = match self.attempt(Self::decode_base64(&candidate), max_bytes) {
            Ok(artifact) => return Ok(artifact),
            Err(e) => e,
        };
        let hex_err = match self.attempt(Self::decode_hex(&candidate), max_bytes) {
            Ok(artifact) => return Ok(artifact),
            Err(e) => e,
        };

        if rank(&hex_err) > rank(&base64_err) {
            Err(hex_err)
        } else {
            Err(base64_err)
        }
    }
}
