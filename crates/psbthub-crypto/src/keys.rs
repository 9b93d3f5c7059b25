//! Symmetric share keys and their URL-fragment encoding.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::base64url::{base64url_decode, base64url_encode, is_base64url};
use crate::error::CryptoError;
use crate::random::{random_array, SecureRandom};
use crate::types::AES_KEY_LENGTH;

/// A 32-byte AES-256 key, from either a random draw or a password derivation.
///
/// Zeroized on drop. `Debug` never prints key material.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ShareKey([u8; AES_KEY_LENGTH]);

impl ShareKey {
    /// Wrap raw bytes, requiring exactly 32 of them.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; AES_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: AES_KEY_LENGTH,
                    got: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; AES_KEY_LENGTH] {
        &self.0
    }
}

impl From<[u8; AES_KEY_LENGTH]> for ShareKey {
    fn from(bytes: [u8; AES_KEY_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ShareKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ShareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShareKey(..)")
    }
}

/// Generate a random 32-byte AES-256 key.
pub fn generate_key_bytes(rng: &dyn SecureRandom) -> Result<ShareKey, CryptoError> {
    Ok(ShareKey(random_array::<AES_KEY_LENGTH>(rng)?))
}

/// Encode raw key bytes for URL-fragment transport (43 base64url chars).
pub fn encode_key_for_fragment(key: &[u8]) -> Result<String, CryptoError> {
    if key.len() != AES_KEY_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            expected: AES_KEY_LENGTH,
            got: key.len(),
        });
    }
    Ok(base64url_encode(key))
}

/// Decode and validate key material carried in a URL fragment.
pub fn decode_key_from_fragment(fragment_key: &str) -> Result<ShareKey, CryptoError> {
    let normalized = fragment_key.trim();
    if !is_base64url(normalized) {
        return Err(CryptoError::InvalidFragmentKey(
            "missing or not base64url".into(),
        ));
    }

    let mut bytes = base64url_decode(normalized)
        .map_err(|_| CryptoError::InvalidFragmentKey("could not be decoded".into()))?;

    let key = ShareKey::from_slice(&bytes).map_err(|_| {
        CryptoError::InvalidFragmentKey(format!(
            "must decode to {} bytes, got {}",
            AES_KEY_LENGTH,
            bytes.len()
        ))
    });
    bytes.zeroize();
    key
}
