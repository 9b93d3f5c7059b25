//! Secure randomness as an injected capability.

use crate::error::CryptoError;

/// Source of cryptographically secure random bytes.
///
/// Every IV, salt, key, token, and decoy in the protocol is drawn from one of
/// these. Tests substitute deterministic or failing implementations.
pub trait SecureRandom: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), CryptoError>;
}

/// Operating-system CSPRNG via `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), CryptoError> {
        getrandom::getrandom(dest)
            .map_err(|e| CryptoError::PlatformCryptoUnavailable(e.to_string()))
    }
}

/// Draw a fixed-size random array.
pub fn random_array<const N: usize>(rng: &dyn SecureRandom) -> Result<[u8; N], CryptoError> {
    let mut out = [0u8; N];
    rng.fill_bytes(&mut out)?;
    Ok(out)
}

/// Draw a random `u32`.
pub fn random_u32(rng: &dyn SecureRandom) -> Result<u32, CryptoError> {
    Ok(u32::from_le_bytes(random_array::<4>(rng)?))
}

/// Uniform integer in `min..=max` using rejection sampling to avoid modulo bias.
pub fn random_in_range(rng: &dyn SecureRandom, min: u32, max: u32) -> Result<u32, CryptoError> {
    debug_assert!(min <= max);
    let range = u64::from(max - min) + 1;
    let space = 1u64 << 32;
    let max_unbiased = (space / range) * range;
    loop {
        let value = u64::from(random_u32(rng)?);
        if value < max_unbiased {
            return Ok(min + (value % range) as u32);
        }
    }
}
