use psbthub_crypto::{CryptoError, SecureRandom};

pub const SHARE_ID_LENGTH: usize = 22;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
/// Largest multiple of 62 not above 256; bytes at or past it are discarded.
const REJECTION_THRESHOLD: u8 = 248;

/// A fresh 22-character alphanumeric share id (about 131 bits).
pub fn generate(rng: &dyn SecureRandom) -> Result<String, CryptoError> {
    let mut id = String::with_capacity(SHARE_ID_LENGTH);
    let mut buf = [0u8; SHARE_ID_LENGTH * 2];
    while id.len() < SHARE_ID_LENGTH {
        rng.fill_bytes(&mut buf)?;
        for &byte in buf.iter().filter(|&&b| b < REJECTION_THRESHOLD) {
            id.push(char::from(ALPHABET[usize::from(byte) % ALPHABET.len()]));
            if id.len() == SHARE_ID_LENGTH {
                break;
            }
        }
    }
    Ok(id)
}

pub fn is_valid(id: &str) -> bool {
    let id = id.trim();
    id.len() == SHARE_ID_LENGTH && id.bytes().all(|b| b.is_ascii_alphanumeric())
}
