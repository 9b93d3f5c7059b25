/// Envelope wire format version.
///
/// Version 1: AES-256-GCM, base64url IV and ciphertext in a JSON object,
/// optional PBKDF2-SHA256 parameters for password-protected shares.
pub const ENVELOPE_VERSION: u8 = 1;

/// Algorithm tag written into every envelope.
pub const ENVELOPE_ALGORITHM: &str = "AES-GCM-256";

/// Key derivation tag written into password-protected envelopes.
pub const PASSWORD_DERIVATION_TYPE: &str = "PBKDF2-SHA256";

/// AES-GCM IV length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_IV_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// AES key length in bytes (256 bits).
pub const AES_KEY_LENGTH: usize = 32;

/// PBKDF2 salt length in bytes.
pub const PASSWORD_SALT_LENGTH: usize = 16;

/// Lowest accepted PBKDF2 iteration count.
pub const MIN_PASSWORD_DERIVATION_ITERATIONS: u32 = 100_000;

/// Highest accepted PBKDF2 iteration count.
pub const MAX_PASSWORD_DERIVATION_ITERATIONS: u32 = 1_000_000;

/// Iteration count used for new password-protected shares.
pub const DEFAULT_PASSWORD_DERIVATION_ITERATIONS: u32 = 310_000;
