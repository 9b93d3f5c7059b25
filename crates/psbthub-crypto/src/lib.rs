pub mod aead;
pub mod base64url;
pub mod envelope;
pub mod error;
pub mod fragment;
pub mod kdf;
pub mod keys;
pub mod provider;
pub mod random;
pub mod types;

pub use aead::{AeadCipher, Aes256GcmCipher};
pub use base64url::{base64url_decode, base64url_encode, is_base64url};
pub use envelope::{
    decrypt, decrypt_with_key_bytes, encrypt, encrypt_with_key_bytes, EncryptionEnvelope,
    KeyProtection,
};
pub use error::CryptoError;
pub use fragment::{build_fragment, extract_fragment_key, strip_fragment_key, FRAGMENT_KEY_PARAM};
pub use kdf::{
    create_password_derivation_params, derive_key_from_password, KeyDerivationFunction,
    PasswordKeyDerivation, Pbkdf2Sha256,
};
pub use keys::{decode_key_from_fragment, encode_key_for_fragment, generate_key_bytes, ShareKey};
pub use provider::CryptoProvider;
pub use random::{random_array, random_in_range, random_u32, OsRandom, SecureRandom};
pub use types::{
    AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH, DEFAULT_PASSWORD_DERIVATION_ITERATIONS,
    ENVELOPE_ALGORITHM, ENVELOPE_VERSION, MAX_PASSWORD_DERIVATION_ITERATIONS,
    MIN_PASSWORD_DERIVATION_ITERATIONS, PASSWORD_DERIVATION_TYPE, PASSWORD_SALT_LENGTH,
};
