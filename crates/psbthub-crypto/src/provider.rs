use std::sync::Arc;

use crate::aead::{AeadCipher, Aes256GcmCipher};
use crate::kdf::{KeyDerivationFunction, Pbkdf2Sha256};
use crate::random::{OsRandom, SecureRandom};

/// Bundle of the platform capabilities the share protocol needs.
///
/// Cheap to clone; all members are shared.
#[derive(Clone)]
pub struct CryptoProvider {
    pub rng: Arc<dyn SecureRandom>,
    pub aead: Arc<dyn AeadCipher>,
    pub kdf: Arc<dyn KeyDerivationFunction>,
}

impl CryptoProvider {
    pub fn new(
        rng: Arc<dyn SecureRandom>,
        aead: Arc<dyn AeadCipher>,
        kdf: Arc<dyn KeyDerivationFunction>,
    ) -> Self {
        Self { rng, aead, kdf }
    }

    /// OS randomness, RustCrypto AES-256-GCM and PBKDF2.
    pub fn system() -> Self {
        Self::new(
            Arc::new(OsRandom),
            Arc::new(Aes256GcmCipher),
            Arc::new(Pbkdf2Sha256),
        )
    }

    /// Replace the random source, keeping the other capabilities.
    pub fn with_rng(mut self, rng: Arc<dyn SecureRandom>) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_aead(mut self, aead: Arc<dyn AeadCipher>) -> Self {
        self.aead = aead;
        self
    }

    pub fn with_kdf(mut self, kdf: Arc<dyn KeyDerivationFunction>) -> Self {
        self.kdf = kdf;
        self
    }
}

impl Default for CryptoProvider {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for CryptoProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoProvider").finish_non_exhaustive()
    }
}
