pub mod artifact;
pub mod config;
pub mod delete_capability;
pub mod error;
pub mod expiry;
pub mod password;
pub mod payload;
pub mod repository;
pub mod service;
pub mod share_id;

pub use artifact::{ArtifactValidator, PsbtValidator, ValidatedArtifact, PSBT_MAGIC};
pub use config::ShareConfig;
pub use delete_capability::DeleteCapability;
pub use error::{
    ArtifactError, ConfigError, DeleteCapabilityError, ExpiryError, PasswordError, PayloadError,
    RepositoryError, ShareError,
};
pub use expiry::{ExpiryBounds, ResolvedExpiry};
pub use password::{StrengthAssessment, StrengthLevel, StrengthSignals};
pub use payload::{DecodedPayload, EncodedPayload, PayloadFormat};
pub use repository::{CreateShareInput, MemoryShareRepository, ShareRecord, ShareRepository};
pub use service::{
    AccessMode, CreatedShare, FetchedShare, OpenedShare, SecurityMode, ShareService,
};
