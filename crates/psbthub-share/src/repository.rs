//! Storage contract for encrypted shares.
//!
//! Storage sees ciphertext, an obfuscated size, an expiry, and the hash of the
//! delete token. Nothing else about a share ever leaves the client.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::delete_capability::{is_valid_hash, normalize_hash};
use crate::error::RepositoryError;

/// A stored share as returned to readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRecord {
    pub id: String,
    /// Serialized [`psbthub_crypto::EncryptionEnvelope`].
    pub ciphertext_payload: String,
    /// Obfuscated, never the true artifact length.
    pub size_bytes: u64,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateShareInput {
    pub id: String,
    pub ciphertext_payload: String,
    pub size_bytes: u64,
    pub version: u32,
    pub expires_at: DateTime<Utc>,
    pub delete_token_hash: String,
}

/// Normalize a delete-token hash or reject it.
pub fn checked_hash(hash: &str) -> Result<String, RepositoryError> {
    if !is_valid_hash(hash) {
        return Err(RepositoryError::InvalidDeleteCapability);
    }
    Ok(normalize_hash(hash))
}

#[async_trait]
pub trait ShareRepository: Send + Sync {
    async fn insert_share(&self, input: CreateShareInput) -> Result<ShareRecord, RepositoryError>;

    /// `None` when the share does not exist or has expired.
    async fn get_share(&self, id: &str) -> Result<Option<ShareRecord>, RepositoryError>;

    /// `true` only if a share with `id` existed and `delete_token_hash` matched.
    async fn delete_share(&self, id: &str, delete_token_hash: &str)
        -> Result<bool, RepositoryError>;
}

struct StoredShare {
    record: ShareRecord,
    delete_token_hash: String,
}

/// Process-local repository for tests and single-node use.
#[derive(Default)]
pub struct MemoryShareRepository {
    shares: Mutex<HashMap<String, StoredShare>>,
}

impl MemoryShareRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored shares, expired ones included.
    pub fn len(&self) -> usize {
        self.shares.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.lock().is_empty()
    }

    /// Drop every share whose expiry is at or before `now`. Returns the count removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut shares = self.shares.lock();
        let before = shares.len();
        shares.retain(|_, stored| stored.record.expires_at > now);
        before - shares.len()
    }
}

#[async_trait]
impl ShareRepository for MemoryShareRepository {
    async fn insert_share(&self, input: CreateShareInput) -> Result<ShareRecord, RepositoryError> {
        let delete_token_hash = checked_hash(&input.delete_token_hash)?;

        let mut shares = self.shares.lock();
        if shares.contains_key(&input.id) {
            warn!(share_id = %input.id, "share id collision on insert");
            return Err(RepositoryError::InsertFailed(format!(
                "share {} already exists",
                input.id
            )));
        }

        let record = ShareRecord {
            id: input.id,
            ciphertext_payload: input.ciphertext_payload,
            size_bytes: input.size_bytes,
            version: input.version,
            created_at: Utc::now(),
            expires_at: input.expires_at,
        };
        shares.insert(
            record.id.clone(),
            StoredShare {
                record: record.clone(),
                delete_token_hash,
            },
        );
        debug!(share_id = %record.id, size_bytes = record.size_bytes, "share stored");
        Ok(record)
    }

    async fn get_share(&self, id: &str) -> Result<Option<ShareRecord>, RepositoryError> {
        let shares = self.shares.lock();
        Ok(shares
            .get(id)
            .filter(|stored| stored.record.expires_at > Utc::now())
            .map(|stored| stored.record.clone()))
    }

    async fn delete_share(
        &self,
        id: &str,
        delete_token_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let hash = checked_hash(delete_token_hash)?;

        let mut shares = self.shares.lock();
        let matches = shares
            .get(id)
            .is_some_and(|stored| stored.delete_token_hash == hash);
        if matches {
            shares.remove(id);
            debug!(share_id = %id, "share deleted");
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    const HASH: &str = "0f007385b6f9d4b7eeb2748605afe1a984a0a3bfa3f014d09e2a784ce9e5cd1a";

    fn input(id: &str, expires_in: Duration) -> CreateShareInput {
        CreateShareInput {
            id: id.to_string(),
            ciphertext_payload: "{}".into(),
            size_bytes: 4096,
            version: 1,
            expires_at: Utc::now() + expires_in,
            delete_token_hash: HASH.to_uppercase(),
        }
    }

    #[tokio::test]
    async fn insert_then_get() {
        let repo = MemoryShareRepository::new();
        let stored = repo
            .insert_share(input("share-a", Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(stored.size_bytes, 4096);
        let fetched = repo.get_share("share-a").await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert!(repo.get_share("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_id_fails() {
        let repo = MemoryShareRepository::new();
        repo.insert_share(input("dup", Duration::hours(1)))
            .await
            .unwrap();
        let err = repo
            .insert_share(input("dup", Duration::hours(1)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INSERT_FAILED");
    }

    #[tokio::test]
    async fn invalid_hash_rejected() {
        let repo = MemoryShareRepository::new();
        let mut bad = input("x", Duration::hours(1));
        bad.delete_token_hash = "nope".into();
        assert_eq!(
            repo.insert_share(bad).await.unwrap_err().code(),
            "INVALID_DELETE_CAPABILITY"
        );
        assert_eq!(
            repo.delete_share("x", "nope").await.unwrap_err().code(),
            "INVALID_DELETE_CAPABILITY"
        );
    }

    #[tokio::test]
    async fn expired_shares_are_hidden() {
        let repo = MemoryShareRepository::new();
        repo.insert_share(input("old", Duration::seconds(-1)))
            .await
            .unwrap();
        assert!(repo.get_share("old").await.unwrap().is_none());
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.purge_expired(Utc::now()), 1);
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn delete_requires_matching_hash() {
        let repo = MemoryShareRepository::new();
        repo.insert_share(input("d", Duration::hours(1)))
            .await
            .unwrap();

        let other = "a".repeat(64);
        assert!(!repo.delete_share("d", &other).await.unwrap());
        assert!(repo.get_share("d").await.unwrap().is_some());

        assert!(repo.delete_share("d", &format!(" {HASH} ")).await.unwrap());
        assert!(repo.get_share("d").await.unwrap().is_none());
        assert!(!repo.delete_share("d", HASH).await.unwrap());
    }
}
