//! Credential repository for CRUD operations
//!
//! The only path by which secrets enter or leave the store: everything
//! written is sealed first, everything read is opened before it is returned.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::{Credential, CredentialRecord};
use crate::config::VaultConfig;
use crate::crypto::{Envelope, SecureBuffer};
use crate::error::{Result, VaultError};
use crate::storage::{CredentialStore, RecordChanges, SqliteStore};

/// Credential repository
pub struct CredentialRepository {
    /// Storage backend
    store: Arc<dyn CredentialStore>,
    /// Envelope holding the key for the lifetime of the repository
    envelope: Envelope,
}

impl CredentialRepository {
    /// Create a repository over `store`, sealing with the given key bytes
    pub fn new(store: Arc<dyn CredentialStore>, key: &[u8]) -> Result<Self> {
        Ok(Self::with_envelope(store, Envelope::new(key)?))
    }

    pub fn with_envelope(store: Arc<dyn CredentialStore>, envelope: Envelope) -> Self {
        Self { store, envelope }
    }

    /// Open the SQLite store described by `config` and initialize it
    pub async fn open(config: &VaultConfig, key: &[u8]) -> Result<Self> {
        let envelope = Envelope::new(key)?;
        let store = SqliteStore::new(config.resolve_store_path())
            .with_busy_timeout(config.busy_timeout());

        let repository = Self::with_envelope(Arc::new(store), envelope);
        repository.initialize().await?;
        Ok(repository)
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Ensure the store exists and its schema is current
    pub async fn initialize(&self) -> Result<()> {
        self.store.initialize().await?;
        info!("Credential store ready ({})", self.store.backend_name());
        Ok(())
    }

    /// Seal and store a new credential.
    ///
    /// A nil id is replaced by a fresh one. On success the credential's id
    /// and timestamps reflect what was stored.
    pub async fn add(&self, credential: &mut Credential) -> Result<Uuid> {
        credential.validate()?;

        let id = if credential.id.is_nil() {
            Uuid::new_v4()
        } else {
            credential.id
        };
        let now = Utc::now();

        let record = CredentialRecord {
            id,
            title: credential.title.clone(),
            username: credential.username.clone(),
            sealed_secret: self.seal(&credential.secret)?,
            notes: credential.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&record).await?;

        credential.id = id;
        credential.created_at = now;
        credential.updated_at = now;

        info!("Added credential: {}", id);
        Ok(id)
    }

    /// Overwrite an existing credential, always re-sealing its secret
    pub async fn update(&self, credential: &mut Credential) -> Result<()> {
        credential.validate()?;

        let changes = RecordChanges {
            title: credential.title.clone(),
            username: credential.username.clone(),
            sealed_secret: self.seal(&credential.secret)?,
            notes: credential.notes.clone(),
            updated_at: Utc::now(),
        };

        let stored = self
            .store
            .update(credential.id, &changes)
            .await?
            .ok_or(VaultError::NotFound(credential.id))?;

        credential.created_at = stored.created_at;
        credential.updated_at = stored.updated_at;

        info!("Updated credential: {}", credential.id);
        Ok(())
    }

    /// Delete a credential; deleting an absent id is not an error
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if self.store.delete(id).await? {
            info!("Deleted credential: {}", id);
        } else {
            debug!("Credential already absent: {}", id);
        }
        Ok(())
    }

    /// Get and decrypt a credential.
    ///
    /// `Ok(None)` means no such record. A record that exists but cannot be
    /// opened is an error, never `None`.
    pub async fn get(&self, id: Uuid) -> Result<Option<Credential>> {
        match self.store.find(id).await? {
            Some(record) => {
                let credential = self.open_record(record)?;
                debug!("Decrypted credential: {}", id);
                Ok(Some(credential))
            }
            None => {
                debug!("Credential not found: {}", id);
                Ok(None)
            }
        }
    }

    /// Get and decrypt every credential, ordered by title.
    ///
    /// Titles compare byte-wise (SQLite BINARY collation), so uppercase
    /// sorts before lowercase. If any record fails to open the whole call
    /// fails; credentials decrypted so far are zeroed as they are dropped.
    pub async fn get_all(&self) -> Result<Vec<Credential>> {
        let records = self.store.list_by_title().await?;

        let credentials = records
            .into_iter()
            .map(|record| self.open_record(record))
            .collect::<Result<Vec<_>>>()?;

        debug!("Decrypted {} credentials", credentials.len());
        Ok(credentials)
    }

    fn seal(&self, secret: &SecureBuffer) -> Result<String> {
        let plaintext = secret.expose().unwrap_or_default();
        self.envelope.seal(plaintext.as_bytes())
    }

    fn open_record(&self, record: CredentialRecord) -> Result<Credential> {
        let id = record.id;
        let secret = self
            .envelope
            .open_secret(&record.sealed_secret)
            .map_err(|e| {
                warn!("Credential {} could not be decrypted: {}", id, e);
                e
            })?;

        Ok(Credential::from_record(record, secret))
    }
}

impl std::fmt::Debug for CredentialRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRepository")
            .field("backend", &self.store.backend_name())
            .field("envelope", &self.envelope)
            .finish()
    }
}
