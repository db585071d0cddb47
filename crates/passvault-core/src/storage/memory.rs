//! Volatile in-memory storage backend

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{CredentialStore, RecordChanges};
use crate::credential::CredentialRecord;
use crate::error::{Result, VaultError};

/// Credential table held in a map; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, CredentialRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<CredentialRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list_by_title(&self) -> Result<Vec<CredentialRecord>> {
        let mut records: Vec<CredentialRecord> =
            self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn insert(&self, record: &CredentialRecord) -> Result<()> {
        let mut records = self.records.write().await;

        if records.contains_key(&record.id) {
            return Err(VaultError::StoreFailure(format!(
                "credential {} already exists",
                record.id
            )));
        }

        records.insert(record.id, record.clone());
        debug!("Inserted record: {}", record.id);
        Ok(())
    }

    async fn update(&self, id: Uuid, changes: &RecordChanges) -> Result<Option<CredentialRecord>> {
        let mut records = self.records.write().await;

        Ok(records.get_mut(&id).map(|record| {
            record.title = changes.title.clone();
            record.username = changes.username.clone();
            record.sealed_secret = changes.sealed_secret.clone();
            record.notes = changes.notes.clone();
            record.updated_at = changes.updated_at;
            record.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory"
    }
}
