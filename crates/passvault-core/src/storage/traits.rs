//! Storage trait definitions

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::credential::CredentialRecord;
use crate::error::Result;

/// Mutable fields of a stored record; id and `created_at` never change
#[derive(Debug, Clone)]
pub struct RecordChanges {
    pub title: String,
    pub username: String,
    pub sealed_secret: String,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Durable table of credential records keyed by id.
///
/// Every method is one atomic single-record operation: it either fully
/// applies or leaves the store untouched.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create the store if missing and bring its schema up to date.
    /// Safe to call on every startup.
    async fn initialize(&self) -> Result<()>;

    /// Point lookup
    async fn find(&self, id: Uuid) -> Result<Option<CredentialRecord>>;

    /// Full scan ordered by title (binary collation), then id
    async fn list_by_title(&self) -> Result<Vec<CredentialRecord>>;

    /// Insert a new record; an existing id is a store failure
    async fn insert(&self, record: &CredentialRecord) -> Result<()>;

    /// Overwrite the mutable fields of an existing record.
    ///
    /// Returns the record as stored afterwards, or `None` if no record has
    /// this id.
    async fn update(&self, id: Uuid, changes: &RecordChanges) -> Result<Option<CredentialRecord>>;

    /// Remove a record, returning whether one existed
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
