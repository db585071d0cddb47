//! SQLite storage backend
//!
//! Every operation opens its own connection on the blocking pool, runs one
//! transaction and closes the connection again. Nothing is held between
//! calls, so a cancelled caller can at worst leave a transaction that SQLite
//! rolls back.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{schema, CredentialStore, RecordChanges};
use crate::credential::CredentialRecord;
use crate::error::Result;

/// Default time a writer waits on a locked database
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str =
    "SELECT id, title, username, sealed_secret, notes, created_at, updated_at FROM credentials";

/// SQLite-backed credential table
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    /// Create a store for the database file at `path` (created on initialize)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` against a fresh connection on the blocking pool
    async fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        let busy_timeout = self.busy_timeout;

        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&path)?;
            conn.busy_timeout(busy_timeout)?;
            op(&mut conn)
        })
        .await?
    }

    #[cfg(unix)]
    fn restrict_permissions(&self) {
        use std::os::unix::fs::PermissionsExt;

        let perms = std::fs::Permissions::from_mode(0o600);
        if let Err(e) = std::fs::set_permissions(&self.path, perms) {
            warn!("Could not restrict permissions on {:?}: {}", self.path, e);
        }
    }

    #[cfg(not(unix))]
    fn restrict_permissions(&self) {}
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        self.with_connection(schema::migrate).await?;
        self.restrict_permissions();

        debug!("SQLite store initialized at: {:?}", self.path);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<CredentialRecord>> {
        self.with_connection(move |conn| {
            let record = conn
                .query_row(
                    &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                    [id.to_string()],
                    row_to_record,
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn list_by_title(&self) -> Result<Vec<CredentialRecord>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY title, id", SELECT_COLUMNS))?;
            let rows = stmt.query_map([], row_to_record)?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
    }

    async fn insert(&self, record: &CredentialRecord) -> Result<()> {
        let record = record.clone();
        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO credentials (id, title, username, sealed_secret, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id.to_string(),
                    record.title,
                    record.username,
                    record.sealed_secret,
                    record.notes,
                    format_timestamp(&record.created_at),
                    format_timestamp(&record.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn update(&self, id: Uuid, changes: &RecordChanges) -> Result<Option<CredentialRecord>> {
        let changes = changes.clone();
        self.with_connection(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let changed = tx.execute(
                "UPDATE credentials
                 SET title = ?2, username = ?3, sealed_secret = ?4, notes = ?5, updated_at = ?6
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    changes.title,
                    changes.username,
                    changes.sealed_secret,
                    changes.notes,
                    format_timestamp(&changes.updated_at),
                ],
            )?;

            if changed == 0 {
                return Ok(None);
            }

            let record = tx.query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                [id.to_string()],
                row_to_record,
            )?;
            tx.commit()?;

            Ok(Some(record))
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.with_connection(move |conn| {
            let removed = conn.execute("DELETE FROM credentials WHERE id = ?1", [id.to_string()])?;
            Ok(removed > 0)
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "SQLite"
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<CredentialRecord> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

    Ok(CredentialRecord {
        id,
        title: row.get(1)?,
        username: row.get(2)?,
        sealed_secret: row.get(3)?,
        notes: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
        updated_at: parse_timestamp(row, 6)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(title: &str) -> CredentialRecord {
        let now = Utc::now();
        CredentialRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            username: "alice".to_string(),
            sealed_secret: "c2VhbGVk".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn test_store() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::new(temp_dir.path().join("vault.db"));
        store.initialize().await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_initialize_creates_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("vault.db");
        let store = SqliteStore::new(&path);

        store.initialize().await.unwrap();
        store.initialize().await.unwrap();

        assert!(path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_database_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _dir) = test_store().await;
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let (store, _dir) = test_store().await;
        let rec = record("Bank");

        store.insert(&rec).await.unwrap();

        let found = store.find(rec.id).await.unwrap();
        assert_eq!(found, Some(rec));
    }

    #[tokio::test]
    async fn test_find_missing() {
        let (store, _dir) = test_store().await;
        assert_eq!(store.find(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_duplicate_id_fails() {
        let (store, _dir) = test_store().await;
        let rec = record("Bank");

        store.insert(&rec).await.unwrap();
        let result = store.insert(&rec).await;

        assert!(matches!(result, Err(crate::VaultError::StoreFailure(_))));
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let (store, _dir) = test_store().await;
        let rec = record("Bank");
        store.insert(&rec).await.unwrap();

        let changes = RecordChanges {
            title: "Bank 2".to_string(),
            username: "bob".to_string(),
            sealed_secret: "bmV3".to_string(),
            notes: Some("note".to_string()),
            updated_at: rec.updated_at + chrono::Duration::seconds(5),
        };
        let updated = store.update(rec.id, &changes).await.unwrap().unwrap();

        assert_eq!(updated.id, rec.id);
        assert_eq!(updated.created_at, rec.created_at);
        assert_eq!(updated.title, "Bank 2");
        assert_eq!(updated.username, "bob");
        assert_eq!(updated.sealed_secret, "bmV3");
        assert_eq!(updated.notes.as_deref(), Some("note"));
        assert_eq!(updated.updated_at, changes.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let (store, _dir) = test_store().await;
        let changes = RecordChanges {
            title: "x".to_string(),
            username: "y".to_string(),
            sealed_secret: "eg==".to_string(),
            notes: None,
            updated_at: Utc::now(),
        };

        assert!(store.update(Uuid::new_v4(), &changes).await.unwrap().is_none());
        assert!(store.list_by_title().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let (store, _dir) = test_store().await;
        let rec = record("Bank");
        store.insert(&rec).await.unwrap();

        assert!(store.delete(rec.id).await.unwrap());
        assert!(!store.delete(rec.id).await.unwrap());
        assert!(store.find(rec.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_uses_binary_collation() {
        let (store, _dir) = test_store().await;
        for title in ["alpha", "Zeta", "Alpha", "Mid"] {
            store.insert(&record(title)).await.unwrap();
        }

        let titles: Vec<String> = store
            .list_by_title()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();

        // Uppercase sorts before lowercase under BINARY
        assert_eq!(titles, vec!["Alpha", "Mid", "Zeta", "alpha"]);
    }

    #[tokio::test]
    async fn test_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vault.db");
        let rec = record("Bank");

        {
            let store = SqliteStore::new(&path);
            store.initialize().await.unwrap();
            store.insert(&rec).await.unwrap();
        }

        {
            let store = SqliteStore::new(&path);
            store.initialize().await.unwrap();
            assert_eq!(store.find(rec.id).await.unwrap(), Some(rec));
        }
    }
}
