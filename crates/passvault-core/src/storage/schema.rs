//! SQLite schema and upgrade steps
//!
//! The schema version lives in `PRAGMA user_version`. Entry `n` of
//! [`MIGRATIONS`] upgrades a database from version `n` to `n + 1`.

use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info};

use crate::error::{Result, VaultError};

pub const CREATE_CREDENTIALS: &str = r#"
CREATE TABLE IF NOT EXISTS credentials (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    username TEXT NOT NULL,
    sealed_secret TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_credentials_title ON credentials(title);
"#;

const MIGRATIONS: &[&str] = &[CREATE_CREDENTIALS];

/// Schema version written by this build
pub const CURRENT_VERSION: i64 = MIGRATIONS.len() as i64;

/// Apply any pending upgrade steps in one immediate transaction
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let version: i64 = tx.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if !(0..=CURRENT_VERSION).contains(&version) {
        return Err(VaultError::StoreFailure(format!(
            "store schema version {} is not supported (expected 0..={})",
            version, CURRENT_VERSION
        )));
    }

    if version == CURRENT_VERSION {
        debug!("Store schema is current (version {})", version);
        return Ok(());
    }

    for step in &MIGRATIONS[version as usize..] {
        tx.execute_batch(step)?;
    }
    tx.pragma_update(None, "user_version", CURRENT_VERSION)?;
    tx.commit()?;

    info!("Upgraded store schema from version {} to {}", version, CURRENT_VERSION);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_version(conn: &Connection) -> i64 {
        conn.query_row("PRAGMA user_version", [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn test_migrate_fresh_database() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        assert_eq!(user_version(&conn), CURRENT_VERSION);
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'credentials'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        assert_eq!(user_version(&conn), CURRENT_VERSION);
    }

    #[test]
    fn test_migrate_rejects_newer_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_VERSION + 1)
            .unwrap();

        assert!(matches!(
            migrate(&mut conn),
            Err(VaultError::StoreFailure(_))
        ));
    }
}
