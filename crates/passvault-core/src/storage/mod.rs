//! Durable stores for credential records
//!
//! This module provides two backends:
//! 1. SQLite (default, on disk)
//! 2. In-memory (tests and throwaway vaults)

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use schema::CURRENT_VERSION as SCHEMA_VERSION;
pub use sqlite::{SqliteStore, DEFAULT_BUSY_TIMEOUT};
pub use traits::{CredentialStore, RecordChanges};
