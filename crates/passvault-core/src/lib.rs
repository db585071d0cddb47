//! # passvault-core
//!
//! Core of the passvault credential vault:
//! - AES-GCM envelopes (128/192/256-bit keys) for every secret at rest
//! - A credential repository that never persists plaintext
//! - Secure buffers that hold a decrypted secret and zero it on clear or drop
//! - SQLite and in-memory credential stores

pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod storage;

pub use config::VaultConfig;
pub use credential::{Credential, CredentialRecord, CredentialRepository};
pub use crypto::{EncryptionKey, Envelope, KeySize, SecureBuffer};
pub use error::{Result, VaultError};
pub use storage::{CredentialStore, MemoryStore, SqliteStore};
