//! Error types for passvault-core

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Authentication failed - wrong key or tampered data")]
    AuthenticationFailure,

    #[error("Credential not found: {0}")]
    NotFound(Uuid),

    #[error("Store failure: {0}")]
    StoreFailure(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailure(String),
}

impl VaultError {
    /// True for errors raised while opening an envelope.
    ///
    /// These are never the same thing as a missing record.
    pub fn is_decryption_error(&self) -> bool {
        matches!(
            self,
            VaultError::MalformedInput(_) | VaultError::AuthenticationFailure
        )
    }
}

impl From<rusqlite::Error> for VaultError {
    fn from(err: rusqlite::Error) -> Self {
        VaultError::StoreFailure(err.to_string())
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        VaultError::StoreFailure(err.to_string())
    }
}

impl From<tokio::task::JoinError> for VaultError {
    fn from(err: tokio::task::JoinError) -> Self {
        VaultError::StoreFailure(format!("store task failed: {}", err))
    }
}
