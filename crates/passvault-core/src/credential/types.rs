//! Credential type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::SecureBuffer;
use crate::error::{Result, VaultError};

/// Maximum length of title and username, in UTF-16 code units
pub const MAX_FIELD_LEN: usize = 512;

/// Decrypted credential as handed to callers.
///
/// The secret lives in a [`SecureBuffer`] and is zeroed when the credential
/// is dropped. A nil `id` means "not yet stored"; the repository assigns one
/// on add.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Unique identifier
    pub id: Uuid,

    /// User-friendly name (e.g., "Bank")
    pub title: String,

    /// Account name
    pub username: String,

    /// Plaintext secret, never persisted
    pub secret: SecureBuffer,

    /// Free-form notes
    pub notes: Option<String>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Create an unsaved credential
    pub fn new(title: &str, username: &str, secret: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            title: title.to_string(),
            username: username.to_string(),
            secret: SecureBuffer::new(secret),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Check the fields a stored record must satisfy
    pub fn validate(&self) -> Result<()> {
        validate_field("title", &self.title)?;
        validate_field("username", &self.username)?;

        if !self.secret.is_set() {
            return Err(VaultError::InvalidCredential(
                "secret has not been set".to_string(),
            ));
        }

        Ok(())
    }

    /// Rebuild a credential from its stored record and the opened secret
    pub(crate) fn from_record(record: CredentialRecord, secret: SecureBuffer) -> Self {
        Self {
            id: record.id,
            title: record.title,
            username: record.username,
            secret,
            notes: record.notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

fn validate_field(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(VaultError::InvalidCredential(format!(
            "{} must not be empty",
            name
        )));
    }

    if value.encode_utf16().count() > MAX_FIELD_LEN {
        return Err(VaultError::InvalidCredential(format!(
            "{} exceeds {} characters",
            name, MAX_FIELD_LEN
        )));
    }

    Ok(())
}

/// Stored credential (encrypted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: Uuid,
    pub title: String,
    pub username: String,

    /// Envelope text: base64(nonce ‖ tag ‖ ciphertext)
    pub sealed_secret: String,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_credential_is_unsaved() {
        let cred = Credential::new("Bank", "alice", "s3cr3t").with_notes("pin is 0000");

        assert!(cred.id.is_nil());
        assert_eq!(cred.secret.expose(), Some("s3cr3t"));
        assert_eq!(cred.notes.as_deref(), Some("pin is 0000"));
        assert!(cred.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let no_title = Credential::new("", "alice", "x");
        assert!(matches!(no_title.validate(), Err(VaultError::InvalidCredential(_))));

        let no_user = Credential::new("Bank", "", "x");
        assert!(matches!(no_user.validate(), Err(VaultError::InvalidCredential(_))));
    }

    #[test]
    fn test_validate_counts_utf16_units() {
        let at_limit = "a".repeat(MAX_FIELD_LEN);
        assert!(Credential::new(&at_limit, "alice", "x").validate().is_ok());

        let over_limit = "a".repeat(MAX_FIELD_LEN + 1);
        assert!(Credential::new(&over_limit, "alice", "x").validate().is_err());

        // Each of these takes two UTF-16 units
        let astral = "😀".repeat(MAX_FIELD_LEN / 2 + 1);
        assert!(Credential::new("Bank", &astral, "x").validate().is_err());
    }

    #[test]
    fn test_validate_requires_secret() {
        let mut cred = Credential::new("Bank", "alice", "");
        assert!(cred.validate().is_ok());

        cred.secret.clear();
        assert!(matches!(cred.validate(), Err(VaultError::InvalidCredential(_))));
    }

    #[test]
    fn test_debug_hides_secret() {
        let cred = Credential::new("Bank", "alice", "s3cr3t");
        let debug = format!("{:?}", cred);
        assert!(!debug.contains("s3cr3t"));
    }
}
