//! Symmetric key material with automatic zeroization

use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, VaultError};

/// Supported AES-GCM key sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySize {
    /// 128-bit key (16 bytes)
    Aes128,
    /// 192-bit key (24 bytes)
    Aes192,
    /// 256-bit key (32 bytes)
    Aes256,
}

impl KeySize {
    /// Key length in bytes
    pub const fn byte_len(self) -> usize {
        match self {
            KeySize::Aes128 => 16,
            KeySize::Aes192 => 24,
            KeySize::Aes256 => 32,
        }
    }

    /// Map a raw key length onto a key size, if it is one we support
    pub fn from_byte_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(KeySize::Aes128),
            24 => Some(KeySize::Aes192),
            32 => Some(KeySize::Aes256),
            _ => None,
        }
    }
}

/// Envelope encryption key - automatically zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: Vec<u8>,
    #[zeroize(skip)]
    size: KeySize,
}

impl EncryptionKey {
    /// Create from raw key bytes (must be 16, 24 or 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        let size = KeySize::from_byte_len(slice.len()).ok_or_else(|| {
            VaultError::InvalidConfiguration(format!(
                "key must be 16, 24 or 32 bytes, got {}",
                slice.len()
            ))
        })?;

        Ok(Self {
            bytes: slice.to_vec(),
            size,
        })
    }

    /// Generate a fresh random key from the OS entropy source
    pub fn generate(size: KeySize) -> Self {
        let mut bytes = vec![0u8; size.byte_len()];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes, size }
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> KeySize {
        self.size
    }
}

impl Clone for EncryptionKey {
    fn clone(&self) -> Self {
        Self {
            bytes: self.bytes.clone(),
            size: self.size,
        }
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("size", &self.size)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
