//! AES-GCM authenticated encryption envelope
//!
//! Envelope format: `base64(nonce ‖ tag ‖ ciphertext)`
//! - Nonce: 12 bytes (96 bits), fresh from the OS RNG on every seal
//! - Auth tag: 16 bytes (128 bits)
//! - Ciphertext: same length as the plaintext
//!
//! The key size (128, 192 or 256 bits) picks the AES variant. There is no
//! version byte, so the nonce and tag lengths are fixed for all stored data.

use aes_gcm::{
    aead::{consts::U12, AeadInPlace, KeyInit, Nonce, Tag},
    aes::Aes192,
    Aes128Gcm, Aes256Gcm, AesGcm,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use super::{EncryptionKey, KeySize, SecureBuffer};
use crate::error::{Result, VaultError};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// Authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Smallest decoded envelope: nonce and tag around an empty ciphertext
pub const ENVELOPE_OVERHEAD: usize = NONCE_LEN + TAG_LEN;

/// Seals and opens secrets under one fixed key
#[derive(Clone)]
pub struct Envelope {
    key: EncryptionKey,
}

impl Envelope {
    /// Create an envelope from raw key bytes (16, 24 or 32 bytes)
    pub fn new(key: &[u8]) -> Result<Self> {
        Ok(Self::from_key(EncryptionKey::from_slice(key)?))
    }

    pub fn from_key(key: EncryptionKey) -> Self {
        Self { key }
    }

    pub fn key_size(&self) -> KeySize {
        self.key.size()
    }

    /// Encrypt plaintext into a base64 envelope
    pub fn seal(&self, plaintext: &[u8]) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        // Plaintext is encrypted in place behind a reserved nonce/tag header
        let mut output = Zeroizing::new(Vec::with_capacity(ENVELOPE_OVERHEAD + plaintext.len()));
        output.extend_from_slice(&nonce);
        output.extend_from_slice(&[0u8; TAG_LEN]);
        output.extend_from_slice(plaintext);

        let tag = self.seal_in_place(&nonce, &mut output[ENVELOPE_OVERHEAD..])?;
        output[NONCE_LEN..ENVELOPE_OVERHEAD].copy_from_slice(&tag);

        Ok(STANDARD.encode(output.as_slice()))
    }

    /// Decrypt a base64 envelope, verifying its tag first
    pub fn open(&self, envelope: &str) -> Result<Zeroizing<Vec<u8>>> {
        let decoded = STANDARD
            .decode(envelope)
            .map_err(|e| VaultError::MalformedInput(format!("envelope is not valid base64: {}", e)))?;

        if decoded.len() < ENVELOPE_OVERHEAD {
            return Err(VaultError::MalformedInput(format!(
                "envelope is {} bytes, expected at least {}",
                decoded.len(),
                ENVELOPE_OVERHEAD
            )));
        }

        let (nonce, rest) = decoded.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut buffer = Zeroizing::new(ciphertext.to_vec());
        self.open_in_place(nonce, tag, &mut buffer)?;

        Ok(buffer)
    }

    /// Decrypt a UTF-8 secret straight into a [`SecureBuffer`]
    pub fn open_secret(&self, envelope: &str) -> Result<SecureBuffer> {
        let mut plaintext = self.open(envelope)?;
        let bytes = std::mem::take(&mut *plaintext);

        match String::from_utf8(bytes) {
            Ok(secret) => Ok(SecureBuffer::from_string(secret)),
            Err(err) => {
                err.into_bytes().zeroize();
                Err(VaultError::MalformedInput(
                    "decrypted secret is not valid UTF-8".to_string(),
                ))
            }
        }
    }

    fn seal_in_place(&self, nonce: &[u8; NONCE_LEN], buffer: &mut [u8]) -> Result<[u8; TAG_LEN]> {
        let key = self.key.as_bytes();
        match self.key.size() {
            KeySize::Aes128 => seal_with::<Aes128Gcm>(key, nonce, buffer),
            KeySize::Aes192 => seal_with::<Aes192Gcm>(key, nonce, buffer),
            KeySize::Aes256 => seal_with::<Aes256Gcm>(key, nonce, buffer),
        }
    }

    fn open_in_place(&self, nonce: &[u8], tag: &[u8], buffer: &mut [u8]) -> Result<()> {
        let key = self.key.as_bytes();
        match self.key.size() {
            KeySize::Aes128 => open_with::<Aes128Gcm>(key, nonce, tag, buffer),
            KeySize::Aes192 => open_with::<Aes192Gcm>(key, nonce, tag, buffer),
            KeySize::Aes256 => open_with::<Aes256Gcm>(key, nonce, tag, buffer),
        }
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("key_size", &self.key.size())
            .finish_non_exhaustive()
    }
}

fn seal_with<C>(key: &[u8], nonce: &[u8; NONCE_LEN], buffer: &mut [u8]) -> Result<[u8; TAG_LEN]>
where
    C: KeyInit + AeadInPlace,
{
    let cipher = C::new_from_slice(key)
        .map_err(|e| VaultError::InvalidConfiguration(e.to_string()))?;

    let tag = cipher
        .encrypt_in_place_detached(Nonce::<C>::from_slice(nonce), b"", buffer)
        .map_err(|e| VaultError::EncryptionFailure(e.to_string()))?;

    let mut out = [0u8; TAG_LEN];
    out.copy_from_slice(tag.as_slice());
    Ok(out)
}

fn open_with<C>(key: &[u8], nonce: &[u8], tag: &[u8], buffer: &mut [u8]) -> Result<()>
where
    C: KeyInit + AeadInPlace,
{
    let cipher = C::new_from_slice(key)
        .map_err(|e| VaultError::InvalidConfiguration(e.to_string()))?;

    cipher
        .decrypt_in_place_detached(
            Nonce::<C>::from_slice(nonce),
            b"",
            buffer,
            Tag::<C>::from_slice(tag),
        )
        .map_err(|_| VaultError::AuthenticationFailure)
}
