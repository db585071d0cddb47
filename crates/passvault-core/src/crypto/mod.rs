//! Cryptographic primitives for secrets at rest
//!
//! This module provides:
//! - AES-GCM authenticated envelopes (128, 192 and 256-bit keys)
//! - Key material that is zeroized on drop
//! - Secure buffers that hold one decrypted secret and zero it on clear

mod envelope;
mod keys;
mod secure_buffer;

pub use envelope::{Envelope, ENVELOPE_OVERHEAD, NONCE_LEN, TAG_LEN};
pub use keys::{EncryptionKey, KeySize};
pub use secure_buffer::SecureBuffer;
