//! Zero-on-clear holder for one decrypted secret
//!
//! A [`SecureBuffer`] has three states: never set, set to the empty string,
//! and set with content. Dropping the buffer clears it, so whoever owns one
//! gets the zeroing on every exit path (early return, `?`, task
//! cancellation) without having to remember to call [`SecureBuffer::clear`].

use zeroize::{Zeroize, Zeroizing};

/// Exclusively owned, explicitly zeroable secret text
#[derive(Default)]
pub struct SecureBuffer {
    content: Option<String>,
}

impl SecureBuffer {
    /// Create a buffer holding a copy of `content`
    pub fn new(content: &str) -> Self {
        let mut buffer = Self::default();
        buffer.set_content(content);
        buffer
    }

    /// Create a buffer that has never been set
    pub fn unset() -> Self {
        Self::default()
    }

    /// Take ownership of an existing string without making another copy of it
    pub fn from_string(content: String) -> Self {
        Self {
            content: Some(content),
        }
    }

    /// Replace the content, zeroing whatever was held before
    pub fn set_content(&mut self, content: &str) {
        self.clear();

        let mut buffer = String::with_capacity(content.len());
        buffer.push_str(content);
        self.content = Some(buffer);
    }

    /// Independent copy of the content, zeroed when the caller drops it.
    ///
    /// Returns `None` if the buffer was never set or has been cleared; a
    /// buffer set to `""` yields an empty copy.
    pub fn content_copy(&self) -> Option<Zeroizing<String>> {
        self.content.as_deref().map(|content| {
            let mut copy = String::with_capacity(content.len());
            copy.push_str(content);
            Zeroizing::new(copy)
        })
    }

    /// Borrow the content (use carefully - do not copy it out)
    pub fn expose(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// True when the buffer holds a non-empty secret
    pub fn has_content(&self) -> bool {
        self.content.as_ref().is_some_and(|content| !content.is_empty())
    }

    /// True when the buffer was set, even to the empty string
    pub fn is_set(&self) -> bool {
        self.content.is_some()
    }

    /// Content length in bytes
    pub fn len(&self) -> usize {
        self.content.as_ref().map_or(0, String::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite every byte with zero, release the storage and mark the
    /// buffer as never set. Clearing twice is a no-op.
    pub fn clear(&mut self) {
        if let Some(mut content) = self.content.take() {
            content.zeroize();
        }
    }
}

impl Drop for SecureBuffer {
    fn drop(&mut self) {
        self.clear();
    }
}

impl Clone for SecureBuffer {
    fn clone(&self) -> Self {
        match self.content.as_deref() {
            Some(content) => Self::new(content),
            None => Self::unset(),
        }
    }
}

impl From<&str> for SecureBuffer {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl std::fmt::Debug for SecureBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureBuffer")
            .field("set", &self.is_set())
            .field("content", &"[REDACTED]")
            .finish()
    }
}
