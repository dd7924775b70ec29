//! Master password factor

use crate::secret::sha256;
use crate::SecretBuffer;
use std::fmt;

/// Master password, kept only as its SHA-256 digest
pub struct PasswordFactor {
    hash: SecretBuffer,
}

impl PasswordFactor {
    /// Hash `password` (UTF-8) into key data
    #[must_use]
    pub fn new(password: &str) -> Self {
        Self {
            hash: sha256(password.as_bytes()),
        }
    }

    /// Wrap key data that was already prepared elsewhere
    #[must_use]
    pub fn from_key_data(key_data: Vec<u8>) -> Self {
        Self {
            hash: SecretBuffer::new(key_data),
        }
    }

    pub(crate) fn key_data(&self) -> SecretBuffer {
        SecretBuffer::from_slice(self.hash.expose())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }
}

impl fmt::Debug for PasswordFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordFactor([REDACTED])")
    }
}
