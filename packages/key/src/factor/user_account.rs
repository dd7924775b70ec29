//! Operating-system account factor

use crate::SecretBuffer;
use std::fmt;

/// Secret bound to the current OS user, supplied by the platform layer
///
/// At most one of these may be present in a composite key.
pub struct UserAccountFactor {
    data: SecretBuffer,
}

impl UserAccountFactor {
    /// Wrap the account-bound key data
    #[must_use]
    pub fn from_key_data(key_data: Vec<u8>) -> Self {
        Self {
            data: SecretBuffer::new(key_data),
        }
    }

    pub(crate) fn key_data(&self) -> SecretBuffer {
        SecretBuffer::from_slice(self.data.expose())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for UserAccountFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserAccountFactor([REDACTED])")
    }
}
