//! Extension-provided factor

use crate::SecretBuffer;
use std::fmt;

/// Opaque key material contributed by an extension (OTP secret, plugin key, ...)
pub struct CustomFactor {
    name: String,
    data: SecretBuffer,
}

impl CustomFactor {
    /// Named factor with the given key data
    #[must_use]
    pub fn new(name: impl Into<String>, key_data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data: SecretBuffer::new(key_data),
        }
    }

    /// Extension name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn key_data(&self) -> SecretBuffer {
        SecretBuffer::from_slice(self.data.expose())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for CustomFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFactor")
            .field("name", &self.name)
            .field("data", &self.data)
            .finish()
    }
}
