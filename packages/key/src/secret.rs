//! Zeroizing containers for key material
//!
//! [`SecretBuffer`] holds every transient buffer of a derivation pass and
//! [`ProtectedKey`] is the only type a finished key ever leaves the crate in.
//! Both scrub their memory on drop, on every return path.

use crate::{KeyError, Result};
use std::fmt;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

/// Length of a raw composite key and of a final derived key
pub const KEY_LEN: usize = 32;

/// Heap buffer for transient key material, scrubbed on drop
///
/// Never `Clone` and never printed. The buffer does not grow past the
/// capacity it was created with, so no stale copy is stranded by a
/// reallocation.
pub struct SecretBuffer {
    bytes: Zeroizing<Vec<u8>>,
    #[cfg(test)]
    _audit: audit::Tracked,
}

impl SecretBuffer {
    /// Take ownership of `bytes`
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
            #[cfg(test)]
            _audit: audit::Tracked::new(),
        }
    }

    /// Copy `bytes` into a fresh buffer
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut buffer = Self::with_capacity(bytes.len());
        buffer.bytes.extend_from_slice(bytes);
        buffer
    }

    /// Empty buffer that can take exactly `capacity` bytes
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(Vec::with_capacity(capacity))
    }

    /// Append `data` without reallocating
    ///
    /// # Errors
    ///
    /// Returns `DerivationInternal` if `data` does not fit in the remaining capacity.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        let remaining = self.bytes.capacity() - self.bytes.len();
        if data.len() > remaining {
            return Err(KeyError::internal(format!(
                "secret buffer overflow: {} bytes into {remaining} remaining",
                data.len()
            )));
        }
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    /// Read access to the contents
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn expose_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Number of bytes held
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer holds no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// SHA-256 of `data` into a secret buffer; the stack copy of the digest is scrubbed
pub(crate) fn sha256(data: &[u8]) -> SecretBuffer {
    let mut digest = Sha256::digest(data);
    let out = SecretBuffer::from_slice(&digest);
    digest.as_mut_slice().zeroize();
    out
}

impl From<Vec<u8>> for SecretBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuffer([REDACTED; {}])", self.bytes.len())
    }
}

/// A finished 32-byte key
///
/// The bytes are reachable only through [`ProtectedKey::expose`]; there is no
/// `Display`, no serde support and `Debug` is redacted. Equality is constant-time.
pub struct ProtectedKey {
    inner: SecretBuffer,
}

impl ProtectedKey {
    /// Copy exactly [`KEY_LEN`] bytes into a protected key
    ///
    /// # Errors
    ///
    /// Returns `DerivationInternal` if `bytes` is not [`KEY_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(KeyError::internal(format!(
                "protected key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self {
            inner: SecretBuffer::from_slice(bytes),
        })
    }

    /// Explicit read access to the key bytes
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose()
    }

    /// Always [`KEY_LEN`]
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl ConstantTimeEq for ProtectedKey {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.expose().ct_eq(other.expose())
    }
}

impl PartialEq for ProtectedKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for ProtectedKey {}

impl fmt::Debug for ProtectedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProtectedKey([REDACTED])")
    }
}
