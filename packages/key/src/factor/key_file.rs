//! Key file factor
//!
//! File contents are turned into 32 bytes of key data:
//! - exactly 32 bytes: used as-is
//! - exactly 64 hex characters: decoded
//! - anything else: SHA-256 of the whole file

use crate::secret::{sha256, KEY_LEN};
use crate::{KeyError, Result, SecretBuffer};
use keeplock_common::SecureLog;
use std::fmt;
use std::path::{Path, PathBuf};

/// Key file, remembered by location when loaded from disk
pub struct KeyFileFactor {
    path: Option<PathBuf>,
    data: SecretBuffer,
}

impl KeyFileFactor {
    /// Load and preprocess the key file at `path`
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `InvalidArgument` if it is empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = SecretBuffer::new(std::fs::read(path)?);
        let data = Self::preprocess(contents.expose())?;
        SecureLog::log_key_file_loaded(&path.to_string_lossy(), contents.len());

        Ok(Self {
            path: Some(path.to_path_buf()),
            data,
        })
    }

    /// Preprocess key file contents that are already in memory
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `contents` is empty.
    pub fn from_file_bytes(contents: &[u8]) -> Result<Self> {
        Ok(Self {
            path: None,
            data: Self::preprocess(contents)?,
        })
    }

    /// Wrap key data that was already prepared elsewhere
    #[must_use]
    pub fn from_key_data(key_data: Vec<u8>) -> Self {
        Self {
            path: None,
            data: SecretBuffer::new(key_data),
        }
    }

    /// Attach a location to a factor built from memory
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Where the key file was loaded from
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn key_data(&self) -> SecretBuffer {
        SecretBuffer::from_slice(self.data.expose())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn preprocess(contents: &[u8]) -> Result<SecretBuffer> {
        if contents.is_empty() {
            return Err(KeyError::invalid_argument("key file is empty"));
        }
        if contents.len() == KEY_LEN {
            return Ok(SecretBuffer::from_slice(contents));
        }
        if contents.len() == 2 * KEY_LEN && contents.iter().all(u8::is_ascii_hexdigit) {
            let mut decoded = SecretBuffer::new(vec![0u8; KEY_LEN]);
            if hex::decode_to_slice(contents, decoded.expose_mut()).is_ok() {
                return Ok(decoded);
            }
        }
        Ok(sha256(contents))
    }
}

impl fmt::Debug for KeyFileFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyFileFactor")
            .field("path", &self.path)
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_binary_32_byte_file_used_as_is() {
        let contents: Vec<u8> = (0u8..32).collect();
        let factor = KeyFileFactor::from_file_bytes(&contents).expect("valid");
        assert_eq!(factor.key_data().expose(), contents.as_slice());
    }

    #[test]
    fn test_hex_file_is_decoded() {
        let contents = b"000102030405060708090a0b0c0d0e0f101112131415161718191A1B1C1D1E1F";
        let factor = KeyFileFactor::from_file_bytes(contents).expect("valid");
        let expected: Vec<u8> = (0u8..32).collect();
        assert_eq!(factor.key_data().expose(), expected.as_slice());
    }

    #[test]
    fn test_other_files_are_hashed() {
        let factor = KeyFileFactor::from_file_bytes(b"abc").expect("valid");
        assert_eq!(
            factor.key_data().expose(),
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn test_64_bytes_of_non_hex_are_hashed() {
        let contents = [b'z'; 64];
        let factor = KeyFileFactor::from_file_bytes(&contents).expect("valid");
        assert_eq!(factor.key_data().expose(), sha256(&contents).expose());
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let err = KeyFileFactor::from_file_bytes(b"").expect_err("empty");
        assert!(matches!(err, KeyError::InvalidArgument(_)));
    }
}
