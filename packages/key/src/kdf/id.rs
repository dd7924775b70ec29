//! KDF identifiers

use crate::{KeyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 16-byte identifier selecting a KDF engine
///
/// Prints as 32 upper-case hex digits so it can go into diagnostics without
/// ever touching key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KdfUuid(Uuid);

impl KdfUuid {
    /// AES-KDF, `c9d9f39a-628a-4460-bf74-0d08c18a4fea`
    pub const AES_KDF: Self = Self::from_bytes([
        0xC9, 0xD9, 0xF3, 0x9A, 0x62, 0x8A, 0x44, 0x60, 0xBF, 0x74, 0x0D, 0x08, 0xC1, 0x8A, 0x4F,
        0xEA,
    ]);

    /// Argon2d, `ef636ddf-8c29-444b-91f7-a9a403e30a0c`
    pub const ARGON2D: Self = Self::from_bytes([
        0xEF, 0x63, 0x6D, 0xDF, 0x8C, 0x29, 0x44, 0x4B, 0x91, 0xF7, 0xA9, 0xA4, 0x03, 0xE3, 0x0A,
        0x0C,
    ]);

    /// Argon2id, `9e298b19-56db-4773-b23d-fc3ec6f0a1e6`
    pub const ARGON2ID: Self = Self::from_bytes([
        0x9E, 0x29, 0x8B, 0x19, 0x56, 0xDB, 0x47, 0x73, 0xB2, 0x3D, 0xFC, 0x3E, 0xC6, 0xF0, 0xA1,
        0xE6,
    ]);

    /// Build from raw bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Build from a slice that must be exactly 16 bytes
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Uuid::from_slice(bytes).map(Self).map_err(|_| {
            KeyError::invalid_argument(format!(
                "KDF identifier must be 16 bytes, got {}",
                bytes.len()
            ))
        })
    }

    /// Raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Upper-case hex form
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0.as_bytes())
    }

    /// Parse hex, with or without hyphens, in either case
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the text is not 32 hex digits.
    pub fn from_hex(text: &str) -> Result<Self> {
        let digits: String = text.chars().filter(|c| *c != '-').collect();
        let bytes = hex::decode(&digits)
            .map_err(|e| KeyError::invalid_argument(format!("Invalid KDF identifier: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for KdfUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for KdfUuid {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<Uuid> for KdfUuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
