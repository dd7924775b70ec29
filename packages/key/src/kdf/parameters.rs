//! KDF parameter blocks
//!
//! A parameter block is a versioned dictionary of typed values keyed by short
//! names (`$UUID`, `R`, `S`, `M`, ...). The binary form is the one stored in
//! container headers:
//!
//! ```text
//! u16 version (LE, 0x0100)
//! repeated: u8 type | i32 key_len | key (UTF-8) | i32 value_len | value
//! u8 0x00 terminator
//! ```

use super::KdfUuid;
use crate::{KeyError, Result};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Current format version
pub const FORMAT_VERSION: u16 = 0x0100;
const CRITICAL_MASK: u16 = 0xFF00;

/// Parameter key holding the engine identifier
pub const UUID_KEY: &str = "$UUID";

const TYPE_END: u8 = 0x00;
const TYPE_UINT32: u8 = 0x04;
const TYPE_UINT64: u8 = 0x05;
const TYPE_BOOL: u8 = 0x08;
const TYPE_INT32: u8 = 0x0C;
const TYPE_INT64: u8 = 0x0D;
const TYPE_STRING: u8 = 0x18;
const TYPE_BYTES: u8 = 0x42;

/// Decoding and encoding failures of the binary form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// Major version is newer than this build understands
    #[error("Unsupported parameter block version {0:#06x}")]
    UnsupportedVersion(u16),

    /// Input ended in the middle of an entry
    #[error("Parameter block truncated")]
    Truncated,

    /// Unknown value type byte
    #[error("Unknown parameter type {0:#04x}")]
    UnknownType(u8),

    /// A fixed-width value had the wrong length
    #[error("Parameter {key} has length {actual}, expected {expected}")]
    InvalidLength {
        /// Entry key
        key: String,
        /// Required length
        expected: usize,
        /// Length found
        actual: usize,
    },

    /// A length prefix was negative
    #[error("Negative length in parameter block")]
    NegativeLength,

    /// A key or string value was not UTF-8
    #[error("Parameter block contains invalid UTF-8")]
    InvalidUtf8,

    /// Bytes follow the terminator
    #[error("Trailing data after parameter block")]
    TrailingData,

    /// A key or value is too large for the length prefix
    #[error("Parameter {0} is too large to encode")]
    TooLarge(String),
}

impl From<ParameterError> for KeyError {
    fn from(err: ParameterError) -> Self {
        KeyError::invalid_argument(format!("Malformed KDF parameters: {err}"))
    }
}

/// A typed parameter value
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub enum ParameterValue {
    /// Unsigned 32-bit integer
    UInt32(u32),
    /// Unsigned 64-bit integer
    UInt64(u64),
    /// Boolean
    Bool(bool),
    /// Signed 32-bit integer
    Int32(i32),
    /// Signed 64-bit integer
    Int64(i64),
    /// UTF-8 string
    String(String),
    /// Byte array (salts, seeds, secrets)
    Bytes(Vec<u8>),
}

impl ParameterValue {
    fn type_byte(&self) -> u8 {
        match self {
            Self::UInt32(_) => TYPE_UINT32,
            Self::UInt64(_) => TYPE_UINT64,
            Self::Bool(_) => TYPE_BOOL,
            Self::Int32(_) => TYPE_INT32,
            Self::Int64(_) => TYPE_INT64,
            Self::String(_) => TYPE_STRING,
            Self::Bytes(_) => TYPE_BYTES,
        }
    }

    fn encode(&self) -> Vec<u8> {
        match self {
            Self::UInt32(v) => v.to_le_bytes().to_vec(),
            Self::UInt64(v) => v.to_le_bytes().to_vec(),
            Self::Bool(v) => vec![u8::from(*v)],
            Self::Int32(v) => v.to_le_bytes().to_vec(),
            Self::Int64(v) => v.to_le_bytes().to_vec(),
            Self::String(v) => v.as_bytes().to_vec(),
            Self::Bytes(v) => v.clone(),
        }
    }

    fn decode(type_byte: u8, key: &str, data: &[u8]) -> std::result::Result<Self, ParameterError> {
        let fixed = |expected: usize| {
            if data.len() == expected {
                Ok(())
            } else {
                Err(ParameterError::InvalidLength {
                    key: key.to_string(),
                    expected,
                    actual: data.len(),
                })
            }
        };

        match type_byte {
            TYPE_UINT32 => {
                fixed(4)?;
                Ok(Self::UInt32(u32::from_le_bytes([
                    data[0], data[1], data[2], data[3],
                ])))
            }
            TYPE_UINT64 => {
                fixed(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(data);
                Ok(Self::UInt64(u64::from_le_bytes(raw)))
            }
            TYPE_BOOL => {
                fixed(1)?;
                Ok(Self::Bool(data[0] != 0))
            }
            TYPE_INT32 => {
                fixed(4)?;
                Ok(Self::Int32(i32::from_le_bytes([
                    data[0], data[1], data[2], data[3],
                ])))
            }
            TYPE_INT64 => {
                fixed(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(data);
                Ok(Self::Int64(i64::from_le_bytes(raw)))
            }
            TYPE_STRING => std::str::from_utf8(data)
                .map(|s| Self::String(s.to_string()))
                .map_err(|_| ParameterError::InvalidUtf8),
            TYPE_BYTES => Ok(Self::Bytes(data.to_vec())),
            other => Err(ParameterError::UnknownType(other)),
        }
    }
}

impl fmt::Debug for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt32(v) => write!(f, "UInt32({v})"),
            Self::UInt64(v) => write!(f, "UInt64({v})"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int32(v) => write!(f, "Int32({v})"),
            Self::Int64(v) => write!(f, "Int64({v})"),
            Self::String(v) => write!(f, "String({v:?})"),
            // Byte values may be secrets (Argon2 `K`)
            Self::Bytes(v) => write!(f, "Bytes([{} bytes])", v.len()),
        }
    }
}

/// Versioned, name-keyed configuration of one KDF invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KdfParameters {
    entries: BTreeMap<String, ParameterValue>,
}

impl KdfParameters {
    /// Parameters selecting the engine `uuid`, with no algorithm fields yet
    #[must_use]
    pub fn new(uuid: KdfUuid) -> Self {
        let mut parameters = Self::default();
        parameters.set_bytes(UUID_KEY, uuid.as_bytes().to_vec());
        parameters
    }

    /// Engine identifier
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `$UUID` is missing or not 16 bytes.
    pub fn uuid(&self) -> Result<KdfUuid> {
        let bytes = self
            .get_bytes(UUID_KEY)
            .ok_or_else(|| KeyError::invalid_argument("KDF parameters carry no $UUID"))?;
        KdfUuid::from_slice(bytes)
    }

    /// Raw value lookup
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.entries.get(key)
    }

    /// Insert or replace a value
    pub fn set(&mut self, key: &str, value: ParameterValue) {
        self.entries.insert(key.to_string(), value);
    }

    /// Remove a value, returning whether it existed
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Whether `key` is present
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `u32` value, `None` if missing or of another type
    #[must_use]
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        match self.get(key) {
            Some(ParameterValue::UInt32(v)) => Some(*v),
            _ => None,
        }
    }

    /// `u64` value, `None` if missing or of another type
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key) {
            Some(ParameterValue::UInt64(v)) => Some(*v),
            _ => None,
        }
    }

    /// `bool` value
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(ParameterValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// `i32` value
    #[must_use]
    pub fn get_i32(&self, key: &str) -> Option<i32> {
        match self.get(key) {
            Some(ParameterValue::Int32(v)) => Some(*v),
            _ => None,
        }
    }

    /// `i64` value
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(ParameterValue::Int64(v)) => Some(*v),
            _ => None,
        }
    }

    /// String value
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(ParameterValue::String(v)) => Some(v),
            _ => None,
        }
    }

    /// Byte array value
    #[must_use]
    pub fn get_bytes(&self, key: &str) -> Option<&[u8]> {
        match self.get(key) {
            Some(ParameterValue::Bytes(v)) => Some(v),
            _ => None,
        }
    }

    /// Set a `u32`
    pub fn set_u32(&mut self, key: &str, value: u32) {
        self.set(key, ParameterValue::UInt32(value));
    }

    /// Set a `u64`
    pub fn set_u64(&mut self, key: &str, value: u64) {
        self.set(key, ParameterValue::UInt64(value));
    }

    /// Set a `bool`
    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, ParameterValue::Bool(value));
    }

    /// Set an `i32`
    pub fn set_i32(&mut self, key: &str, value: i32) {
        self.set(key, ParameterValue::Int32(value));
    }

    /// Set an `i64`
    pub fn set_i64(&mut self, key: &str, value: i64) {
        self.set(key, ParameterValue::Int64(value));
    }

    /// Set a string
    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, ParameterValue::String(value.into()));
    }

    /// Set a byte array
    pub fn set_bytes(&mut self, key: &str, value: Vec<u8>) {
        self.set(key, ParameterValue::Bytes(value));
    }

    /// Encode to the header binary form
    ///
    /// # Errors
    ///
    /// Returns `TooLarge` if a key or value exceeds `i32::MAX` bytes.
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, ParameterError> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());

        for (key, value) in &self.entries {
            let mut encoded = value.encode();
            let key_len =
                i32::try_from(key.len()).map_err(|_| ParameterError::TooLarge(key.clone()))?;
            let value_len =
                i32::try_from(encoded.len()).map_err(|_| ParameterError::TooLarge(key.clone()))?;

            out.push(value.type_byte());
            out.extend_from_slice(&key_len.to_le_bytes());
            out.extend_from_slice(key.as_bytes());
            out.extend_from_slice(&value_len.to_le_bytes());
            out.extend_from_slice(&encoded);
            encoded.zeroize();
        }

        out.push(TYPE_END);
        Ok(out)
    }

    /// Decode the header binary form
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] describing the first structural problem found.
    pub fn from_bytes(data: &[u8]) -> std::result::Result<Self, ParameterError> {
        let mut reader = Reader::new(data);

        let version = reader.u16()?;
        if (version & CRITICAL_MASK) > (FORMAT_VERSION & CRITICAL_MASK) {
            return Err(ParameterError::UnsupportedVersion(version));
        }

        let mut parameters = Self::default();
        loop {
            let type_byte = reader.u8()?;
            if type_byte == TYPE_END {
                break;
            }

            let key_len = reader.length()?;
            let key = std::str::from_utf8(reader.take(key_len)?)
                .map_err(|_| ParameterError::InvalidUtf8)?
                .to_string();
            let value_len = reader.length()?;
            let value = ParameterValue::decode(type_byte, &key, reader.take(value_len)?)?;

            parameters.entries.insert(key, value);
        }

        if !reader.is_at_end() {
            return Err(ParameterError::TrailingData);
        }
        Ok(parameters)
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> std::result::Result<&'a [u8], ParameterError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ParameterError::Truncated)?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> std::result::Result<u8, ParameterError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> std::result::Result<u16, ParameterError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn length(&mut self) -> std::result::Result<usize, ParameterError> {
        let b = self.take(4)?;
        let len = i32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        usize::try_from(len).map_err(|_| ParameterError::NegativeLength)
    }

    fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_block_layout() {
        let bytes = KdfParameters::default().to_bytes().expect("encodes");
        assert_eq!(bytes, vec![0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_single_entry_layout() {
        let mut parameters = KdfParameters::default();
        parameters.set_u64("R", 6000);

        let bytes = parameters.to_bytes().expect("encodes");
        let parts: [&[u8]; 7] = [
            &[0x00, 0x01],
            &[TYPE_UINT64],
            &1i32.to_le_bytes(),
            b"R",
            &8i32.to_le_bytes(),
            &6000u64.to_le_bytes(),
            &[TYPE_END],
        ];
        let expected = parts.concat();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_debug_hides_byte_values() {
        let mut parameters = KdfParameters::default();
        parameters.set_bytes("K", b"super secret".to_vec());
        let printed = format!("{parameters:?}");
        assert!(printed.contains("12 bytes"));
        assert!(!printed.contains("115")); // 's'
    }
}
