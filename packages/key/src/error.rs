//! Error handling for key derivation

use crate::kdf::KdfUuid;
use std::fmt;
use thiserror::Error;

/// Key derivation errors
///
/// None of these are retried automatically: running a KDF again with the same
/// inputs fails the same way.
#[derive(Debug, Error)]
pub enum KeyError {
    /// A factor or parameter block was missing, empty or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The factor set violates a structural rule and must be reconfigured
    #[error("Invalid key configuration: {0}")]
    InvalidKeyConfiguration(String),

    /// The KDF identifier is not registered, usually a newer file format
    #[error("Unknown key derivation function: {uuid}")]
    UnknownKdf {
        /// Identifier found in the parameter block
        uuid: KdfUuid,
    },

    /// An engine broke its output contract
    #[error("Key derivation internal error: {0}")]
    DerivationInternal(String),

    /// Reading key material from disk failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fieldless error classification for callers that map errors to messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`KeyError::InvalidArgument`]
    InvalidArgument,
    /// See [`KeyError::InvalidKeyConfiguration`]
    InvalidKeyConfiguration,
    /// See [`KeyError::UnknownKdf`]
    UnknownKdf,
    /// See [`KeyError::DerivationInternal`]
    DerivationInternal,
    /// See [`KeyError::Io`]
    Io,
}

impl KeyError {
    /// Create an `InvalidArgument` error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an `InvalidKeyConfiguration` error
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidKeyConfiguration(msg.into())
    }

    /// Create a `DerivationInternal` error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::DerivationInternal(msg.into())
    }

    /// Structured kind of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::InvalidKeyConfiguration(_) => ErrorKind::InvalidKeyConfiguration,
            Self::UnknownKdf { .. } => ErrorKind::UnknownKdf,
            Self::DerivationInternal(_) => ErrorKind::DerivationInternal,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidArgument => "InvalidArgument",
            Self::InvalidKeyConfiguration => "InvalidKeyConfiguration",
            Self::UnknownKdf => "UnknownKdf",
            Self::DerivationInternal => "DerivationInternal",
            Self::Io => "Io",
        };
        f.write_str(name)
    }
}

/// Result type for key operations
pub type Result<T> = std::result::Result<T, KeyError>;
