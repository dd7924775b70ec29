//! Boundary to the encrypted container format
//!
//! A container format owns its byte layout. This module only fixes the
//! contract: the format hands over the KDF header before the body is touched,
//! the composite key derives from it, and the format decrypts or encrypts the
//! body with the result.
//!
//! Unknown KDFs and corrupt headers surface as their own [`ContainerError`]
//! variants so callers can tell "made by a newer version" and "damaged file"
//! apart from a failed derivation.

use crate::composite::CompositeKey;
use crate::config::KdfSettings;
use crate::kdf::{random_bytes, KdfParameters, KdfRegistry, KdfUuid, ParameterError};
use crate::{KeyError, ProtectedKey};
use std::io::{Read, Write};
use thiserror::Error;

/// Progress and status reporting during load and save
pub trait StatusSink {
    /// Replace the status text
    fn set_text(&mut self, text: &str);

    /// Report progress in percent
    fn set_progress(&mut self, percent: u8);

    /// `false` asks the operation to stop at the next checkpoint
    fn should_continue(&self) -> bool {
        true
    }
}

/// Status sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn set_text(&mut self, _text: &str) {}

    fn set_progress(&mut self, _percent: u8) {}
}

/// Container-level failures
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The header names a KDF this build does not know
    #[error("Unsupported key derivation function {uuid}; the file was probably created by a newer version")]
    UnknownKdf {
        /// Identifier found in the header
        uuid: KdfUuid,
    },

    /// The header could not be parsed
    #[error("Corrupt container header: {0}")]
    CorruptHeader(String),

    /// Key derivation failed
    #[error(transparent)]
    Derivation(KeyError),

    /// The body was rejected by the format, usually a wrong key
    #[error("Container format error: {0}")]
    Format(String),

    /// The status sink asked to stop
    #[error("Operation cancelled")]
    Cancelled,

    /// Stream failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<KeyError> for ContainerError {
    fn from(error: KeyError) -> Self {
        match error {
            KeyError::UnknownKdf { uuid } => Self::UnknownKdf { uuid },
            KeyError::Io(e) => Self::Io(e),
            other => Self::Derivation(other),
        }
    }
}

impl From<ParameterError> for ContainerError {
    fn from(error: ParameterError) -> Self {
        Self::CorruptHeader(error.to_string())
    }
}

/// Key derivation inputs stored in a container header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfHeader {
    /// Per-save random seed
    pub master_seed: Vec<u8>,
    /// Parameters of the KDF that protects the body
    pub kdf_parameters: KdfParameters,
}

impl KdfHeader {
    /// Length of generated master seeds
    pub const MASTER_SEED_LEN: usize = 32;

    /// Fresh header for `settings`, with new seeds
    ///
    /// # Errors
    ///
    /// Returns `UnknownKdf` if `registry` lacks the chosen engine.
    pub fn generate(settings: &KdfSettings, registry: &KdfRegistry) -> crate::Result<Self> {
        Ok(Self {
            master_seed: random_bytes(Self::MASTER_SEED_LEN),
            kdf_parameters: settings.to_parameters(registry)?,
        })
    }

    /// Same KDF and cost as `parameters`, with new seeds
    ///
    /// Every save must go through this so no two saves share a master seed or salt.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKdf` if `registry` lacks the engine.
    pub fn regenerate(parameters: &KdfParameters, registry: &KdfRegistry) -> crate::Result<Self> {
        let uuid = parameters.uuid()?;
        let engine = registry.lookup(&uuid).ok_or(KeyError::UnknownKdf { uuid })?;

        let mut kdf_parameters = parameters.clone();
        engine.randomize(&mut kdf_parameters)?;
        Ok(Self {
            master_seed: random_bytes(Self::MASTER_SEED_LEN),
            kdf_parameters,
        })
    }

    /// Rebuild a header from its stored parts
    ///
    /// # Errors
    ///
    /// Returns `CorruptHeader` if the parameter block does not parse, carries
    /// no KDF identifier, or the master seed is empty.
    pub fn decode(master_seed: Vec<u8>, parameter_block: &[u8]) -> Result<Self, ContainerError> {
        if master_seed.is_empty() {
            return Err(ContainerError::CorruptHeader("empty master seed".into()));
        }
        let kdf_parameters = KdfParameters::from_bytes(parameter_block)?;
        kdf_parameters
            .uuid()
            .map_err(|e| ContainerError::CorruptHeader(e.to_string()))?;
        Ok(Self {
            master_seed,
            kdf_parameters,
        })
    }

    /// Binary parameter block for writing into a header
    ///
    /// # Errors
    ///
    /// Returns `CorruptHeader` if an entry is too large to encode.
    pub fn encode_parameters(&self) -> Result<Vec<u8>, ContainerError> {
        Ok(self.kdf_parameters.to_bytes()?)
    }
}

/// A container format that decrypts and encrypts with a derived key
pub trait ContainerFormat {
    /// Read the header, leaving `input` positioned at the body
    ///
    /// # Errors
    ///
    /// Returns `CorruptHeader` for unparseable headers.
    fn read_header(&mut self, input: &mut dyn Read) -> Result<KdfHeader, ContainerError>;

    /// Decrypt the body with `key`
    ///
    /// # Errors
    ///
    /// Returns `Format` if the key is wrong or the body is damaged.
    fn load(
        &mut self,
        input: &mut dyn Read,
        key: &ProtectedKey,
        header: &KdfHeader,
        status: &mut dyn StatusSink,
    ) -> Result<(), ContainerError>;

    /// Write `header` and the body encrypted with `key`
    ///
    /// # Errors
    ///
    /// Returns `Io` for stream failures.
    fn save(
        &mut self,
        output: &mut dyn Write,
        key: &ProtectedKey,
        header: &KdfHeader,
        status: &mut dyn StatusSink,
    ) -> Result<(), ContainerError>;
}

/// Derive the body key for `header`, reporting status
///
/// Cancellation is honoured before the transform starts; once running, a
/// transform always completes.
///
/// # Errors
///
/// `CorruptHeader` if the parameters carry no identifier, `UnknownKdf`,
/// `Cancelled`, or `Derivation` for everything else.
pub fn derive_for_header(
    key: &mut CompositeKey,
    header: &KdfHeader,
    status: &mut dyn StatusSink,
) -> Result<ProtectedKey, ContainerError> {
    let uuid = header
        .kdf_parameters
        .uuid()
        .map_err(|e| ContainerError::CorruptHeader(e.to_string()))?;
    if !key.registry().contains(&uuid) {
        return Err(ContainerError::UnknownKdf { uuid });
    }

    status.set_text("Transforming key");
    status.set_progress(0);
    if !status.should_continue() {
        return Err(ContainerError::Cancelled);
    }

    let derived = key.derive_key(&header.kdf_parameters, &header.master_seed)?;
    status.set_progress(100);
    Ok(derived)
}

/// Read a container: header, derivation, body
///
/// # Errors
///
/// See [`derive_for_header`] and the format's own errors.
pub fn open_container<F: ContainerFormat + ?Sized>(
    format: &mut F,
    input: &mut dyn Read,
    key: &mut CompositeKey,
    status: &mut dyn StatusSink,
) -> Result<KdfHeader, ContainerError> {
    let header = format.read_header(input)?;
    let derived = derive_for_header(key, &header, status)?;
    status.set_text("Decrypting");
    format.load(input, &derived, &header, status)?;
    Ok(header)
}

/// Write a container under fresh seeds, keeping the KDF and cost of `parameters`
///
/// Returns the header that was written.
///
/// # Errors
///
/// See [`derive_for_header`] and the format's own errors.
pub fn save_container<F: ContainerFormat + ?Sized>(
    format: &mut F,
    output: &mut dyn Write,
    key: &mut CompositeKey,
    parameters: &KdfParameters,
    status: &mut dyn StatusSink,
) -> Result<KdfHeader, ContainerError> {
    let header = KdfHeader::regenerate(parameters, key.registry())?;
    let derived = derive_for_header(key, &header, status)?;
    status.set_text("Encrypting");
    format.save(output, &derived, &header, status)?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::PasswordFactor;

    struct Refusing;

    impl StatusSink for Refusing {
        fn set_text(&mut self, _text: &str) {}
        fn set_progress(&mut self, _percent: u8) {}
        fn should_continue(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_unknown_kdf_is_not_a_derivation_failure() {
        let err = ContainerError::from(KeyError::UnknownKdf {
            uuid: KdfUuid::from_bytes([1; 16]),
        });
        assert!(matches!(err, ContainerError::UnknownKdf { .. }));

        let err = ContainerError::from(KeyError::internal("x"));
        assert!(matches!(err, ContainerError::Derivation(_)));
    }

    #[test]
    fn test_cancel_before_transform() {
        let registry = KdfRegistry::with_builtin().into_shared();
        let mut key = CompositeKey::new(registry.clone());
        key.add_factor(PasswordFactor::new("pw")).expect("add");

        let header = KdfHeader::generate(&KdfSettings::aes(1), &registry).expect("header");
        let err = derive_for_header(&mut key, &header, &mut Refusing).expect_err("cancelled");
        assert!(matches!(err, ContainerError::Cancelled));
    }

    #[test]
    fn test_regenerate_keeps_cost_and_changes_seeds() {
        let registry = KdfRegistry::with_builtin();
        let first = KdfHeader::generate(&KdfSettings::aes(1234), &registry).expect("header");
        let second = KdfHeader::regenerate(&first.kdf_parameters, &registry).expect("header");

        assert_ne!(first.master_seed, second.master_seed);
        assert_ne!(first.kdf_parameters, second.kdf_parameters);
        assert_eq!(
            KdfSettings::from_parameters(&second.kdf_parameters).expect("settings"),
            KdfSettings::aes(1234)
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = KdfHeader::decode(vec![1; 32], &[0x00, 0x05]).expect_err("bad version");
        assert!(matches!(err, ContainerError::CorruptHeader(_)));

        let block = KdfParameters::default().to_bytes().expect("encode");
        let err = KdfHeader::decode(vec![1; 32], &block).expect_err("no $UUID");
        assert!(matches!(err, ContainerError::CorruptHeader(_)));
    }
}
