//! Key derivation function engines
//!
//! An engine turns the 32-byte raw composite key into the final key. Engines
//! are looked up by [`KdfUuid`] in a [`KdfRegistry`] and configured through
//! [`KdfParameters`].

pub mod aes_kdf;
pub mod argon2_kdf;
pub mod id;
pub mod parameters;
pub mod registry;

pub use aes_kdf::AesKdf;
pub use argon2_kdf::{Argon2Kdf, Argon2Variant};
pub use id::KdfUuid;
pub use parameters::{KdfParameters, ParameterError, ParameterValue};
pub use registry::KdfRegistry;

use crate::{Result, SecretBuffer};
use rand::RngCore;

/// A pluggable key derivation algorithm
///
/// Implementations must be deterministic for identical inputs and must scale
/// their cost with the parameters exactly as configured.
pub trait KdfEngine: Send + Sync {
    /// Identifier this engine answers to
    fn uuid(&self) -> KdfUuid;

    /// Human-readable name for logs and settings screens
    fn name(&self) -> &'static str;

    /// Parameters with default cost and no salt/seed
    fn default_parameters(&self) -> KdfParameters;

    /// Replace the salt/seed in `parameters` with fresh random bytes
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `parameters` belong to another engine.
    fn randomize(&self, parameters: &mut KdfParameters) -> Result<()>;

    /// Seed material this engine feeds to seed-dependent key factors
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the seed field is missing or malformed.
    fn seed(&self, parameters: &KdfParameters) -> Result<Vec<u8>>;

    /// Run the derivation over `raw`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for missing or out-of-range parameters.
    fn transform(&self, raw: &[u8], parameters: &KdfParameters) -> Result<SecretBuffer>;
}

impl std::fmt::Debug for dyn KdfEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdfEngine")
            .field("uuid", &self.uuid())
            .field("name", &self.name())
            .finish()
    }
}

/// Fresh random bytes for salts and seeds
pub(crate) fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Fail unless `parameters` select the engine `expected`
pub(crate) fn ensure_engine(parameters: &KdfParameters, expected: KdfUuid) -> Result<()> {
    let found = parameters.uuid()?;
    if found != expected {
        return Err(crate::KeyError::invalid_argument(format!(
            "parameters are for KDF {found}, not {expected}"
        )));
    }
    Ok(())
}
