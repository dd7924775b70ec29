//! Key derivation configuration
//!
//! [`KdfSettings`] is the user-facing choice of KDF and cost, with presets.
//! [`KeyConfiguration`] describes which factors a composite key is made of,
//! without any key material, so it can be persisted next to a database.

use crate::factor::{FactorKind, KeyFactor};
use crate::kdf::{AesKdf, Argon2Kdf, Argon2Variant, KdfParameters, KdfRegistry, KdfUuid};
use crate::{KeyError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// KDF algorithm and cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum KdfSettings {
    /// AES-KDF
    Aes {
        /// Encryption rounds
        rounds: u64,
    },
    /// Argon2d or Argon2id
    Argon2 {
        /// Which Argon2 flavour
        variant: Argon2Variant,
        /// Passes over memory
        iterations: u64,
        /// Memory cost in bytes, a multiple of 1024
        memory_bytes: u64,
        /// Lanes
        parallelism: u32,
    },
}

impl KdfSettings {
    /// Cheap enough for interactive unlocking on slow devices
    #[must_use]
    pub fn interactive() -> Self {
        Self::Argon2 {
            variant: Argon2Variant::Argon2id,
            iterations: Argon2Kdf::DEFAULT_ITERATIONS,
            memory_bytes: Argon2Kdf::DEFAULT_MEMORY,
            parallelism: Argon2Kdf::DEFAULT_PARALLELISM,
        }
    }

    /// Balanced security and performance
    #[must_use]
    pub fn standard() -> Self {
        Self::Argon2 {
            variant: Argon2Variant::Argon2id,
            iterations: 3,
            memory_bytes: 64 * 1024 * 1024, // 64 MiB
            parallelism: 2,
        }
    }

    /// For databases that are opened rarely
    #[must_use]
    pub fn high_security() -> Self {
        Self::Argon2 {
            variant: Argon2Variant::Argon2id,
            iterations: 10,
            memory_bytes: 256 * 1024 * 1024, // 256 MiB
            parallelism: 4,
        }
    }

    /// AES-KDF with `rounds` rounds
    #[must_use]
    pub fn aes(rounds: u64) -> Self {
        Self::Aes { rounds }
    }

    /// Identifier of the selected engine
    #[must_use]
    pub fn uuid(&self) -> KdfUuid {
        match self {
            Self::Aes { .. } => AesKdf::UUID,
            Self::Argon2 { variant, .. } => variant.uuid(),
        }
    }

    /// Parameters for these settings with a fresh random salt or seed
    ///
    /// # Errors
    ///
    /// Returns `UnknownKdf` if the engine is not in `registry`.
    pub fn to_parameters(&self, registry: &KdfRegistry) -> Result<KdfParameters> {
        let uuid = self.uuid();
        let engine = registry.lookup(&uuid).ok_or(KeyError::UnknownKdf { uuid })?;

        let mut parameters = engine.default_parameters();
        match *self {
            Self::Aes { rounds } => parameters.set_u64(AesKdf::PARAM_ROUNDS, rounds),
            Self::Argon2 {
                iterations,
                memory_bytes,
                parallelism,
                ..
            } => {
                parameters.set_u64(Argon2Kdf::PARAM_ITERATIONS, iterations);
                parameters.set_u64(Argon2Kdf::PARAM_MEMORY, memory_bytes);
                parameters.set_u32(Argon2Kdf::PARAM_PARALLELISM, parallelism);
            }
        }
        engine.randomize(&mut parameters)?;
        Ok(parameters)
    }

    /// Read settings back from stored parameters
    ///
    /// # Errors
    ///
    /// Returns `UnknownKdf` for identifiers without settings and
    /// `InvalidArgument` if a cost field is missing.
    pub fn from_parameters(parameters: &KdfParameters) -> Result<Self> {
        let uuid = parameters.uuid()?;
        let missing = |field: &str| KeyError::invalid_argument(format!("KDF parameter {field} missing"));

        if uuid == AesKdf::UUID {
            let rounds = parameters
                .get_u64(AesKdf::PARAM_ROUNDS)
                .ok_or_else(|| missing(AesKdf::PARAM_ROUNDS))?;
            return Ok(Self::Aes { rounds });
        }

        let variant = if uuid == KdfUuid::ARGON2D {
            Argon2Variant::Argon2d
        } else if uuid == KdfUuid::ARGON2ID {
            Argon2Variant::Argon2id
        } else {
            return Err(KeyError::UnknownKdf { uuid });
        };

        Ok(Self::Argon2 {
            variant,
            iterations: parameters
                .get_u64(Argon2Kdf::PARAM_ITERATIONS)
                .ok_or_else(|| missing(Argon2Kdf::PARAM_ITERATIONS))?,
            memory_bytes: parameters
                .get_u64(Argon2Kdf::PARAM_MEMORY)
                .ok_or_else(|| missing(Argon2Kdf::PARAM_MEMORY))?,
            parallelism: parameters
                .get_u32(Argon2Kdf::PARAM_PARALLELISM)
                .ok_or_else(|| missing(Argon2Kdf::PARAM_PARALLELISM))?,
        })
    }
}

impl Default for KdfSettings {
    fn default() -> Self {
        Self::standard()
    }
}

/// Non-secret description of one factor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorDescriptor {
    /// Factor kind
    pub kind: FactorKind,
    /// Key file location, for key files loaded from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
    /// Extension or responder name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FactorDescriptor {
    pub(crate) fn of(factor: &KeyFactor) -> Self {
        Self {
            kind: factor.kind(),
            key_file: factor.key_file_path().map(PathBuf::from),
            label: factor.label().map(str::to_owned),
        }
    }
}

/// Ordered factor layout of a composite key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConfiguration {
    /// Factors in registration order
    pub factors: Vec<FactorDescriptor>,
}

impl KeyConfiguration {
    /// Serialize to JSON
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if serialization fails (non UTF-8 paths).
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| KeyError::invalid_argument(format!("Failed to serialize key configuration: {e}")))
    }

    /// Parse from JSON
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| KeyError::invalid_argument(format!("Failed to parse key configuration: {e}")))
    }

    /// Kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = FactorKind> + '_ {
        self.factors.iter().map(|d| d.kind)
    }
}
