//! Argon2d / Argon2id memory-hard derivation

use super::{ensure_engine, random_bytes, KdfEngine, KdfParameters, KdfUuid};
use crate::secret::KEY_LEN;
use crate::{KeyError, Result, SecretBuffer};
use argon2::{Algorithm, Argon2, AssociatedData, ParamsBuilder, Version};
use serde::{Deserialize, Serialize};

/// Which Argon2 flavour an engine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Argon2Variant {
    /// Data-dependent addressing
    Argon2d,
    /// Hybrid addressing
    Argon2id,
}

impl Argon2Variant {
    /// Identifier of the engine running this variant
    #[must_use]
    pub const fn uuid(self) -> KdfUuid {
        match self {
            Self::Argon2d => KdfUuid::ARGON2D,
            Self::Argon2id => KdfUuid::ARGON2ID,
        }
    }

    fn algorithm(self) -> Algorithm {
        match self {
            Self::Argon2d => Algorithm::Argon2d,
            Self::Argon2id => Algorithm::Argon2id,
        }
    }
}

/// Argon2 engine for one variant
#[derive(Debug, Clone, Copy)]
pub struct Argon2Kdf {
    variant: Argon2Variant,
}

impl Argon2Kdf {
    /// Salt (bytes)
    pub const PARAM_SALT: &'static str = "S";
    /// Lanes (`u32`)
    pub const PARAM_PARALLELISM: &'static str = "P";
    /// Memory in bytes (`u64`), a multiple of 1024
    pub const PARAM_MEMORY: &'static str = "M";
    /// Passes over memory (`u64`)
    pub const PARAM_ITERATIONS: &'static str = "I";
    /// Algorithm version (`u32`, 0x10 or 0x13)
    pub const PARAM_VERSION: &'static str = "V";
    /// Optional secret key (bytes)
    pub const PARAM_SECRET_KEY: &'static str = "K";
    /// Optional associated data (bytes)
    pub const PARAM_ASSOC_DATA: &'static str = "A";

    /// Default passes
    pub const DEFAULT_ITERATIONS: u64 = 2;
    /// Default memory, 1 MiB
    pub const DEFAULT_MEMORY: u64 = 1024 * 1024;
    /// Default lanes
    pub const DEFAULT_PARALLELISM: u32 = 2;
    /// Default version
    pub const DEFAULT_VERSION: u32 = 0x13;
    /// Length of a salt produced by `randomize`
    pub const SALT_LEN: usize = 32;

    /// Engine for `variant`
    #[must_use]
    pub const fn new(variant: Argon2Variant) -> Self {
        Self { variant }
    }

    /// Argon2d engine
    #[must_use]
    pub const fn argon2d() -> Self {
        Self::new(Argon2Variant::Argon2d)
    }

    /// Argon2id engine
    #[must_use]
    pub const fn argon2id() -> Self {
        Self::new(Argon2Variant::Argon2id)
    }

    /// Variant this engine runs
    #[must_use]
    pub const fn variant(&self) -> Argon2Variant {
        self.variant
    }

    fn salt(parameters: &KdfParameters) -> Result<&[u8]> {
        parameters
            .get_bytes(Self::PARAM_SALT)
            .ok_or_else(|| KeyError::invalid_argument("Argon2 salt (S) missing"))
    }

    fn version(parameters: &KdfParameters) -> Result<Version> {
        match parameters.get_u32(Self::PARAM_VERSION) {
            Some(0x10) => Ok(Version::V0x10),
            Some(0x13) => Ok(Version::V0x13),
            Some(other) => Err(KeyError::invalid_argument(format!(
                "Unsupported Argon2 version {other:#x}"
            ))),
            None => Err(KeyError::invalid_argument("Argon2 version (V) missing")),
        }
    }

    fn memory_kib(parameters: &KdfParameters) -> Result<u32> {
        let bytes = parameters
            .get_u64(Self::PARAM_MEMORY)
            .ok_or_else(|| KeyError::invalid_argument("Argon2 memory (M) missing"))?;
        if bytes % 1024 != 0 {
            return Err(KeyError::invalid_argument(format!(
                "Argon2 memory must be a multiple of 1024 bytes, got {bytes}"
            )));
        }
        u32::try_from(bytes / 1024).map_err(|_| {
            KeyError::invalid_argument(format!("Argon2 memory of {bytes} bytes is out of range"))
        })
    }

    fn iterations(parameters: &KdfParameters) -> Result<u32> {
        let iterations = parameters
            .get_u64(Self::PARAM_ITERATIONS)
            .ok_or_else(|| KeyError::invalid_argument("Argon2 iterations (I) missing"))?;
        u32::try_from(iterations).map_err(|_| {
            KeyError::invalid_argument(format!("Argon2 iterations {iterations} out of range"))
        })
    }

    fn parallelism(parameters: &KdfParameters) -> Result<u32> {
        parameters
            .get_u32(Self::PARAM_PARALLELISM)
            .ok_or_else(|| KeyError::invalid_argument("Argon2 parallelism (P) missing"))
    }
}

impl KdfEngine for Argon2Kdf {
    fn uuid(&self) -> KdfUuid {
        self.variant.uuid()
    }

    fn name(&self) -> &'static str {
        match self.variant {
            Argon2Variant::Argon2d => "Argon2d",
            Argon2Variant::Argon2id => "Argon2id",
        }
    }

    fn default_parameters(&self) -> KdfParameters {
        let mut parameters = KdfParameters::new(self.uuid());
        parameters.set_u32(Self::PARAM_VERSION, Self::DEFAULT_VERSION);
        parameters.set_u64(Self::PARAM_ITERATIONS, Self::DEFAULT_ITERATIONS);
        parameters.set_u64(Self::PARAM_MEMORY, Self::DEFAULT_MEMORY);
        parameters.set_u32(Self::PARAM_PARALLELISM, Self::DEFAULT_PARALLELISM);
        parameters
    }

    fn randomize(&self, parameters: &mut KdfParameters) -> Result<()> {
        ensure_engine(parameters, self.uuid())?;
        parameters.set_bytes(Self::PARAM_SALT, random_bytes(Self::SALT_LEN));
        Ok(())
    }

    fn seed(&self, parameters: &KdfParameters) -> Result<Vec<u8>> {
        Self::salt(parameters).map(<[u8]>::to_vec)
    }

    fn transform(&self, raw: &[u8], parameters: &KdfParameters) -> Result<SecretBuffer> {
        let salt = Self::salt(parameters)?;
        let version = Self::version(parameters)?;

        let mut builder = ParamsBuilder::new();
        builder
            .m_cost(Self::memory_kib(parameters)?)
            .t_cost(Self::iterations(parameters)?)
            .p_cost(Self::parallelism(parameters)?)
            .output_len(KEY_LEN);
        if let Some(assoc) = parameters.get_bytes(Self::PARAM_ASSOC_DATA) {
            let data = AssociatedData::new(assoc).map_err(|e| {
                KeyError::invalid_argument(format!("Invalid Argon2 associated data: {e}"))
            })?;
            builder.data(data);
        }
        let params = builder
            .build()
            .map_err(|e| KeyError::invalid_argument(format!("Invalid Argon2 parameters: {e}")))?;

        let argon2 = match parameters.get_bytes(Self::PARAM_SECRET_KEY) {
            Some(secret) => Argon2::new_with_secret(secret, self.variant.algorithm(), version, params)
                .map_err(|e| KeyError::invalid_argument(format!("Invalid Argon2 secret: {e}")))?,
            None => Argon2::new(self.variant.algorithm(), version, params),
        };

        let mut output = SecretBuffer::new(vec![0u8; KEY_LEN]);
        argon2
            .hash_password_into(raw, salt, output.expose_mut())
            .map_err(|e| KeyError::invalid_argument(format!("Argon2 derivation failed: {e}")))?;

        Ok(output)
    }
}
