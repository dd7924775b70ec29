//! AES-KDF: iterated AES-256 encryption of the raw key
//!
//! Each 16-byte half of the raw key is encrypted `R` times with AES-256 keyed
//! by the 32-byte seed `S`, then the result is hashed with SHA-256.

use super::{ensure_engine, random_bytes, KdfEngine, KdfParameters, KdfUuid};
use crate::secret::{sha256, KEY_LEN};
use crate::{KeyError, Result, SecretBuffer};
use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes256;

/// AES-KDF engine
#[derive(Debug, Clone, Copy, Default)]
pub struct AesKdf;

impl AesKdf {
    /// Engine identifier
    pub const UUID: KdfUuid = KdfUuid::AES_KDF;
    /// Number of encryption rounds (`u64`)
    pub const PARAM_ROUNDS: &'static str = "R";
    /// AES key used for every round (32 bytes)
    pub const PARAM_SEED: &'static str = "S";
    /// Default round count
    pub const DEFAULT_ROUNDS: u64 = 60_000;
    /// Required seed length
    pub const SEED_LEN: usize = 32;

    /// Create the engine
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn seed_bytes(parameters: &KdfParameters) -> Result<&[u8]> {
        let seed = parameters
            .get_bytes(Self::PARAM_SEED)
            .ok_or_else(|| KeyError::invalid_argument("AES-KDF seed (S) missing"))?;
        if seed.len() != Self::SEED_LEN {
            return Err(KeyError::invalid_argument(format!(
                "AES-KDF seed must be {} bytes, got {}",
                Self::SEED_LEN,
                seed.len()
            )));
        }
        Ok(seed)
    }
}

impl KdfEngine for AesKdf {
    fn uuid(&self) -> KdfUuid {
        Self::UUID
    }

    fn name(&self) -> &'static str {
        "AES-KDF"
    }

    fn default_parameters(&self) -> KdfParameters {
        let mut parameters = KdfParameters::new(Self::UUID);
        parameters.set_u64(Self::PARAM_ROUNDS, Self::DEFAULT_ROUNDS);
        parameters
    }

    fn randomize(&self, parameters: &mut KdfParameters) -> Result<()> {
        ensure_engine(parameters, Self::UUID)?;
        parameters.set_bytes(Self::PARAM_SEED, random_bytes(Self::SEED_LEN));
        Ok(())
    }

    fn seed(&self, parameters: &KdfParameters) -> Result<Vec<u8>> {
        Self::seed_bytes(parameters).map(<[u8]>::to_vec)
    }

    fn transform(&self, raw: &[u8], parameters: &KdfParameters) -> Result<SecretBuffer> {
        if raw.len() != KEY_LEN {
            return Err(KeyError::invalid_argument(format!(
                "AES-KDF input must be {KEY_LEN} bytes, got {}",
                raw.len()
            )));
        }
        let rounds = parameters
            .get_u64(Self::PARAM_ROUNDS)
            .ok_or_else(|| KeyError::invalid_argument("AES-KDF rounds (R) missing"))?;
        let seed = Self::seed_bytes(parameters)?;

        let cipher = Aes256::new_from_slice(seed)
            .map_err(|_| KeyError::invalid_argument("AES-KDF seed has an invalid length"))?;

        let mut state = SecretBuffer::from_slice(raw);
        {
            let (left, right) = state.expose_mut().split_at_mut(16);
            let left = GenericArray::from_mut_slice(left);
            let right = GenericArray::from_mut_slice(right);
            for _ in 0..rounds {
                cipher.encrypt_block(left);
                cipher.encrypt_block(right);
            }
        }

        Ok(sha256(state.expose()))
    }
}
