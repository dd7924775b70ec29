//! Off-thread derivation for async callers
//!
//! KDF transforms are deliberately slow, so async code hands the whole
//! composite key to tokio's blocking pool and gets it back with the result.

use crate::composite::CompositeKey;
use crate::kdf::KdfParameters;
use crate::{KeyError, ProtectedKey, Result};

/// A composite key returned from the blocking pool, with its derivation result
#[derive(Debug)]
pub struct DerivationOutcome {
    /// The key that was moved into the blocking task
    pub key: CompositeKey,
    /// What `derive_key` returned
    pub result: Result<ProtectedKey>,
}

impl CompositeKey {
    /// Run [`CompositeKey::derive_key`] on tokio's blocking pool
    ///
    /// Dropping the returned future abandons the result; the transform still
    /// runs to completion and its buffers are scrubbed as usual.
    ///
    /// # Errors
    ///
    /// Returns `DerivationInternal` if the blocking task panicked or was
    /// cancelled; the composite key is lost with it.
    pub async fn derive_key_in_background(
        self,
        parameters: KdfParameters,
        master_seed: Vec<u8>,
    ) -> Result<DerivationOutcome> {
        let mut key = self;
        tokio::task::spawn_blocking(move || {
            let master_seed = zeroize::Zeroizing::new(master_seed);
            let result = key.derive_key(&parameters, &master_seed);
            DerivationOutcome { key, result }
        })
        .await
        .map_err(|e| KeyError::internal(format!("Derivation task join error: {e}")))
    }
}
