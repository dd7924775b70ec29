//! Composite key: ordered key factors reduced to one derived key
//!
//! Derivation runs in fixed stages:
//! 1. validate the factor set
//! 2. resolve the KDF engine from the parameters' identifier
//! 3. inject `(master_seed, kdf_seed)` into seed-dependent factors
//! 4. concatenate factor bytes in registration order and SHA-256 them
//! 5. run the engine's transform over the 32-byte raw key
//! 6. wrap the result in a [`ProtectedKey`]
//!
//! Every intermediate lives in a [`SecretBuffer`] and is scrubbed when it goes
//! out of scope, including on error returns. A failed derivation yields nothing.

use crate::config::{FactorDescriptor, KeyConfiguration};
use crate::factor::{FactorKind, KeyFactor};
use crate::kdf::{KdfEngine, KdfParameters, KdfRegistry};
use crate::secret::{sha256, KEY_LEN};
use crate::{KeyError, ProtectedKey, Result, SecretBuffer};
use keeplock_common::SecureLog;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

static NEXT_FACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a registered factor
///
/// Removal goes by identity, never by value: two factors with the same bytes
/// are still two factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactorId(u64);

impl FactorId {
    fn next() -> Self {
        Self(NEXT_FACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What to do when an engine returns a key that is not 32 bytes long
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLengthPolicy {
    /// Fail with `DerivationInternal`
    #[default]
    Reject,
    /// SHA-256 the output to 32 bytes and log the anomaly
    Rehash,
}

#[derive(Debug)]
struct Registered {
    id: FactorId,
    factor: KeyFactor,
}

/// Ordered set of key factors for one database
///
/// Not `Clone`: a factor instance belongs to exactly one composite key.
/// Derivation takes `&mut self` (seeds are injected into factors), so the
/// borrow checker serialises mutation and derivation on one instance.
#[derive(Debug)]
pub struct CompositeKey {
    registry: Arc<KdfRegistry>,
    factors: Vec<Registered>,
    output_policy: OutputLengthPolicy,
}

impl CompositeKey {
    /// Empty key deriving through `registry`
    #[must_use]
    pub fn new(registry: Arc<KdfRegistry>) -> Self {
        Self {
            registry,
            factors: Vec::new(),
            output_policy: OutputLengthPolicy::default(),
        }
    }

    /// Choose how wrong-length engine output is handled
    #[must_use]
    pub fn with_output_policy(mut self, policy: OutputLengthPolicy) -> Self {
        self.output_policy = policy;
        self
    }

    /// Current output-length policy
    #[must_use]
    pub fn output_policy(&self) -> OutputLengthPolicy {
        self.output_policy
    }

    /// Registry this key derives through
    #[must_use]
    pub fn registry(&self) -> &Arc<KdfRegistry> {
        &self.registry
    }

    /// Append a factor
    ///
    /// Structural rules (such as the single-account rule) are checked at
    /// derivation time, not here.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the factor carries no key material.
    pub fn add_factor(&mut self, factor: impl Into<KeyFactor>) -> Result<FactorId> {
        let factor = factor.into();
        factor.validate()?;

        let id = FactorId::next();
        SecureLog::log_factor_added(factor.kind().as_str(), self.factors.len());
        self.factors.push(Registered { id, factor });
        Ok(id)
    }

    /// Remove the factor registered as `id`, returning whether it was present
    ///
    /// The removed factor is dropped and its material scrubbed. Removing an
    /// absent factor is not an error; debug builds log it as a caller mistake.
    pub fn remove_factor(&mut self, id: FactorId) -> bool {
        self.take_factor(id).is_some()
    }

    /// Remove the factor registered as `id` and hand it back
    pub fn take_factor(&mut self, id: FactorId) -> Option<KeyFactor> {
        match self.factors.iter().position(|r| r.id == id) {
            Some(index) => {
                let removed = self.factors.remove(index).factor;
                SecureLog::log_factor_removed(Some(removed.kind().as_str()), true);
                Some(removed)
            }
            None => {
                if cfg!(debug_assertions) {
                    SecureLog::log_factor_removed(None, false);
                }
                None
            }
        }
    }

    /// Whether any factor of `kind` is registered
    #[must_use]
    pub fn contains_kind(&self, kind: FactorKind) -> bool {
        self.factors.iter().any(|r| r.factor.kind() == kind)
    }

    /// First factor of `kind`
    #[must_use]
    pub fn factor(&self, kind: FactorKind) -> Option<&KeyFactor> {
        self.factors
            .iter()
            .find(|r| r.factor.kind() == kind)
            .map(|r| &r.factor)
    }

    /// Factor registered as `id`
    #[must_use]
    pub fn factor_by_id(&self, id: FactorId) -> Option<&KeyFactor> {
        self.factors.iter().find(|r| r.id == id).map(|r| &r.factor)
    }

    /// Factors in registration order
    pub fn factors(&self) -> impl Iterator<Item = (FactorId, &KeyFactor)> {
        self.factors.iter().map(|r| (r.id, &r.factor))
    }

    /// Number of registered factors
    #[must_use]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Whether no factor is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Non-secret description of the factor set, in registration order
    #[must_use]
    pub fn configuration(&self) -> KeyConfiguration {
        KeyConfiguration {
            factors: self
                .factors
                .iter()
                .map(|r| FactorDescriptor::of(&r.factor))
                .collect(),
        }
    }

    /// Derive the final 32-byte key
    ///
    /// All-or-nothing: on any failure no key material is returned and every
    /// intermediate buffer has already been scrubbed.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyConfiguration` for an empty factor set or more than one
    ///   account-bound factor (checked before the KDF lookup)
    /// - `UnknownKdf` if the parameters name an unregistered engine
    /// - `InvalidArgument` for malformed parameters or factor failures
    /// - `DerivationInternal` if the engine breaks its output contract
    pub fn derive_key(
        &mut self,
        parameters: &KdfParameters,
        master_seed: &[u8],
    ) -> Result<ProtectedKey> {
        let _span = tracing::debug_span!("derive_key", factors = self.factors.len()).entered();
        let started = Instant::now();

        self.derive(parameters, master_seed, started)
            .inspect_err(|e| SecureLog::log_derivation_failed("derive_key", &e.kind()))
    }

    /// The 32-byte raw composite key for the given seeds, before any KDF
    ///
    /// Useful to detect whether two factor sets are equivalent without paying
    /// for a transform.
    ///
    /// # Errors
    ///
    /// Same factor-set and factor errors as [`CompositeKey::derive_key`].
    pub fn compute_raw_key(&mut self, master_seed: &[u8], kdf_seed: &[u8]) -> Result<ProtectedKey> {
        self.validate()?;
        let raw = self.raw_key(master_seed, kdf_seed)?;
        ProtectedKey::from_slice(raw.expose())
    }

    fn derive(
        &mut self,
        parameters: &KdfParameters,
        master_seed: &[u8],
        started: Instant,
    ) -> Result<ProtectedKey> {
        self.validate()?;

        let uuid = parameters.uuid()?;
        let engine = self
            .registry
            .lookup(&uuid)
            .ok_or(KeyError::UnknownKdf { uuid })?;
        SecureLog::log_derivation_started(engine.name(), &uuid.to_hex(), self.factors.len());

        let kdf_seed = engine.seed(parameters)?;
        let raw = self.raw_key(master_seed, &kdf_seed)?;

        let transformed = {
            let _span = tracing::debug_span!("transform", kdf = engine.name()).entered();
            engine.transform(raw.expose(), parameters)?
        };
        let key = self.finish(transformed, engine.as_ref())?;

        SecureLog::log_derivation_completed(engine.name(), started.elapsed());
        Ok(key)
    }

    fn validate(&self) -> Result<()> {
        if self.factors.is_empty() {
            return Err(KeyError::invalid_configuration(
                "composite key has no factors",
            ));
        }

        let accounts = self
            .factors
            .iter()
            .filter(|r| r.factor.kind().is_account_bound())
            .count();
        if accounts >= 2 {
            return Err(KeyError::invalid_configuration(format!(
                "{accounts} account-bound factors registered, at most one is allowed"
            )));
        }
        Ok(())
    }

    /// Seeds go in, raw key comes out, seeds are forgotten on every path
    fn raw_key(&mut self, master_seed: &[u8], kdf_seed: &[u8]) -> Result<SecretBuffer> {
        for registered in &mut self.factors {
            if let Some(seeded) = registered.factor.seed_dependent_mut() {
                seeded.set_seeds(master_seed, kdf_seed);
            }
        }

        let raw = self.assemble();

        for registered in &mut self.factors {
            if let Some(seeded) = registered.factor.seed_dependent_mut() {
                seeded.clear_seeds();
            }
        }
        raw
    }

    fn assemble(&self) -> Result<SecretBuffer> {
        let _span = tracing::trace_span!("assemble").entered();

        let mut parts = Vec::with_capacity(self.factors.len());
        for registered in &self.factors {
            let data = registered.factor.key_data()?;
            if data.is_empty() {
                return Err(KeyError::invalid_argument(format!(
                    "{} factor produced no key material",
                    registered.factor.kind()
                )));
            }
            parts.push(data);
        }

        let total = parts.iter().map(SecretBuffer::len).sum();
        let mut all = SecretBuffer::with_capacity(total);
        for part in &parts {
            all.append(part.expose())?;
        }

        Ok(sha256(all.expose()))
    }

    fn finish(&self, transformed: SecretBuffer, engine: &dyn KdfEngine) -> Result<ProtectedKey> {
        if transformed.len() == KEY_LEN {
            return ProtectedKey::from_slice(transformed.expose());
        }
        if transformed.is_empty() {
            return Err(KeyError::internal(format!(
                "{} returned no output",
                engine.name()
            )));
        }

        let detail = format!(
            "{} returned {} bytes, expected {KEY_LEN}",
            engine.name(),
            transformed.len()
        );
        match self.output_policy {
            OutputLengthPolicy::Reject => Err(KeyError::internal(detail)),
            OutputLengthPolicy::Rehash => {
                SecureLog::log_anomaly("kdf transform", &detail);
                tracing::warn!(kdf = engine.name(), len = transformed.len(), "re-hashing KDF output");
                let rehashed = sha256(transformed.expose());
                ProtectedKey::from_slice(rehashed.expose())
            }
        }
    }
}
