//! KDF engine registry
//!
//! Built once at startup, then shared read-only (usually behind an `Arc`)
//! by every composite key that derives with it.

use super::{AesKdf, Argon2Kdf, KdfEngine, KdfUuid};
use crate::{KeyError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Map from KDF identifier to engine
#[derive(Clone, Default)]
pub struct KdfRegistry {
    engines: HashMap<KdfUuid, Arc<dyn KdfEngine>>,
}

impl KdfRegistry {
    /// Registry with no engines
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with AES-KDF, Argon2d and Argon2id
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        let builtin: [Arc<dyn KdfEngine>; 3] = [
            Arc::new(AesKdf::new()),
            Arc::new(Argon2Kdf::argon2d()),
            Arc::new(Argon2Kdf::argon2id()),
        ];
        for engine in builtin {
            registry.engines.insert(engine.uuid(), engine);
        }
        registry
    }

    /// Register `engine` under `id`, returning the engine it replaced
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `id` is not the engine's own identifier.
    pub fn register(
        &mut self,
        id: KdfUuid,
        engine: Arc<dyn KdfEngine>,
    ) -> Result<Option<Arc<dyn KdfEngine>>> {
        if engine.uuid() != id {
            return Err(KeyError::invalid_argument(format!(
                "engine {} identifies as {}, cannot register it as {id}",
                engine.name(),
                engine.uuid()
            )));
        }
        let replaced = self.engines.insert(id, engine);
        if let Some(previous) = &replaced {
            tracing::debug!(kdf = %id, previous = previous.name(), "replaced KDF engine");
        }
        Ok(replaced)
    }

    /// Engine registered under `id`
    #[must_use]
    pub fn lookup(&self, id: &KdfUuid) -> Option<Arc<dyn KdfEngine>> {
        self.engines.get(id).cloned()
    }

    /// Whether an engine is registered under `id`
    #[must_use]
    pub fn contains(&self, id: &KdfUuid) -> bool {
        self.engines.contains_key(id)
    }

    /// Registered identifiers
    pub fn ids(&self) -> impl Iterator<Item = &KdfUuid> {
        self.engines.keys()
    }

    /// Number of registered engines
    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Whether no engine is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Freeze for sharing
    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl fmt::Debug for KdfRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.engines.values().map(|e| e.name()).collect();
        names.sort_unstable();
        f.debug_struct("KdfRegistry").field("engines", &names).finish()
    }
}
