//! # Keeplock Key
//!
//! Composite master-key derivation for password database containers.
//!
//! ## Features
//!
//! - **Key Factors**: password, key file, account credential, challenge-response and custom factors
//! - **KDF Engines**: AES-KDF, Argon2d and Argon2id behind a pluggable registry
//! - **Protected Keys**: every intermediate buffer is scrubbed on drop, on every path
//! - **Async**: derivation can be moved to tokio's blocking pool
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keeplock_key::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let registry = KdfRegistry::with_builtin().into_shared();
//! let mut key = CompositeKey::new(registry.clone());
//! key.add_factor(PasswordFactor::new("correct horse battery staple"))?;
//! key.add_factor(KeyFileFactor::open("vault.keyx")?)?;
//!
//! let parameters = KdfSettings::standard().to_parameters(&registry)?;
//! let master_seed = [7u8; 32];
//! let derived = key.derive_key(&parameters, &master_seed)?;
//! assert_eq!(derived.len(), 32);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod background;
pub mod composite;
pub mod config;
pub mod error;
pub mod factor;
pub mod gateway;
pub mod kdf;
pub mod secret;

// Re-export core types
pub use error::{ErrorKind, KeyError, Result};
pub use secret::{ProtectedKey, SecretBuffer, KEY_LEN};

pub use background::DerivationOutcome;
pub use composite::{CompositeKey, FactorId, OutputLengthPolicy};
pub use config::{FactorDescriptor, KdfSettings, KeyConfiguration};
pub use factor::{
    ChallengeResponder, ChallengeResponseFactor, CustomFactor, FactorKind, HmacResponder,
    KeyFactor, KeyFileFactor, PasswordFactor, SeedDependent, UserAccountFactor,
};
pub use gateway::{ContainerError, ContainerFormat, KdfHeader, NullStatus, StatusSink};
pub use kdf::{
    AesKdf, Argon2Kdf, Argon2Variant, KdfEngine, KdfParameters, KdfRegistry, KdfUuid,
    ParameterError, ParameterValue,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CompositeKey, FactorKind, KdfEngine, KdfParameters, KdfRegistry, KdfSettings, KeyError,
        KeyFactor, KeyFileFactor, OutputLengthPolicy, PasswordFactor, ProtectedKey, Result,
        UserAccountFactor,
    };
}
