//! Key factors: independent sources of key material
//!
//! A [`KeyFactor`] is a closed set of variants, each carrying its own data.
//! Factors that need per-derivation seeds implement [`SeedDependent`]; the
//! composite key injects seeds through that trait before asking for bytes.

mod challenge_response;
mod custom;
mod key_file;
mod password;
mod user_account;

pub use challenge_response::{ChallengeResponder, ChallengeResponseFactor, HmacResponder};
pub use custom::CustomFactor;
pub use key_file::KeyFileFactor;
pub use password::PasswordFactor;
pub use user_account::UserAccountFactor;

use crate::{KeyError, Result, SecretBuffer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Factor classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    /// Master password
    Password,
    /// Key file
    KeyFile,
    /// Credential bound to the operating-system account
    UserAccount,
    /// Hardware or software challenge-response device
    ChallengeResponse,
    /// Opaque material from an extension
    Custom,
}

impl FactorKind {
    /// Whether this kind is bound to an OS identity (at most one per key)
    #[must_use]
    pub const fn is_account_bound(self) -> bool {
        matches!(self, Self::UserAccount)
    }

    /// Stable lower-case name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::KeyFile => "key_file",
            Self::UserAccount => "user_account",
            Self::ChallengeResponse => "challenge_response",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability of factors whose bytes depend on the database's seeds
///
/// `set_seeds` is called before `key_data` on every derivation pass and
/// `clear_seeds` right after, whatever the outcome.
pub trait SeedDependent {
    /// Receive the seeds of the current derivation pass
    fn set_seeds(&mut self, master_seed: &[u8], kdf_seed: &[u8]);

    /// Forget the seeds of the last pass
    fn clear_seeds(&mut self);
}

/// One registered source of key material
#[derive(Debug)]
pub enum KeyFactor {
    /// See [`PasswordFactor`]
    Password(PasswordFactor),
    /// See [`KeyFileFactor`]
    KeyFile(KeyFileFactor),
    /// See [`UserAccountFactor`]
    UserAccount(UserAccountFactor),
    /// See [`ChallengeResponseFactor`]
    ChallengeResponse(ChallengeResponseFactor),
    /// See [`CustomFactor`]
    Custom(CustomFactor),
}

impl KeyFactor {
    /// Kind of this factor
    #[must_use]
    pub fn kind(&self) -> FactorKind {
        match self {
            Self::Password(_) => FactorKind::Password,
            Self::KeyFile(_) => FactorKind::KeyFile,
            Self::UserAccount(_) => FactorKind::UserAccount,
            Self::ChallengeResponse(_) => FactorKind::ChallengeResponse,
            Self::Custom(_) => FactorKind::Custom,
        }
    }

    /// Produce this factor's key bytes for the current pass
    ///
    /// A fresh buffer is returned on every call; nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a seed-dependent factor has no seeds, or
    /// whatever its responder reports.
    pub fn key_data(&self) -> Result<SecretBuffer> {
        match self {
            Self::Password(f) => Ok(f.key_data()),
            Self::KeyFile(f) => Ok(f.key_data()),
            Self::UserAccount(f) => Ok(f.key_data()),
            Self::ChallengeResponse(f) => f.key_data(),
            Self::Custom(f) => Ok(f.key_data()),
        }
    }

    /// Seed-injection capability, if this factor has one
    pub fn seed_dependent_mut(&mut self) -> Option<&mut dyn SeedDependent> {
        match self {
            Self::ChallengeResponse(f) => Some(f),
            _ => None,
        }
    }

    /// Whether this factor needs seeds
    #[must_use]
    pub fn is_seed_dependent(&self) -> bool {
        matches!(self, Self::ChallengeResponse(_))
    }

    /// Key file location, for key-file factors loaded from disk
    #[must_use]
    pub fn key_file_path(&self) -> Option<&Path> {
        match self {
            Self::KeyFile(f) => f.path(),
            _ => None,
        }
    }

    /// Non-secret label (extension or responder name)
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::ChallengeResponse(f) => Some(f.responder_name()),
            Self::Custom(f) => Some(f.name()),
            _ => None,
        }
    }

    /// Reject factors that carry no usable material
    pub(crate) fn validate(&self) -> Result<()> {
        let empty = match self {
            Self::Password(f) => f.is_empty(),
            Self::KeyFile(f) => f.is_empty(),
            Self::UserAccount(f) => f.is_empty(),
            Self::ChallengeResponse(_) => false,
            Self::Custom(f) => f.is_empty(),
        };
        if empty {
            return Err(KeyError::invalid_argument(format!(
                "{} factor carries no key material",
                self.kind()
            )));
        }
        Ok(())
    }
}

impl From<PasswordFactor> for KeyFactor {
    fn from(factor: PasswordFactor) -> Self {
        Self::Password(factor)
    }
}

impl From<KeyFileFactor> for KeyFactor {
    fn from(factor: KeyFileFactor) -> Self {
        Self::KeyFile(factor)
    }
}

impl From<UserAccountFactor> for KeyFactor {
    fn from(factor: UserAccountFactor) -> Self {
        Self::UserAccount(factor)
    }
}

impl From<ChallengeResponseFactor> for KeyFactor {
    fn from(factor: ChallengeResponseFactor) -> Self {
        Self::ChallengeResponse(factor)
    }
}

impl From<CustomFactor> for KeyFactor {
    fn from(factor: CustomFactor) -> Self {
        Self::Custom(factor)
    }
}
