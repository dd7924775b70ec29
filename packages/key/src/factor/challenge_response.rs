//! Challenge-response factor
//!
//! The database's master seed is the challenge. The device's response is
//! hashed with SHA-256 to form the key data, so a new master seed (written on
//! every save) yields new key data.

use super::SeedDependent;
use crate::secret::sha256;
use crate::{KeyError, Result, SecretBuffer};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroize;

/// Something that answers a challenge: a hardware token, or [`HmacResponder`]
pub trait ChallengeResponder: Send + Sync {
    /// Name used in key configurations and logs
    fn name(&self) -> &str;

    /// Answer `challenge`
    ///
    /// # Errors
    ///
    /// Implementations report device failures as `InvalidArgument`.
    fn respond(&self, challenge: &[u8]) -> Result<SecretBuffer>;
}

/// Software responder computing HMAC-SHA256 with a stored secret
pub struct HmacResponder {
    secret: SecretBuffer,
}

impl HmacResponder {
    /// Responder for `secret`
    #[must_use]
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret: SecretBuffer::new(secret),
        }
    }
}

impl ChallengeResponder for HmacResponder {
    fn name(&self) -> &str {
        "hmac-sha256"
    }

    fn respond(&self, challenge: &[u8]) -> Result<SecretBuffer> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(self.secret.expose())
            .map_err(|e| KeyError::invalid_argument(format!("Invalid HMAC secret: {e}")))?;
        mac.update(challenge);
        let mut response = mac.finalize().into_bytes();
        let out = SecretBuffer::from_slice(&response);
        response.as_mut_slice().zeroize();
        Ok(out)
    }
}

/// Factor answered by a [`ChallengeResponder`]
pub struct ChallengeResponseFactor {
    responder: Box<dyn ChallengeResponder>,
    challenge: Option<SecretBuffer>,
}

impl ChallengeResponseFactor {
    /// Factor backed by `responder`
    #[must_use]
    pub fn new(responder: impl ChallengeResponder + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            challenge: None,
        }
    }

    /// Name of the backing responder
    #[must_use]
    pub fn responder_name(&self) -> &str {
        self.responder.name()
    }

    /// Whether seeds for the current pass are set
    #[must_use]
    pub fn has_seeds(&self) -> bool {
        self.challenge.is_some()
    }

    pub(crate) fn key_data(&self) -> Result<SecretBuffer> {
        let challenge = self.challenge.as_ref().ok_or_else(|| {
            KeyError::invalid_argument("challenge-response factor used before seeds were set")
        })?;
        if challenge.is_empty() {
            return Err(KeyError::invalid_argument(
                "challenge-response factor received an empty master seed",
            ));
        }
        let response = self.responder.respond(challenge.expose())?;
        Ok(sha256(response.expose()))
    }
}

impl SeedDependent for ChallengeResponseFactor {
    fn set_seeds(&mut self, master_seed: &[u8], _kdf_seed: &[u8]) {
        self.challenge = Some(SecretBuffer::from_slice(master_seed));
    }

    fn clear_seeds(&mut self) {
        self.challenge = None;
    }
}

impl fmt::Debug for ChallengeResponseFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChallengeResponseFactor")
            .field("responder", &self.responder.name())
            .field("seeded", &self.has_seeds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_data_requires_seeds() {
        let factor = ChallengeResponseFactor::new(HmacResponder::new(b"secret".to_vec()));
        let err = factor.key_data().expect_err("no seeds yet");
        assert!(matches!(err, KeyError::InvalidArgument(_)));
    }

    #[test]
    fn test_response_follows_master_seed() {
        let mut factor = ChallengeResponseFactor::new(HmacResponder::new(b"secret".to_vec()));

        factor.set_seeds(b"seed-one", b"kdf");
        let first = factor.key_data().expect("seeded");
        factor.set_seeds(b"seed-one", b"other kdf seed");
        let same = factor.key_data().expect("seeded");
        factor.set_seeds(b"seed-two", b"kdf");
        let second = factor.key_data().expect("seeded");

        assert_eq!(first.expose(), same.expose());
        assert_ne!(first.expose(), second.expose());
        assert_eq!(first.len(), 32);
    }

    #[test]
    fn test_clear_seeds_forgets_challenge() {
        let mut factor = ChallengeResponseFactor::new(HmacResponder::new(b"secret".to_vec()));
        factor.set_seeds(b"seed", b"kdf");
        assert!(factor.has_seeds());
        factor.clear_seeds();
        assert!(!factor.has_seeds());
        assert!(factor.key_data().is_err());
    }
}
