//! Structured logging that never carries key material
//!
//! Provides env_logger-based logging for the derivation engine. Everything that
//! might identify a secret (key file paths, account names) is reduced to a
//! short SHA-256 fingerprint before it reaches a log line.

use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::sync::Once;
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

/// Secret-safe logging facade
pub struct SecureLog;

impl SecureLog {
    /// Initialize logging system (should be called once at application startup)
    ///
    /// Configure levels via `RUST_LOG`, e.g. `RUST_LOG=keeplock_key=debug`.
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            env_logger::Builder::from_default_env()
                .format_timestamp_micros()
                .init();

            info!("Structured logging initialized");
        });
    }

    /// Initialize logging for test environments
    ///
    /// Safe to call from every test; repeated initialisation is ignored.
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }

    /// A derivation pass is about to run
    pub fn log_derivation_started(kdf_name: &str, kdf_id: &str, factor_count: usize) {
        info!("Key derivation started: {kdf_name} (kdf: {kdf_id}, factors: {factor_count})");
    }

    /// A derivation pass produced a key
    pub fn log_derivation_completed(kdf_name: &str, elapsed: Duration) {
        info!(
            "Key derivation completed: {kdf_name} in {}ms",
            elapsed.as_millis()
        );
    }

    /// A derivation pass aborted
    ///
    /// `kind` should be a structured error kind, not a formatted message.
    pub fn log_derivation_failed(stage: &str, kind: &dyn Display) {
        warn!("Key derivation failed at {stage} (kind: {kind})");
    }

    /// A factor was appended to a composite key
    pub fn log_factor_added(kind: &str, position: usize) {
        debug!("Key factor added: {kind} at position {position}");
    }

    /// A factor removal was requested
    pub fn log_factor_removed(kind: Option<&str>, removed: bool) {
        match (kind, removed) {
            (Some(kind), true) => debug!("Key factor removed: {kind}"),
            _ => warn!("Key factor removal requested for a factor that is not registered"),
        }
    }

    /// A key file was loaded; only a fingerprint of its location is logged
    pub fn log_key_file_loaded(location: &str, len: usize) {
        let location_hash = Self::fingerprint(location.as_bytes());
        debug!("Key file loaded (location_hash: {location_hash}, len: {len})");
    }

    /// An invariant was violated but the operation continued under a fallback
    pub fn log_anomaly(component: &str, detail: &str) {
        warn!("Anomaly in {component}: {detail}");
    }

    /// Short SHA-256 fingerprint for logging
    ///
    /// Returns `#` followed by the first 12 hex characters of the digest.
    #[must_use]
    pub fn fingerprint(data: &[u8]) -> String {
        let hash = Sha256::digest(data);
        let hex_hash = hex::encode(hash);
        format!("#{}", &hex_hash[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        SecureLog::init_test();

        let a = SecureLog::fingerprint(b"/home/user/db.keyx");
        let b = SecureLog::fingerprint(b"/home/user/other.keyx");

        assert_ne!(a, b);
        assert_eq!(a, SecureLog::fingerprint(b"/home/user/db.keyx"));
        assert!(a.starts_with('#'));
        assert_eq!(a.len(), 13);
    }

    #[test]
    fn test_fingerprint_known_value() {
        // SHA-256("abc") = ba7816bf8f01cfea...
        assert_eq!(SecureLog::fingerprint(b"abc"), "#ba7816bf8f01");
    }

    #[test]
    fn test_logging_operations() {
        SecureLog::init_test();

        SecureLog::log_derivation_started("AES-KDF", "C9D9F39A628A4460BF740D08C18A4FEA", 2);
        SecureLog::log_derivation_completed("AES-KDF", Duration::from_millis(12));
        SecureLog::log_derivation_failed("resolve", &"UnknownKdf");
        SecureLog::log_factor_added("password", 0);
        SecureLog::log_factor_removed(None, false);
        SecureLog::log_key_file_loaded("/tmp/key", 32);
        SecureLog::log_anomaly("transform", "output length 31");
    }
}
