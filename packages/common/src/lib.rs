//! Common infrastructure for the keeplock crates
//!
//! Currently this is the secret-safe logging layer used by the derivation engine:
//! - `env_logger` initialisation driven by `RUST_LOG`
//! - structured derivation events that never carry key material
//! - SHA-256 fingerprints for identifiers that must stay traceable

pub mod logging;

pub use logging::SecureLog;
