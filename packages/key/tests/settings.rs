//! KDF settings and key configuration persistence

use keeplock_key::{
    AesKdf, Argon2Kdf, Argon2Variant, ErrorKind, FactorDescriptor, FactorKind, KdfEngine,
    KdfRegistry, KdfSettings, KeyConfiguration,
};
use std::path::PathBuf;

#[test]
fn test_settings_to_parameters_and_back() {
    let registry = KdfRegistry::with_builtin();
    for settings in [
        KdfSettings::aes(6000),
        KdfSettings::interactive(),
        KdfSettings::Argon2 {
            variant: Argon2Variant::Argon2d,
            iterations: 4,
            memory_bytes: 8 * 1024 * 1024,
            parallelism: 1,
        },
    ] {
        let parameters = settings.to_parameters(&registry).expect("parameters");
        assert_eq!(parameters.uuid().expect("uuid"), settings.uuid());
        assert_eq!(
            KdfSettings::from_parameters(&parameters).expect("settings"),
            settings
        );
    }
}

#[test]
fn test_to_parameters_generates_fresh_seeds() {
    let registry = KdfRegistry::with_builtin();

    let a = KdfSettings::aes(10).to_parameters(&registry).expect("a");
    let b = KdfSettings::aes(10).to_parameters(&registry).expect("b");
    assert_ne!(AesKdf.seed(&a).expect("seed"), AesKdf.seed(&b).expect("seed"));

    let c = KdfSettings::interactive().to_parameters(&registry).expect("c");
    let salt = Argon2Kdf::argon2id().seed(&c).expect("salt");
    assert_eq!(salt.len(), Argon2Kdf::SALT_LEN);
}

#[test]
fn test_to_parameters_needs_registered_engine() {
    let err = KdfSettings::standard()
        .to_parameters(&KdfRegistry::new())
        .expect_err("empty registry");
    assert_eq!(err.kind(), ErrorKind::UnknownKdf);
}

#[test]
fn test_settings_from_json() {
    let settings: KdfSettings = serde_json::from_str(
        r#"{ "algorithm": "argon2", "variant": "argon2d", "iterations": 3,
             "memory_bytes": 1048576, "parallelism": 2 }"#,
    )
    .expect("parse");
    assert_eq!(settings.uuid(), Argon2Variant::Argon2d.uuid());
}

#[test]
fn test_key_configuration_json_round_trip() {
    let configuration = KeyConfiguration {
        factors: vec![
            FactorDescriptor {
                kind: FactorKind::Password,
                key_file: None,
                label: None,
            },
            FactorDescriptor {
                kind: FactorKind::KeyFile,
                key_file: Some(PathBuf::from("/home/me/db.keyx")),
                label: None,
            },
            FactorDescriptor {
                kind: FactorKind::Custom,
                key_file: None,
                label: Some("otp".into()),
            },
        ],
    };

    let json = configuration.to_json().expect("serialize");
    assert!(json.contains("\"key_file\""));
    assert!(json.contains("\"custom\""));
    assert_eq!(KeyConfiguration::from_json(&json).expect("parse"), configuration);
}

#[test]
fn test_key_configuration_rejects_garbage() {
    let err = KeyConfiguration::from_json("{ \"factors\": [ { \"kind\": \"retina\" } ] }")
        .expect_err("unknown kind");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
