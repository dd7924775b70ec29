//! Parameter block decoding of stored headers

use keeplock_key::kdf::parameters::FORMAT_VERSION;
use keeplock_key::{Argon2Kdf, KdfEngine, KdfParameters, KdfUuid, ParameterError, ParameterValue};

fn entry(type_byte: u8, key: &str, value: &[u8]) -> Vec<u8> {
    let mut out = vec![type_byte];
    out.extend_from_slice(&(key.len() as i32).to_le_bytes());
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(&(value.len() as i32).to_le_bytes());
    out.extend_from_slice(value);
    out
}

fn block(entries: &[Vec<u8>]) -> Vec<u8> {
    let mut out = FORMAT_VERSION.to_le_bytes().to_vec();
    for e in entries {
        out.extend_from_slice(e);
    }
    out.push(0x00);
    out
}

#[test]
fn test_argon2_parameters_survive_encoding() {
    let engine = Argon2Kdf::argon2id();
    let mut parameters = engine.default_parameters();
    engine.randomize(&mut parameters).expect("randomize");
    parameters.set_string("note", "written by tests");
    parameters.set_bool("flag", true);
    parameters.set_i32("neg32", -7);
    parameters.set_i64("neg64", -1 << 40);

    let bytes = parameters.to_bytes().expect("encode");
    let decoded = KdfParameters::from_bytes(&bytes).expect("decode");

    assert_eq!(decoded, parameters);
    assert_eq!(decoded.uuid().expect("uuid"), KdfUuid::ARGON2ID);
    assert_eq!(decoded.get_string("note"), Some("written by tests"));
    assert_eq!(decoded.get_i64("neg64"), Some(-1 << 40));
}

#[test]
fn test_typed_getters_ignore_mismatched_types() {
    let mut parameters = KdfParameters::default();
    parameters.set_u32("P", 2);
    assert_eq!(parameters.get_u32("P"), Some(2));
    assert_eq!(parameters.get_u64("P"), None);
    assert_eq!(parameters.get_bytes("missing"), None);
    assert!(matches!(parameters.get("P"), Some(ParameterValue::UInt32(2))));
}

#[test]
fn test_minor_version_bump_is_accepted() {
    let mut bytes = block(&[entry(0x04, "P", &2u32.to_le_bytes())]);
    bytes[0] = 0x07;
    let parameters = KdfParameters::from_bytes(&bytes).expect("minor bump");
    assert_eq!(parameters.get_u32("P"), Some(2));
}

#[test]
fn test_major_version_bump_is_rejected() {
    let mut bytes = block(&[]);
    bytes[1] = 0x02;
    assert_eq!(
        KdfParameters::from_bytes(&bytes),
        Err(ParameterError::UnsupportedVersion(0x0200))
    );
}

#[test]
fn test_truncated_input() {
    let bytes = block(&[entry(0x05, "I", &2u64.to_le_bytes())]);
    for cut in [1, 3, 8, bytes.len() - 1] {
        assert_eq!(
            KdfParameters::from_bytes(&bytes[..cut]),
            Err(ParameterError::Truncated),
            "cut at {cut}"
        );
    }
}

#[test]
fn test_unknown_type_byte() {
    let bytes = block(&[entry(0x77, "X", &[1])]);
    assert_eq!(
        KdfParameters::from_bytes(&bytes),
        Err(ParameterError::UnknownType(0x77))
    );
}

#[test]
fn test_wrong_fixed_width_length() {
    let bytes = block(&[entry(0x05, "M", &[0; 4])]);
    assert!(matches!(
        KdfParameters::from_bytes(&bytes),
        Err(ParameterError::InvalidLength { expected: 8, actual: 4, .. })
    ));
}

#[test]
fn test_negative_length() {
    let mut bytes = FORMAT_VERSION.to_le_bytes().to_vec();
    bytes.push(0x42);
    bytes.extend_from_slice(&(-1i32).to_le_bytes());
    assert_eq!(
        KdfParameters::from_bytes(&bytes),
        Err(ParameterError::NegativeLength)
    );
}

#[test]
fn test_invalid_utf8_key() {
    let mut bytes = FORMAT_VERSION.to_le_bytes().to_vec();
    bytes.push(0x04);
    bytes.extend_from_slice(&2i32.to_le_bytes());
    bytes.extend_from_slice(&[0xC3, 0x28]);
    bytes.extend_from_slice(&4i32.to_le_bytes());
    bytes.extend_from_slice(&[0; 4]);
    bytes.push(0x00);
    assert_eq!(
        KdfParameters::from_bytes(&bytes),
        Err(ParameterError::InvalidUtf8)
    );
}

#[test]
fn test_trailing_data() {
    let mut bytes = block(&[]);
    bytes.push(0xFF);
    assert_eq!(
        KdfParameters::from_bytes(&bytes),
        Err(ParameterError::TrailingData)
    );
}
