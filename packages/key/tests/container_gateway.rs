//! Load and save through a minimal container format

use keeplock_key::gateway::{open_container, save_container};
use keeplock_key::{
    CompositeKey, ContainerError, ContainerFormat, KdfHeader, KdfParameters, KdfRegistry,
    KdfSettings, KdfUuid, NullStatus, PasswordFactor, ProtectedKey, StatusSink,
};
use sha2::{Digest, Sha256};
use std::io::{Cursor, Read, Write};

const MAGIC: &[u8; 4] = b"KLTY";

/// Header, key check value and a body XORed with the key
struct ToyFormat {
    body: Vec<u8>,
}

fn read_chunk(input: &mut dyn Read) -> Result<Vec<u8>, ContainerError> {
    let mut len = [0u8; 4];
    input.read_exact(&mut len)?;
    let mut chunk = vec![0u8; u32::from_le_bytes(len) as usize];
    input.read_exact(&mut chunk)?;
    Ok(chunk)
}

fn write_chunk(output: &mut dyn Write, chunk: &[u8]) -> Result<(), ContainerError> {
    output.write_all(&(chunk.len() as u32).to_le_bytes())?;
    output.write_all(chunk)?;
    Ok(())
}

fn xor(data: &[u8], key: &ProtectedKey) -> Vec<u8> {
    data.iter()
        .zip(key.expose().iter().cycle())
        .map(|(d, k)| d ^ k)
        .collect()
}

impl ContainerFormat for ToyFormat {
    fn read_header(&mut self, input: &mut dyn Read) -> Result<KdfHeader, ContainerError> {
        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(ContainerError::CorruptHeader("bad magic".into()));
        }
        let master_seed = read_chunk(input)?;
        let block = read_chunk(input)?;
        KdfHeader::decode(master_seed, &block)
    }

    fn load(
        &mut self,
        input: &mut dyn Read,
        key: &ProtectedKey,
        _header: &KdfHeader,
        status: &mut dyn StatusSink,
    ) -> Result<(), ContainerError> {
        let check = read_chunk(input)?;
        if check.as_slice() != Sha256::digest(key.expose()).as_slice() {
            return Err(ContainerError::Format("wrong key".into()));
        }
        self.body = xor(&read_chunk(input)?, key);
        status.set_progress(100);
        Ok(())
    }

    fn save(
        &mut self,
        output: &mut dyn Write,
        key: &ProtectedKey,
        header: &KdfHeader,
        _status: &mut dyn StatusSink,
    ) -> Result<(), ContainerError> {
        output.write_all(MAGIC)?;
        write_chunk(output, &header.master_seed)?;
        write_chunk(output, &header.encode_parameters()?)?;
        write_chunk(output, &Sha256::digest(key.expose()))?;
        write_chunk(output, &xor(&self.body, key))?;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingStatus {
    texts: Vec<String>,
    progress: Vec<u8>,
}

impl StatusSink for RecordingStatus {
    fn set_text(&mut self, text: &str) {
        self.texts.push(text.to_string());
    }

    fn set_progress(&mut self, percent: u8) {
        self.progress.push(percent);
    }
}

fn password_key(registry: &std::sync::Arc<KdfRegistry>, password: &str) -> CompositeKey {
    let mut key = CompositeKey::new(registry.clone());
    key.add_factor(PasswordFactor::new(password)).expect("password");
    key
}

fn saved_container(registry: &std::sync::Arc<KdfRegistry>) -> (Vec<u8>, KdfHeader) {
    let template = KdfSettings::aes(50).to_parameters(registry).expect("parameters");
    let mut format = ToyFormat {
        body: b"entries go here".to_vec(),
    };
    let mut out = Vec::new();
    let header = save_container(
        &mut format,
        &mut out,
        &mut password_key(registry, "hunter2"),
        &template,
        &mut NullStatus,
    )
    .expect("save");
    (out, header)
}

#[test]
fn test_save_then_open() {
    let registry = KdfRegistry::with_builtin().into_shared();
    let (bytes, saved_header) = saved_container(&registry);

    let mut format = ToyFormat { body: Vec::new() };
    let mut status = RecordingStatus::default();
    let header = open_container(
        &mut format,
        &mut Cursor::new(bytes),
        &mut password_key(&registry, "hunter2"),
        &mut status,
    )
    .expect("open");

    assert_eq!(format.body, b"entries go here");
    assert_eq!(header, saved_header);
    assert!(status.texts.iter().any(|t| t == "Transforming key"));
    assert_eq!(status.progress.last(), Some(&100));
}

#[test]
fn test_wrong_password_is_a_format_error() {
    let registry = KdfRegistry::with_builtin().into_shared();
    let (bytes, _) = saved_container(&registry);

    let err = open_container(
        &mut ToyFormat { body: Vec::new() },
        &mut Cursor::new(bytes),
        &mut password_key(&registry, "wrong"),
        &mut NullStatus,
    )
    .expect_err("wrong key");
    assert!(matches!(err, ContainerError::Format(_)));
}

#[test]
fn test_every_save_uses_fresh_seeds() {
    let registry = KdfRegistry::with_builtin().into_shared();
    let (first, first_header) = saved_container(&registry);
    let (second, second_header) = saved_container(&registry);

    assert_ne!(first_header.master_seed, second_header.master_seed);
    assert_ne!(first, second);
}

#[test]
fn test_newer_kdf_is_distinguished_from_corruption() {
    let registry = KdfRegistry::with_builtin().into_shared();
    let future = KdfUuid::from_bytes([0x5A; 16]);

    let mut bytes = MAGIC.to_vec();
    write_chunk(&mut bytes, &[1; 32]).expect("seed");
    write_chunk(
        &mut bytes,
        &KdfParameters::new(future).to_bytes().expect("encode"),
    )
    .expect("block");

    let err = open_container(
        &mut ToyFormat { body: Vec::new() },
        &mut Cursor::new(bytes),
        &mut password_key(&registry, "hunter2"),
        &mut NullStatus,
    )
    .expect_err("unknown kdf");
    match err {
        ContainerError::UnknownKdf { uuid } => assert_eq!(uuid, future),
        other => panic!("expected UnknownKdf, got {other:?}"),
    }

    let err = open_container(
        &mut ToyFormat { body: Vec::new() },
        &mut Cursor::new(b"NOPE".to_vec()),
        &mut password_key(&registry, "hunter2"),
        &mut NullStatus,
    )
    .expect_err("bad magic");
    assert!(matches!(err, ContainerError::CorruptHeader(_)));
}
