use super::sample_store;
use crate::*;
use anyhow::Result;
use tempfile::tempdir;

#[test]
fn write_creates_file_and_cleans_up() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("out.db");

    StoreWriter::write(&path, &sample_store())?;

    assert!(path.exists());
    assert!(!lock_path(&path).exists(), "lock file must be released");
    assert!(!dir.path().join("out.db.tmp").exists(), "temp file must be renamed");

    let bytes = std::fs::read(&path)?;
    assert!(bytes.len() as u64 >= FOOTER_BYTES);
    assert_eq!(&bytes[bytes.len() - 4..], &STORE_MAGIC.to_le_bytes());

    Ok(())
}

#[test]
fn write_replaces_existing_store() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("replace.db");

    StoreWriter::write(&path, &sample_store())?;

    let mut next = MemoryStore::new();
    next.insert("only", "x", b"1".to_vec());
    StoreWriter::write(&path, &next)?;

    let reader = StoreReader::open(&path)?;
    assert_eq!(reader.map_names(), vec!["only"]);

    Ok(())
}

#[test]
fn write_is_deterministic() -> Result<()> {
    let dir = tempdir()?;
    let a = dir.path().join("a.db");
    let b = dir.path().join("b.db");

    StoreWriter::write(&a, &sample_store())?;
    StoreWriter::write(&b, &sample_store())?;

    assert_eq!(std::fs::read(&a)?, std::fs::read(&b)?);

    Ok(())
}

#[test]
fn write_refuses_when_lock_is_held() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("held.db");
    std::fs::write(lock_path(&path), b"")?;

    let err = StoreWriter::write(&path, &sample_store()).unwrap_err();
    assert!(matches!(err, StoreError::Locked { .. }));
    assert!(!path.exists());
    // Someone else's lock is left alone.
    assert!(lock_path(&path).exists());

    Ok(())
}

#[test]
fn write_rejects_oversized_key() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("bigkey.db");

    let mut mem = MemoryStore::new();
    mem.insert("m", "k".repeat(MAX_KEY_BYTES + 1), b"v".to_vec());

    let err = StoreWriter::write(&path, &mem).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
    assert!(!path.exists());
    assert!(!lock_path(&path).exists());

    Ok(())
}

#[test]
fn large_value_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("bigval.db");

    let mut mem = MemoryStore::new();
    mem.insert("blobs", "big", vec![b'x'; 500_000]);
    StoreWriter::write(&path, &mem)?;

    let reader = StoreReader::open(&path)?;
    let (key, value) = reader.entries("blobs")?.next().unwrap()?;
    assert_eq!(key, "big");
    assert_eq!(value.len(), 500_000);

    Ok(())
}

#[test]
fn many_entries_keep_order() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("many.db");

    let mut mem = MemoryStore::new();
    for i in (0..1_000u32).rev() {
        mem.insert("m", format!("key{:04}", i), i.to_le_bytes().to_vec());
    }
    StoreWriter::write(&path, &mem)?;

    let reader = StoreReader::open(&path)?;
    let keys: Vec<String> = reader
        .entries("m")?
        .map(|e| e.map(|(k, _)| k))
        .collect::<Result<_, _>>()?;
    assert_eq!(keys.len(), 1_000);
    assert_eq!(keys.first().map(String::as_str), Some("key0000"));
    assert_eq!(keys.last().map(String::as_str), Some("key0999"));
    assert!(keys.windows(2).all(|w| w[0] < w[1]));

    Ok(())
}
