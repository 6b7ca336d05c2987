use byteorder::{LittleEndian, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::{self, rename, OpenOptions};
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StoreError;
use crate::format::{
    encode_directory, lock_path, tmp_path, write_footer, Footer, MapInfo, MAX_KEY_BYTES,
    MAX_NAME_BYTES, MAX_VALUE_BYTES,
};
use crate::source::MemoryStore;

/// Writes a [`MemoryStore`] to disk as an immutable store file.
///
/// The writer is stateless; all work happens inside
/// [`write`](StoreWriter::write). While writing it holds the exclusive
/// lock file `<path>.lock`, so readers refuse to open the store until the
/// new file is in place.
pub struct StoreWriter {}

impl StoreWriter {
    /// Persists `store` at `path`, replacing any existing file.
    ///
    /// # File Layout
    ///
    /// ```text
    /// [DATA]      per map, per entry: crc32(u32) | key_len(u32) | key | val_len(u32) | val
    /// [DIRECTORY] map_count(u32) | per map: name_len(u32) | name | data_offset(u64) | entry_count(u64)
    /// [FOOTER]    directory_offset(u64) | directory_len(u64) | directory_crc(u32) | magic(u32 = "MMS1")
    /// ```
    ///
    /// # Crash Safety
    ///
    /// Writes to `<path>.tmp`, calls `sync_all()`, then atomically renames.
    /// If anything fails the temp file is removed and `path` is untouched.
    ///
    /// # Errors
    ///
    /// [`StoreError::Locked`] if another writer holds the lock file,
    /// [`StoreError::Invalid`] if a name, key or value exceeds the format
    /// limits, or any I/O failure.
    pub fn write(path: &Path, store: &MemoryStore) -> Result<(), StoreError> {
        Self::validate(store)?;

        let _lock = LockFile::acquire(path)?;
        let tmp = tmp_path(path);

        let result = Self::write_internal(path, &tmp, store);
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn validate(store: &MemoryStore) -> Result<(), StoreError> {
        for (name, entries) in store.iter() {
            if name.len() > MAX_NAME_BYTES {
                return Err(StoreError::Invalid(format!(
                    "map name of {} bytes exceeds maximum {}",
                    name.len(),
                    MAX_NAME_BYTES
                )));
            }
            for (key, value) in entries {
                if key.len() > MAX_KEY_BYTES {
                    return Err(StoreError::Invalid(format!(
                        "map {:?}: key of {} bytes exceeds maximum {}",
                        name,
                        key.len(),
                        MAX_KEY_BYTES
                    )));
                }
                if value.len() > MAX_VALUE_BYTES {
                    return Err(StoreError::Invalid(format!(
                        "map {:?}: value for {:?} of {} bytes exceeds maximum {}",
                        name,
                        key,
                        value.len(),
                        MAX_VALUE_BYTES
                    )));
                }
            }
        }
        Ok(())
    }

    fn write_internal(path: &Path, tmp: &Path, store: &MemoryStore) -> Result<(), StoreError> {
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp)?;
        let mut file = BufWriter::new(raw_file);

        let mut directory: Vec<MapInfo> = Vec::with_capacity(store.len());

        // Reusable buffer for computing per-record CRC32 checksums.
        let mut record_buf: Vec<u8> = Vec::with_capacity(256);

        // Write DATA section, one contiguous run of records per map
        for (name, entries) in store.iter() {
            let data_offset = file.stream_position()?;

            for (key, value) in entries {
                record_buf.clear();
                record_buf.write_u32::<LittleEndian>(key.len() as u32)?;
                record_buf.extend_from_slice(key.as_bytes());
                record_buf.write_u32::<LittleEndian>(value.len() as u32)?;
                record_buf.extend_from_slice(value);

                let mut hasher = Crc32::new();
                hasher.update(&record_buf);
                let crc = hasher.finalize();

                file.write_u32::<LittleEndian>(crc)?;
                file.write_all(&record_buf)?;
            }

            directory.push(MapInfo {
                name: name.to_string(),
                data_offset,
                entry_count: entries.len() as u64,
            });
        }

        // Write DIRECTORY section
        let directory_offset = file.stream_position()?;
        let directory_bytes = encode_directory(&directory)?;
        file.write_all(&directory_bytes)?;

        let mut hasher = Crc32::new();
        hasher.update(&directory_bytes);

        write_footer(
            &mut file,
            &Footer {
                directory_offset,
                directory_len: directory_bytes.len() as u64,
                directory_crc: hasher.finalize(),
            },
        )?;

        // Flush BufWriter, then sync the underlying file
        file.flush()?;
        file.into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))?
            .sync_all()?;

        // Atomically move into place
        rename(tmp, path)?;

        // Fsync the parent directory so the rename survives a crash.
        if let Some(parent) = path.parent() {
            if let Ok(dir) = fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        debug!(path = %path.display(), maps = directory.len(), "wrote store");
        Ok(())
    }
}

/// Exclusive `<store>.lock` file, removed on drop.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(store_path: &Path) -> Result<Self, StoreError> {
        let lock = lock_path(store_path);
        match OpenOptions::new().write(true).create_new(true).open(&lock) {
            Ok(_) => Ok(Self { path: lock }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(StoreError::Locked {
                path: store_path.to_path_buf(),
                lock,
            }),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
