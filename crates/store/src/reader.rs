use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, TryLockError};
use tracing::debug;

use crate::error::StoreError;
use crate::format::{
    decode_directory, lock_path, read_footer, MapInfo, FOOTER_BYTES, MAX_KEY_BYTES,
    MAX_VALUE_BYTES,
};

/// Read-only access to a store file.
///
/// On [`open`](StoreReader::open) the footer and the map **directory** are
/// loaded and validated; record data is only read while a map's entries are
/// iterated.
///
/// The file handle stays open for the lifetime of the reader, wrapped in a
/// `Mutex` so that [`entries`](StoreReader::entries) can be called through a
/// shared `&self` reference. Only one [`MapEntries`] iterator can be live at
/// a time.
pub struct StoreReader {
    path: PathBuf,
    /// Maps in directory order.
    maps: Vec<MapInfo>,
    /// First byte past the data section (= directory offset).
    data_end: u64,
    file: Mutex<BufReader<File>>,
}

impl StoreReader {
    /// Opens a store file read-only and loads its directory.
    ///
    /// # Validation
    ///
    /// - No writer may hold `<path>.lock`.
    /// - The file must be at least [`FOOTER_BYTES`] long and end with the
    ///   `MMS1` magic.
    /// - The directory must end exactly where the footer starts, match its
    ///   CRC32, and point every map inside the data section.
    ///
    /// # Errors
    ///
    /// [`StoreError::Open`] if the file cannot be opened,
    /// [`StoreError::Locked`] if a writer holds the lock file,
    /// [`StoreError::NotAStore`] if any validation step fails.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let lock = lock_path(&path);
        if lock.exists() {
            return Err(StoreError::Locked { path, lock });
        }

        let mut f = File::open(&path).map_err(|source| StoreError::Open {
            path: path.clone(),
            source,
        })?;
        let not_a_store = |reason: String| StoreError::NotAStore {
            path: path.clone(),
            reason,
        };

        let filesize = f.metadata()?.len();
        if filesize < FOOTER_BYTES {
            return Err(not_a_store(format!("file too small ({} bytes)", filesize)));
        }

        let footer = read_footer(&mut f).map_err(|e| not_a_store(e.to_string()))?;
        let footer_start = filesize - FOOTER_BYTES;

        if footer.directory_offset.checked_add(footer.directory_len) != Some(footer_start) {
            return Err(not_a_store("directory does not end at footer".to_string()));
        }

        f.seek(SeekFrom::Start(footer.directory_offset))?;
        let mut directory = vec![0u8; footer.directory_len as usize];
        f.read_exact(&mut directory)?;

        let mut hasher = Crc32::new();
        hasher.update(&directory);
        let actual_crc = hasher.finalize();
        if actual_crc != footer.directory_crc {
            return Err(not_a_store(format!(
                "directory CRC32 mismatch: expected {:#010x}, got {:#010x}",
                footer.directory_crc, actual_crc
            )));
        }

        let maps = decode_directory(&directory).map_err(|e| not_a_store(e.to_string()))?;

        if let Some(bad) = maps
            .iter()
            .find(|m| m.data_offset > footer.directory_offset)
        {
            return Err(not_a_store(format!(
                "map {:?} points past the data section",
                bad.name
            )));
        }

        f.seek(SeekFrom::Start(0))?;

        debug!(path = %path.display(), maps = maps.len(), "opened store");

        Ok(Self {
            path,
            maps,
            data_end: footer.directory_offset,
            file: Mutex::new(BufReader::new(f)),
        })
    }

    /// Path the store was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Map names in the order the store records them.
    #[must_use]
    pub fn map_names(&self) -> Vec<String> {
        self.maps.iter().map(|m| m.name.clone()).collect()
    }

    /// Number of entries recorded for `map`, or `None` if there is no such map.
    #[must_use]
    pub fn entry_count(&self, map: &str) -> Option<u64> {
        self.find(map).map(|m| m.entry_count)
    }

    /// Returns a lazy iterator over `(key, value)` pairs of `map`, in
    /// ascending key order.
    ///
    /// Every record is CRC-checked as it is read. The first failure is
    /// yielded as an error and ends the iteration.
    ///
    /// # Errors
    ///
    /// [`StoreError::MapNotFound`] if `map` is not in the directory, or an
    /// I/O error if another iterator over this reader is still alive.
    pub fn entries(&self, map: &str) -> Result<MapEntries<'_>, StoreError> {
        let info = self
            .find(map)
            .ok_or_else(|| StoreError::MapNotFound(map.to_string()))?;

        let mut file = match self.file.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                return Err(StoreError::Io(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "another map iteration is still in progress",
                )))
            }
            Err(TryLockError::Poisoned(e)) => {
                return Err(StoreError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    format!("lock poisoned: {}", e),
                )))
            }
        };
        file.seek(SeekFrom::Start(info.data_offset))?;

        Ok(MapEntries {
            file,
            map: info.name.clone(),
            remaining: info.entry_count,
            position: info.data_offset,
            data_end: self.data_end,
            last_key: None,
            failed: false,
        })
    }

    fn find(&self, map: &str) -> Option<&MapInfo> {
        self.maps.iter().find(|m| m.name == map)
    }
}

impl std::fmt::Debug for StoreReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreReader")
            .field("path", &self.path)
            .field("maps", &self.maps)
            .field("data_end", &self.data_end)
            .finish()
    }
}

/// Iterator over the records of one map.
///
/// Holds the reader's file lock until dropped.
pub struct MapEntries<'a> {
    file: MutexGuard<'a, BufReader<File>>,
    map: String,
    remaining: u64,
    /// Offset of the next record.
    position: u64,
    data_end: u64,
    last_key: Option<String>,
    failed: bool,
}

impl MapEntries<'_> {
    /// Reads one record:
    /// `[crc32: u32][key_len: u32][key][val_len: u32][val]`
    fn read_record(&mut self) -> Result<(String, Vec<u8>), StoreError> {
        let offset = self.position;
        let map = self.map.clone();
        let truncated = |e: io::Error| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                StoreError::Corrupt(format!(
                    "map {:?}: truncated record at offset {}",
                    map, offset
                ))
            } else {
                StoreError::Io(e)
            }
        };

        let stored_crc = self.file.read_u32::<LittleEndian>().map_err(truncated)?;

        let key_len = self.file.read_u32::<LittleEndian>().map_err(truncated)? as usize;
        if key_len > MAX_KEY_BYTES {
            return Err(StoreError::Corrupt(format!(
                "key_len {} exceeds maximum {} at offset {}",
                key_len, MAX_KEY_BYTES, offset
            )));
        }
        self.check_bounds(offset, 4 + 4 + key_len as u64)?;
        let mut key = vec![0u8; key_len];
        self.file.read_exact(&mut key).map_err(truncated)?;

        let val_len = self.file.read_u32::<LittleEndian>().map_err(truncated)? as usize;
        if val_len > MAX_VALUE_BYTES {
            return Err(StoreError::Corrupt(format!(
                "val_len {} exceeds maximum {} at offset {}",
                val_len, MAX_VALUE_BYTES, offset
            )));
        }
        let record_len = 4 + 4 + key_len as u64 + 4 + val_len as u64;
        self.check_bounds(offset, record_len)?;
        let mut value = vec![0u8; val_len];
        self.file.read_exact(&mut value).map_err(truncated)?;

        let mut hasher = Crc32::new();
        hasher.update(&(key_len as u32).to_le_bytes());
        hasher.update(&key);
        hasher.update(&(val_len as u32).to_le_bytes());
        hasher.update(&value);
        let actual_crc = hasher.finalize();
        if actual_crc != stored_crc {
            return Err(StoreError::Corrupt(format!(
                "CRC32 mismatch at offset {}: expected {:#010x}, got {:#010x}",
                offset, stored_crc, actual_crc
            )));
        }

        let key = String::from_utf8(key).map_err(|_| {
            StoreError::Corrupt(format!("key at offset {} is not valid UTF-8", offset))
        })?;

        if let Some(prev) = &self.last_key {
            if key.as_bytes() <= prev.as_bytes() {
                return Err(StoreError::Corrupt(format!(
                    "map {:?}: key {:?} is not after {:?}",
                    self.map, key, prev
                )));
            }
        }

        self.position += record_len;
        self.last_key = Some(key.clone());
        Ok((key, value))
    }

    fn check_bounds(&self, offset: u64, len: u64) -> Result<(), StoreError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.data_end => Ok(()),
            _ => Err(StoreError::Corrupt(format!(
                "map {:?}: record at offset {} runs past the data section",
                self.map, offset
            ))),
        }
    }
}

impl Iterator for MapEntries<'_> {
    type Item = Result<(String, Vec<u8>), StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }
        match self.read_record() {
            Ok(entry) => {
                self.remaining -= 1;
                Some(Ok(entry))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            (0, usize::try_from(self.remaining).ok())
        }
    }
}
