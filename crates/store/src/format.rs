//! Store binary format constants, footer and directory helpers.
//!
//! ## Footer (24 bytes) - magic `MMS1` (`0x4D4D_5331`)
//!
//! ```text
//! [directory_offset: u64 LE][directory_len: u64 LE][directory_crc: u32 LE][magic: u32 LE]
//! ```
//!
//! ## Directory
//!
//! ```text
//! [map_count: u32]
//! repeated: [name_len: u32][name][data_offset: u64][entry_count: u64]
//! ```
//!
//! The directory CRC32 covers the whole directory section, `map_count`
//! included.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use config::append_to_path;
use std::io::{self, Read, Result as IoResult, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Magic number identifying store files (ASCII "MMS1").
pub const STORE_MAGIC: u32 = 0x4D4D_5331;

/// Size of the footer in bytes: 8 (`directory_offset`) + 8 (`directory_len`)
/// + 4 (`directory_crc`) + 4 (`magic`).
pub const FOOTER_BYTES: u64 = 8 + 8 + 4 + 4;

/// Maximum key size we'll allocate during reads (64 KiB). Prevents OOM on corrupt files.
pub const MAX_KEY_BYTES: usize = 64 * 1024;
/// Maximum value size we'll allocate during reads (64 MiB). Prevents OOM on corrupt files.
pub const MAX_VALUE_BYTES: usize = 64 * 1024 * 1024;
/// Maximum map name size accepted in the directory.
pub const MAX_NAME_BYTES: usize = 64 * 1024;

/// Parsed store footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub directory_offset: u64,
    pub directory_len: u64,
    pub directory_crc: u32,
}

/// Writes the footer to `w`.
pub fn write_footer<W: Write>(w: &mut W, footer: &Footer) -> IoResult<()> {
    w.write_u64::<LittleEndian>(footer.directory_offset)?;
    w.write_u64::<LittleEndian>(footer.directory_len)?;
    w.write_u32::<LittleEndian>(footer.directory_crc)?;
    w.write_u32::<LittleEndian>(STORE_MAGIC)?;
    Ok(())
}

/// Reads the footer from the end of `r`.
///
/// Fails with `InvalidData` if the file is too small or the magic does not
/// match.
pub fn read_footer<R: Read + Seek>(r: &mut R) -> IoResult<Footer> {
    let filesize = r.seek(SeekFrom::End(0))?;
    if filesize < FOOTER_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "file too small for store footer",
        ));
    }

    r.seek(SeekFrom::End(-(FOOTER_BYTES as i64)))?;
    let directory_offset = r.read_u64::<LittleEndian>()?;
    let directory_len = r.read_u64::<LittleEndian>()?;
    let directory_crc = r.read_u32::<LittleEndian>()?;
    let magic = r.read_u32::<LittleEndian>()?;

    if magic != STORE_MAGIC {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unknown store magic: {:#x}", magic),
        ));
    }

    Ok(Footer {
        directory_offset,
        directory_len,
        directory_crc,
    })
}

/// One map as recorded in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapInfo {
    pub name: String,
    /// Offset of the map's first record in the data section.
    pub data_offset: u64,
    pub entry_count: u64,
}

/// Serializes the directory section.
pub fn encode_directory(maps: &[MapInfo]) -> IoResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.write_u32::<LittleEndian>(maps.len() as u32)?;
    for info in maps {
        buf.write_u32::<LittleEndian>(info.name.len() as u32)?;
        buf.extend_from_slice(info.name.as_bytes());
        buf.write_u64::<LittleEndian>(info.data_offset)?;
        buf.write_u64::<LittleEndian>(info.entry_count)?;
    }
    Ok(buf)
}

/// Parses the directory section. Names must be UTF-8 and unique.
pub fn decode_directory(mut bytes: &[u8]) -> IoResult<Vec<MapInfo>> {
    let count = bytes.read_u32::<LittleEndian>()? as usize;
    let mut maps: Vec<MapInfo> = Vec::with_capacity(count.min(1024));

    for _ in 0..count {
        let name_len = bytes.read_u32::<LittleEndian>()? as usize;
        if name_len > MAX_NAME_BYTES || name_len > bytes.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("map name length {} out of bounds", name_len),
            ));
        }
        let (raw, rest) = bytes.split_at(name_len);
        bytes = rest;
        let name = String::from_utf8(raw.to_vec()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "map name is not valid UTF-8")
        })?;
        if maps.iter().any(|m| m.name == name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("duplicate map name {:?}", name),
            ));
        }
        let data_offset = bytes.read_u64::<LittleEndian>()?;
        let entry_count = bytes.read_u64::<LittleEndian>()?;
        maps.push(MapInfo {
            name,
            data_offset,
            entry_count,
        });
    }

    if !bytes.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} trailing bytes after map directory", bytes.len()),
        ));
    }

    Ok(maps)
}

/// Path of the exclusive lock file held while a writer owns `path`.
#[must_use]
pub fn lock_path(path: &Path) -> PathBuf {
    append_to_path(path, ".lock")
}

/// Path of the temporary file a writer fills before renaming into `path`.
#[must_use]
pub fn tmp_path(path: &Path) -> PathBuf {
    append_to_path(path, ".tmp")
}
