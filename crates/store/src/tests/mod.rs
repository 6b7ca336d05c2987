mod writer_tests;

use byteorder::{LittleEndian, WriteBytesExt};
use crc32fast::Hasher as Crc32;

use crate::format::{encode_directory, write_footer, Footer, MapInfo};
use crate::MemoryStore;

/// A small store with two maps, `settings` created first.
pub(crate) fn sample_store() -> MemoryStore {
    let mut mem = MemoryStore::new();
    mem.insert("settings", "b", b"bravo".to_vec());
    mem.insert("settings", "a", b"alpha".to_vec());
    mem.insert("settings", "c", Vec::new());
    mem.insert("cache", "k1", vec![0xA1, 0x01, 0x02]);
    mem
}

/// Shorthand for one raw record.
pub(crate) fn rec(key: &[u8], value: &[u8]) -> (Vec<u8>, Vec<u8>) {
    (key.to_vec(), value.to_vec())
}

/// Builds store bytes by hand so tests can lay out records the writer
/// would never produce (unsorted keys, invalid UTF-8, ...).
pub(crate) fn raw_store(maps: &[(&str, Vec<(Vec<u8>, Vec<u8>)>)]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut directory = Vec::new();

    for (name, records) in maps {
        let data_offset = out.len() as u64;
        for (key, value) in records {
            let mut body = Vec::new();
            body.write_u32::<LittleEndian>(key.len() as u32).unwrap();
            body.extend_from_slice(key);
            body.write_u32::<LittleEndian>(value.len() as u32).unwrap();
            body.extend_from_slice(value);

            let mut hasher = Crc32::new();
            hasher.update(&body);
            out.write_u32::<LittleEndian>(hasher.finalize()).unwrap();
            out.extend_from_slice(&body);
        }
        directory.push(MapInfo {
            name: name.to_string(),
            data_offset,
            entry_count: records.len() as u64,
        });
    }

    let directory_offset = out.len() as u64;
    let dir_bytes = encode_directory(&directory).unwrap();
    out.extend_from_slice(&dir_bytes);

    let mut hasher = Crc32::new();
    hasher.update(&dir_bytes);
    write_footer(
        &mut out,
        &Footer {
            directory_offset,
            directory_len: dir_bytes.len() as u64,
            directory_crc: hasher.finalize(),
        },
    )
    .unwrap();

    out
}
