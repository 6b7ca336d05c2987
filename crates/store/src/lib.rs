//! # Store - multi-map store files
//!
//! Immutable, on-disk files holding several **named maps** of
//! `String -> bytes` entries. A store is written once by [`StoreWriter`] and
//! then only read through [`StoreReader`] (or any other [`MapSource`]).
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ DATA SECTION (one run of sorted records per map)               │
//! │                                                               │
//! │ crc32 (u32) | key_len (u32) | key | val_len (u32) | val        │
//! │                                                               │
//! │ The CRC32 covers everything after itself in the record        │
//! │ (key_len through end of value).                               │
//! ├───────────────────────────────────────────────────────────────┤
//! │ DIRECTORY SECTION (maps in creation order)                     │
//! │                                                               │
//! │ map_count (u32)                                               │
//! │ name_len (u32) | name | data_offset (u64) | entry_count (u64)  │
//! │ ... repeated for each map ...                                  │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (always last 24 bytes)                                  │
//! │                                                               │
//! │ directory_offset (u64 LE) | directory_len (u64 LE)             │
//! │ directory_crc (u32 LE) | magic (u32 LE) "MMS1"                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Keys are UTF-8 and strictly ascending
//! (byte order) within a map.
//!
//! ## Locking
//!
//! A writer holds `<path>.lock` (created exclusively) for the duration of a
//! write. [`StoreReader::open`] fails with [`StoreError::Locked`] while it
//! exists.
//!
//! ## Example
//!
//! ```rust,no_run
//! use store::{MemoryStore, StoreReader, StoreWriter};
//!
//! let mut mem = MemoryStore::new();
//! mem.insert("settings", "theme", b"dark".to_vec());
//! StoreWriter::write("cache.db".as_ref(), &mem).unwrap();
//!
//! let reader = StoreReader::open("cache.db").unwrap();
//! for name in reader.map_names() {
//!     for entry in reader.entries(&name).unwrap() {
//!         let (key, value) = entry.unwrap();
//!         println!("{name}/{key}: {} bytes", value.len());
//!     }
//! }
//! ```

mod error;
mod format;
mod reader;
mod source;
mod writer;

pub use error::StoreError;
pub use format::{lock_path, tmp_path, FOOTER_BYTES, MAX_KEY_BYTES, MAX_VALUE_BYTES, STORE_MAGIC};
pub use reader::{MapEntries, StoreReader};
pub use source::{Entry, EntryIter, MapSource, MemoryStore};
pub use writer::StoreWriter;

#[cfg(test)]
mod tests;
