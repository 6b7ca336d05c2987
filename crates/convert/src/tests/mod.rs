
use std::path::{Path, PathBuf};

use config::ConvertConfig;
use document::{encode, Node};
use store::{MemoryStore, StoreWriter};

use crate::Converter;

/// CBOR bytes for `node`.
pub(crate) fn cbor(node: &Node) -> Vec<u8> {
    encode(node).unwrap()
}

/// A mapping node from `(field, value)` pairs, in the given order.
pub(crate) fn fields(pairs: Vec<(&str, Node)>) -> Node {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// The `settings` map: `a = true`, `b = 42`.
pub(crate) fn settings_store() -> MemoryStore {
    let mut mem = MemoryStore::new();
    mem.insert("settings", "b", cbor(&Node::from(42i64)));
    mem.insert("settings", "a", cbor(&Node::from(true)));
    mem
}

/// Writes `mem` to `<dir>/<name>` and returns the path.
pub(crate) fn write_store(dir: &Path, name: &str, mem: &MemoryStore) -> PathBuf {
    let path = dir.join(name);
    StoreWriter::write(&path, mem).unwrap();
    path
}

/// Converter that skips fsync to keep tests quick.
pub(crate) fn converter() -> Converter {
    let config = ConvertConfig {
        sync: false,
        ..ConvertConfig::default()
    };
    Converter::new(config).unwrap()
}
