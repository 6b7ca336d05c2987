//! End-to-end tests driving the built `dbconv` binary.

use document::{encode, Node};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use store::{lock_path, MemoryStore, StoreWriter};
use tempfile::tempdir;

fn run<S: AsRef<OsStr>>(args: &[S]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dbconv"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn dbconv")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn cbor(node: Node) -> Vec<u8> {
    encode(&node).unwrap()
}

fn settings_store(dir: &Path, name: &str) -> PathBuf {
    let mut mem = MemoryStore::new();
    mem.insert("settings", "a", cbor(Node::from(true)));
    mem.insert("settings", "b", cbor(Node::from(42i64)));
    let path = dir.join(name);
    StoreWriter::write(&path, &mem).unwrap();
    path
}

#[test]
fn converts_single_store() {
    let dir = tempdir().unwrap();
    let input = settings_store(dir.path(), "app.db");

    let out = run(&[input.as_os_str()]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let yaml = fs::read_to_string(dir.path().join("app.db.yaml")).unwrap();
    assert_eq!(yaml, "# Map: settings\na: true\nb: 42\n");
    assert!(stdout(&out).starts_with("OK "));
    assert!(stdout(&out).contains("(1 maps, 2 entries)"));
}

#[test]
fn nested_documents_and_several_maps() {
    let dir = tempdir().unwrap();
    let mut mem = MemoryStore::new();
    let nested: Node = vec![(
        "x".to_string(),
        Node::from(vec![Node::from(1i64), Node::from(2i64), Node::from(3i64)]),
    )]
    .into_iter()
    .collect();
    mem.insert("first", "c", cbor(nested));
    mem.map_mut("empty");
    mem.insert("last", "k", cbor(Node::null()));
    let input = dir.path().join("multi.db");
    StoreWriter::write(&input, &mem).unwrap();

    let out = run(&[input.as_os_str()]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let yaml = fs::read_to_string(dir.path().join("multi.db.yaml")).unwrap();
    assert_eq!(
        yaml,
        "# Map: first\nc:\n  x:\n  - 1\n  - 2\n  - 3\n# Map: empty\n{}\n# Map: last\nk: null\n"
    );
}

#[test]
fn missing_path_fails_but_others_convert() {
    let dir = tempdir().unwrap();
    let good = settings_store(dir.path(), "good.db");
    let missing = dir.path().join("missing.db");

    let out = run(&[missing.as_os_str(), good.as_os_str()]);

    assert_eq!(out.status.code(), Some(1));
    assert!(dir.path().join("good.db.yaml").exists());
    assert!(!dir.path().join("missing.db.yaml").exists());

    let err = stderr(&out);
    assert!(err.contains("ERR "), "stderr: {err}");
    assert!(err.contains("missing.db"), "stderr: {err}");
    assert_eq!(stdout(&out).lines().count(), 1);
}

#[test]
fn locked_store_is_reported() {
    let dir = tempdir().unwrap();
    let input = settings_store(dir.path(), "busy.db");
    fs::write(lock_path(&input), b"").unwrap();

    let out = run(&[input.as_os_str()]);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("locked"), "stderr: {}", stderr(&out));
    assert!(!dir.path().join("busy.db.yaml").exists());
}

#[test]
fn undecodable_value_names_map_and_key() {
    let dir = tempdir().unwrap();
    let mut mem = MemoryStore::new();
    mem.insert("users", "alice", vec![0x62, b'a']);
    let input = dir.path().join("bad.db");
    StoreWriter::write(&input, &mem).unwrap();

    let out = run(&[input.as_os_str()]);

    assert_eq!(out.status.code(), Some(1));
    let err = stderr(&out);
    assert!(err.contains("\"users\"") && err.contains("\"alice\""), "stderr: {err}");
    assert!(!dir.path().join("bad.db.yaml").exists());
    assert!(!dir.path().join("bad.db.yaml.tmp").exists());
}

#[test]
fn suffix_and_no_sync_flags() {
    let dir = tempdir().unwrap();
    let input = settings_store(dir.path(), "app.db");

    let out = run(&[
        OsStr::new("--suffix"),
        OsStr::new(".dump.yml"),
        OsStr::new("--no-sync"),
        input.as_os_str(),
    ]);

    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(dir.path().join("app.db.dump.yml").exists());
    assert!(!dir.path().join("app.db.yaml").exists());
}

#[test]
fn suffix_with_separator_is_rejected() {
    let dir = tempdir().unwrap();
    let input = settings_store(dir.path(), "app.db");

    let out = run(&[OsStr::new("--suffix"), OsStr::new("/x"), input.as_os_str()]);

    assert!(!out.status.success());
    assert!(stderr(&out).contains("path separator"), "stderr: {}", stderr(&out));
}

#[test]
fn no_paths_is_a_usage_error() {
    let out = run::<&str>(&[]);
    assert!(!out.status.success());
    assert!(stdout(&out).is_empty());
}

#[test]
fn output_reparses_as_yaml() {
    let dir = tempdir().unwrap();
    let mut mem = MemoryStore::new();
    let doc: Node = vec![
        ("name".to_string(), Node::from("x: y")),
        ("count".to_string(), Node::from(3i64)),
        ("ratio".to_string(), Node::from(0.5)),
        ("gone".to_string(), Node::null()),
    ]
    .into_iter()
    .collect();
    mem.insert("m", "doc", cbor(doc));
    let input = dir.path().join("re.db");
    StoreWriter::write(&input, &mem).unwrap();

    let out = run(&[input.as_os_str()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let text = fs::read_to_string(dir.path().join("re.db.yaml")).unwrap();
    let parsed: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    let doc = &parsed["doc"];
    assert_eq!(doc["name"], serde_yaml::Value::from("x: y"));
    assert_eq!(doc["count"], serde_yaml::Value::from(3));
    assert_eq!(doc["ratio"], serde_yaml::Value::from(0.5));
    assert!(doc["gone"].is_null());
}
