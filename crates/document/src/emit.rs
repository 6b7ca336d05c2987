//! YAML rendering of document trees.
//!
//! [`Node`] implements [`serde::Serialize`] and is written with
//! `serde_yaml`, which takes care of quoting: any string scalar or field
//! name that a YAML reader would otherwise see as structure, a number, a
//! boolean or null is quoted or block-escaped.
//!
//! Quoting follows YAML 1.2 (core schema). Words that only YAML 1.1 treats
//! as booleans (`yes`, `no`, `on`, `off`, `y`, `n`) are strings in 1.2 and
//! are written plain, so a 1.1 reader (SnakeYAML, PyYAML) sees booleans.
//!
//! Integers are written in full, up to the `i128` range of
//! [`Scalar::Integer`]. Values outside `i64::MIN ..= u64::MAX` are valid
//! YAML integers but do not fit `serde_yaml::Value`, so reading such a
//! document back with `serde_yaml` fails.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::borrow::Cow;
use std::io::{self, Write};
use thiserror::Error;

use crate::node::{Node, Scalar};

/// Errors produced while writing rendered text.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("cannot write rendered text")]
    Io(#[from] io::Error),

    #[error("yaml emit failed")]
    Yaml(#[from] serde_yaml::Error),
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Scalar(scalar) => scalar.serialize(serializer),
            Node::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Mapping(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Integer(i) => {
                // Narrowest form first; only out-of-range values need i128.
                if let Ok(v) = i64::try_from(*i) {
                    serializer.serialize_i64(v)
                } else if let Ok(v) = u64::try_from(*i) {
                    serializer.serialize_u64(v)
                } else {
                    serializer.serialize_i128(*i)
                }
            }
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::Bytes(b) => serializer.serialize_str(&STANDARD.encode(b)),
        }
    }
}

/// Writes the YAML rendering of `node` to `writer`, ending with a newline.
///
/// # Errors
///
/// [`EmitError`] if the writer rejects data.
pub fn emit<W: Write>(node: &Node, writer: &mut W) -> Result<(), EmitError> {
    serde_yaml::to_writer(&mut *writer, node)?;
    Ok(())
}

/// Renders `node` into a `String`.
pub fn emit_to_string(node: &Node) -> Result<String, EmitError> {
    Ok(serde_yaml::to_string(node)?)
}

/// Writes the `# Map: <name>` line that opens a map section.
///
/// Line breaks in `name` are written as `\n` / `\r` so the comment stays on
/// one line.
pub fn write_map_comment<W: Write>(writer: &mut W, name: &str) -> Result<(), EmitError> {
    writeln!(writer, "# Map: {}", single_line(name))?;
    Ok(())
}

fn single_line(name: &str) -> Cow<'_, str> {
    if name.contains(|c: char| c == '\n' || c == '\r') {
        Cow::Owned(name.replace('\r', "\\r").replace('\n', "\\n"))
    } else {
        Cow::Borrowed(name)
    }
}
