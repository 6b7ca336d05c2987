//! CBOR decoding into [`Node`] trees, and the paired encoder.
//!
//! Parsing is delegated to `ciborium`; this module only maps its generic
//! `Value` onto the closed [`Node`] model and enforces the tree rules
//! (string field names, unique fields, no trailing bytes).

use ciborium::value::{Integer, Value};
use std::io;
use thiserror::Error;

use crate::node::{Mapping, Node, Scalar};

/// Errors produced while decoding one document.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// The input ended in the middle of a data item.
    #[error("truncated document")]
    Truncated,

    /// Invalid CBOR at the given byte offset (bad header, invalid UTF-8, ...).
    #[error("malformed document at byte {offset}")]
    Syntax { offset: usize },

    /// Well-formed CBOR that cannot be represented as a document.
    #[error("unsupported document{}: {message}", at.map(|o| format!(" at byte {}", o)).unwrap_or_default())]
    Semantic { at: Option<usize>, message: String },

    /// Nesting deeper than the decoder's recursion limit.
    #[error("document nesting too deep")]
    TooDeep,

    /// Bytes left over after the first complete data item.
    #[error("{0} trailing bytes after document")]
    TrailingBytes(usize),

    /// A map key that is neither text nor an integer.
    #[error("unsupported map key of type {0}")]
    UnsupportedKey(&'static str),

    /// The same field name appears twice in one map.
    #[error("duplicate field {0:?}")]
    DuplicateField(String),

    /// A bignum (tag 2 or 3) whose magnitude needs more than 127 bits.
    #[error("big integer of {0} significant bytes exceeds the 128-bit range")]
    IntegerTooWide(usize),

    /// A value kind the document model has no variant for.
    #[error("unsupported value of type {0}")]
    UnsupportedValue(&'static str),

    /// Reading the input failed for a reason other than end of data.
    #[error("io error: {0}")]
    Io(String),
}

/// Errors produced by [`encode`].
#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    #[error("cbor serialization failed: {0}")]
    Serialize(String),
}

/// Turns one encoded value into a document tree.
///
/// The converter is generic over this trait so the binary codec can be
/// swapped without touching the orchestration.
pub trait Decoder {
    fn decode(&self, bytes: &[u8]) -> Result<Node, DecodeError>;
}

/// [`Decoder`] for CBOR payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct CborDecoder;

impl Decoder for CborDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Node, DecodeError> {
        decode(bytes)
    }
}

/// Tag of a positive bignum: big-endian magnitude `n`, value `n`.
const BIGNUM_POSITIVE: u64 = 2;
/// Tag of a negative bignum: big-endian magnitude `n`, value `-1 - n`.
const BIGNUM_NEGATIVE: u64 = 3;

/// Decodes exactly one CBOR data item from `bytes`.
///
/// Bignums (tags 2 and 3 over a byte string) become integers; values
/// outside the `i128` range fail with [`DecodeError::IntegerTooWide`].
/// Every other tag is transparent: the tagged content is decoded and the
/// tag number dropped. Map keys must be text or integers; integer keys
/// become their decimal text.
pub fn decode(bytes: &[u8]) -> Result<Node, DecodeError> {
    let mut reader = bytes;
    let value: Value = ciborium::de::from_reader(&mut reader).map_err(|e| match e {
        ciborium::de::Error::Io(io) if io.kind() == io::ErrorKind::UnexpectedEof => {
            DecodeError::Truncated
        }
        ciborium::de::Error::Io(io) => DecodeError::Io(io.to_string()),
        ciborium::de::Error::Syntax(offset) => DecodeError::Syntax { offset },
        ciborium::de::Error::Semantic(at, message) => DecodeError::Semantic { at, message },
        ciborium::de::Error::RecursionLimitExceeded => DecodeError::TooDeep,
        #[allow(unreachable_patterns)]
        other => DecodeError::Io(format!("{:?}", other)),
    })?;

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes(reader.len()));
    }

    from_value(value)
}

fn from_value(value: Value) -> Result<Node, DecodeError> {
    Ok(match value {
        Value::Null => Node::Scalar(Scalar::Null),
        Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
        Value::Integer(i) => Node::Scalar(Scalar::Integer(i128::from(i))),
        Value::Float(f) => Node::Scalar(Scalar::Float(f)),
        Value::Text(s) => Node::Scalar(Scalar::String(s)),
        Value::Bytes(b) => Node::Scalar(Scalar::Bytes(b)),
        Value::Tag(tag, inner) => match (tag, *inner) {
            (BIGNUM_POSITIVE | BIGNUM_NEGATIVE, Value::Bytes(magnitude)) => {
                Node::Scalar(Scalar::Integer(bignum(tag, &magnitude)?))
            }
            (_, inner) => from_value(inner)?,
        },
        Value::Array(items) => Node::Sequence(
            items
                .into_iter()
                .map(from_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Map(pairs) => {
            let mut fields = Mapping::with_capacity(pairs.len());
            for (key, value) in pairs {
                let name = field_name(key)?;
                if fields.contains_key(&name) {
                    return Err(DecodeError::DuplicateField(name));
                }
                fields.insert(name, from_value(value)?);
            }
            Node::Mapping(fields)
        }
        _ => return Err(DecodeError::UnsupportedValue("unknown")),
    })
}

fn field_name(key: Value) -> Result<String, DecodeError> {
    match key {
        Value::Text(s) => Ok(s),
        Value::Integer(i) => Ok(i128::from(i).to_string()),
        Value::Tag(tag, inner) => match (tag, *inner) {
            (BIGNUM_POSITIVE | BIGNUM_NEGATIVE, Value::Bytes(magnitude)) => {
                Ok(bignum(tag, &magnitude)?.to_string())
            }
            (_, inner) => field_name(inner),
        },
        Value::Null => Err(DecodeError::UnsupportedKey("null")),
        Value::Bool(_) => Err(DecodeError::UnsupportedKey("bool")),
        Value::Float(_) => Err(DecodeError::UnsupportedKey("float")),
        Value::Bytes(_) => Err(DecodeError::UnsupportedKey("bytes")),
        Value::Array(_) => Err(DecodeError::UnsupportedKey("array")),
        Value::Map(_) => Err(DecodeError::UnsupportedKey("map")),
        _ => Err(DecodeError::UnsupportedKey("unknown")),
    }
}

/// Value of a bignum with the given tag and big-endian magnitude.
fn bignum(tag: u64, magnitude: &[u8]) -> Result<i128, DecodeError> {
    let start = magnitude
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(magnitude.len());
    let digits = &magnitude[start..];
    if digits.len() > 16 {
        return Err(DecodeError::IntegerTooWide(digits.len()));
    }
    let n = digits.iter().fold(0u128, |acc, &b| (acc << 8) | u128::from(b));
    let n = i128::try_from(n).map_err(|_| DecodeError::IntegerTooWide(digits.len()))?;
    Ok(if tag == BIGNUM_NEGATIVE { -1 - n } else { n })
}

/// Encodes an integer that does not fit a CBOR major type 0/1 as a bignum
/// with a minimal magnitude.
fn bignum_value(i: i128) -> Value {
    let (tag, magnitude) = if i < 0 {
        (BIGNUM_NEGATIVE, (-1 - i) as u128)
    } else {
        (BIGNUM_POSITIVE, i as u128)
    };
    let bytes = magnitude.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    Value::Tag(tag, Box::new(Value::Bytes(bytes[start..].to_vec())))
}

/// Encodes a tree as one CBOR data item (definite lengths, fields in tree
/// order). Integers outside `-2^64 ..= 2^64 - 1` are written as bignums.
/// `decode(&encode(n)?)` yields `n` again.
pub fn encode(node: &Node) -> Result<Vec<u8>, EncodeError> {
    let value = to_value(node);
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&value, &mut buf)
        .map_err(|e| EncodeError::Serialize(format!("{:?}", e)))?;
    Ok(buf)
}

fn to_value(node: &Node) -> Value {
    match node {
        Node::Scalar(Scalar::Null) => Value::Null,
        Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
        Node::Scalar(Scalar::Integer(i)) => match Integer::try_from(*i) {
            Ok(int) => Value::Integer(int),
            Err(_) => bignum_value(*i),
        },
        Node::Scalar(Scalar::Float(f)) => Value::Float(*f),
        Node::Scalar(Scalar::String(s)) => Value::Text(s.clone()),
        Node::Scalar(Scalar::Bytes(b)) => Value::Bytes(b.clone()),
        Node::Sequence(items) => Value::Array(items.iter().map(to_value).collect()),
        Node::Mapping(fields) => Value::Map(
            fields
                .iter()
                .map(|(k, v)| (Value::Text(k.clone()), to_value(v)))
                .collect(),
        ),
    }
}
