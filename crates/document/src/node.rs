//! The generic document tree.

use indexmap::IndexMap;

/// Field name to value, in decoded order.
pub type Mapping = IndexMap<String, Node>;

/// One node of a decoded document.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    /// Ordered elements.
    Sequence(Vec<Node>),
    /// Ordered, uniquely named fields. Never re-sorted.
    Mapping(Mapping),
}

/// Leaf values.
///
/// Integers and floats are distinct variants so `1` and `1.0` never
/// collapse into each other.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    /// The full CBOR integer range (`-2^64 ..= 2^64 - 1`) plus bignums
    /// (tags 2 and 3) that fit `i128`.
    Integer(i128),
    Float(f64),
    String(String),
    /// Raw byte string. Rendered as base64 text.
    Bytes(Vec<u8>),
}

impl Node {
    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    /// An empty mapping.
    pub fn mapping() -> Self {
        Node::Mapping(Mapping::new())
    }

    /// Fields of a mapping node, `None` for other kinds.
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<Scalar> for Node {
    fn from(s: Scalar) -> Self {
        Node::Scalar(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Scalar(Scalar::Integer(i128::from(i)))
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Scalar(Scalar::Float(f))
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(Scalar::String(s))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Sequence(items)
    }
}

impl From<Mapping> for Node {
    fn from(fields: Mapping) -> Self {
        Node::Mapping(fields)
    }
}

impl FromIterator<(String, Node)> for Node {
    /// Builds a mapping; a repeated field name keeps its first position and
    /// takes the last value.
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        Node::Mapping(iter.into_iter().collect())
    }
}
