//! # Document - decoded value trees
//!
//! Store values are opaque CBOR blobs. This crate turns one blob into a
//! generic, order-preserving [`Node`] tree and renders trees as YAML.
//!
//! ```text
//!  bytes ──decode()──► Node ──emit()──► YAML text
//!    ▲                  │
//!    └────encode()──────┘
//! ```
//!
//! ## Tree model
//!
//! | Variant             | Holds                                       |
//! |---------------------|---------------------------------------------|
//! | `Scalar::Null`      | explicit null (kept inside maps and arrays) |
//! | `Scalar::Bool`      | `true` / `false`                            |
//! | `Scalar::Integer`   | CBOR integers and bignums, as `i128`        |
//! | `Scalar::Float`     | half/single/double floats, as `f64`         |
//! | `Scalar::String`    | UTF-8 text                                  |
//! | `Scalar::Bytes`     | byte strings (rendered as base64)           |
//! | `Node::Sequence`    | ordered elements                            |
//! | `Node::Mapping`     | ordered, uniquely named fields              |
//!
//! ## Example
//!
//! ```rust
//! use document::{decode, emit_to_string, encode, Node};
//!
//! let tree: Node = vec![("x".to_string(), Node::from(vec![Node::from(1i64)]))]
//!     .into_iter()
//!     .collect();
//! let bytes = encode(&tree).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), tree);
//! assert_eq!(emit_to_string(&tree).unwrap(), "x:\n- 1\n");
//! ```

mod decode;
mod emit;
mod node;

pub use decode::{decode, encode, CborDecoder, DecodeError, Decoder, EncodeError};
pub use emit::{emit, emit_to_string, write_map_comment, EmitError};
pub use node::{Mapping, Node, Scalar};
