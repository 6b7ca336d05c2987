use config::ConfigError;
use document::{DecodeError, EmitError};
use std::io;
use std::path::PathBuf;
use store::StoreError;
use thiserror::Error;

/// Why converting one input path failed.
///
/// Every variant aborts the current path only; the batch carries on with
/// the next one.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    /// The store is missing, locked, or not a store file.
    #[error("cannot open input {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("cannot list maps")]
    List(#[source] StoreError),

    /// A listed map could not be found when iterated.
    #[error("map {map:?} not found")]
    MapNotFound { map: String },

    /// An entry could not be read (corrupt record, I/O failure).
    #[error("cannot read map {map:?}")]
    Read {
        map: String,
        #[source]
        source: StoreError,
    },

    #[error("cannot decode value of key {key:?} in map {map:?}")]
    Decode {
        map: String,
        key: String,
        #[source]
        source: DecodeError,
    },

    #[error("cannot write output")]
    Emit(#[from] EmitError),

    /// Creating, syncing or renaming the output file failed.
    #[error("cannot publish output {}", path.display())]
    Publish {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
