//! # Convert - store to YAML conversion
//!
//! Ties the [`store`] and [`document`] crates together: every map of a
//! store becomes one YAML section, introduced by a `# Map: <name>` line.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐  (key, bytes)  ┌─────────────┐  Node  ┌────────────┐  text
//! │ MapSource    │ ─────────────► │ Decoder     │ ─────► │ emit()     │ ─────► <input><suffix>.tmp
//! │ (StoreReader)│                │ (CborDecoder)│       │ serde_yaml │              │
//! └──────────────┘                └─────────────┘        └────────────┘              │ rename on success
//!                                                                                    ▼
//!                                                                           <input><suffix>
//! ```
//!
//! For each map, in the store's order, all entries are decoded into one
//! mapping (keys in store order) before anything is written, so a decode
//! failure never leaves a half-written section. The output file itself is
//! only published once every map succeeded.
//!
//! ## Example output
//!
//! ```text
//! # Map: settings
//! a: true
//! b: 42
//! ```

mod error;
mod output;

use config::ConvertConfig;
use document::{emit, write_map_comment, CborDecoder, Decoder, Mapping, Node};
use std::io::Write;
use std::path::{Path, PathBuf};
use store::{MapSource, StoreError, StoreReader};
use tracing::{debug, info, warn};

pub use error::ConvertError;

/// What was written for one map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSummary {
    pub name: String,
    pub entries: usize,
}

/// Result of a successful conversion of one input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Maps in the order they were written.
    pub maps: Vec<MapSummary>,
}

impl ConversionReport {
    /// Total entries across all maps.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.maps.iter().map(|m| m.entries).sum()
    }
}

/// Outcome for one path of a batch.
#[derive(Debug)]
pub struct PathOutcome {
    pub input: PathBuf,
    pub result: Result<ConversionReport, ConvertError>,
}

/// Converts stores into YAML files.
///
/// Generic over the value [`Decoder`]; [`Converter::new`] uses CBOR.
pub struct Converter<D = CborDecoder> {
    config: ConvertConfig,
    decoder: D,
}

impl Converter<CborDecoder> {
    /// Creates a CBOR converter after validating `config`.
    pub fn new(config: ConvertConfig) -> Result<Self, ConvertError> {
        Self::with_decoder(config, CborDecoder)
    }
}

impl<D: Decoder> Converter<D> {
    /// Creates a converter with a custom value decoder.
    pub fn with_decoder(config: ConvertConfig, decoder: D) -> Result<Self, ConvertError> {
        config.validate()?;
        Ok(Self { config, decoder })
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Converts every path in order. A failing path is reported in its
    /// [`PathOutcome`] and does not stop the others.
    pub fn convert_all<I, P>(&self, inputs: I) -> Vec<PathOutcome>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        inputs
            .into_iter()
            .map(|input| {
                let input = input.as_ref().to_path_buf();
                let result = self.convert_file(&input);
                if let Err(e) = &result {
                    warn!(input = %input.display(), error = %e, "conversion failed");
                }
                PathOutcome { input, result }
            })
            .collect()
    }

    /// Converts one store file into `<input><suffix>`.
    ///
    /// The store is opened before the output is touched, so an unreadable
    /// input never creates or replaces an output file. The store handle is
    /// released on every exit path.
    ///
    /// # Errors
    ///
    /// [`ConvertError::Open`] if the store cannot be opened; any other
    /// variant if a map cannot be read, decoded or written.
    pub fn convert_file<P: AsRef<Path>>(&self, input: P) -> Result<ConversionReport, ConvertError> {
        let input = input.as_ref();
        let output = self.config.output_path(input);
        info!(input = %input.display(), output = %output.display(), "converting store");

        let store = StoreReader::open(input).map_err(|source| ConvertError::Open {
            path: input.to_path_buf(),
            source,
        })?;

        let mut maps = Vec::new();
        output::write_atomically(&output, self.config.sync, |out| {
            maps = self.convert_source(&store, out)?;
            Ok(())
        })?;
        drop(store);

        info!(output = %output.display(), maps = maps.len(), "published output");

        Ok(ConversionReport {
            input: input.to_path_buf(),
            output,
            maps,
        })
    }

    /// Writes every map of `source` to `out`: a `# Map: <name>` line, then
    /// the map's document.
    pub fn convert_source<S, W>(&self, source: &S, out: &mut W) -> Result<Vec<MapSummary>, ConvertError>
    where
        S: MapSource + ?Sized,
        W: Write,
    {
        let names = source.map_names().map_err(ConvertError::List)?;
        let mut summaries = Vec::with_capacity(names.len());

        for name in names {
            let document = self.build_document(source, &name)?;
            let entries = document.as_mapping().map_or(0, |m| m.len());

            write_map_comment(out, &name)?;
            emit(&document, out)?;

            debug!(map = %name, entries, "converted map");
            summaries.push(MapSummary { name, entries });
        }

        Ok(summaries)
    }

    /// Decodes every entry of `map` into one mapping whose fields are the
    /// entry keys, in the source's key order.
    ///
    /// Stops at the first entry that cannot be read or decoded.
    pub fn build_document<S>(&self, source: &S, map: &str) -> Result<Node, ConvertError>
    where
        S: MapSource + ?Sized,
    {
        let read_error = |source: StoreError| ConvertError::Read {
            map: map.to_string(),
            source,
        };

        let entries = source.entries(map).map_err(|e| match e {
            StoreError::MapNotFound(_) => ConvertError::MapNotFound {
                map: map.to_string(),
            },
            other => read_error(other),
        })?;

        let mut fields = Mapping::new();
        for entry in entries {
            let (key, value) = entry.map_err(read_error)?;
            let node = self
                .decoder
                .decode(&value)
                .map_err(|source| ConvertError::Decode {
                    map: map.to_string(),
                    key: key.clone(),
                    source,
                })?;
            if fields.contains_key(&key) {
                return Err(read_error(StoreError::Corrupt(format!(
                    "duplicate key {:?}",
                    key
                ))));
            }
            fields.insert(key, node);
        }

        Ok(Node::Mapping(fields))
    }
}

#[cfg(test)]
mod tests;
