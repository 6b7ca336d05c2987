//! # Config - conversion settings
//!
//! Settings shared by the converter library and the `dbconv` binary.
//!
//! ```text
//! output_suffix   appended to the input path   (default: ".yaml")
//! sync            fsync output before rename   (default: true)
//! ```
//!
//! The output path is the input path with the suffix *appended*, never
//! substituted for an existing extension: `cache.db` becomes
//! `cache.db.yaml`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default suffix appended to every input path.
pub const DEFAULT_OUTPUT_SUFFIX: &str = ".yaml";

/// Errors produced by [`ConvertConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An empty suffix would make the output path equal the input path.
    #[error("output suffix must not be empty")]
    EmptySuffix,

    /// The suffix must name a sibling file, not a path in another directory.
    #[error("output suffix {0:?} must not contain a path separator")]
    SuffixHasSeparator(String),
}

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Appended to each input path to form its output path.
    pub output_suffix: String,
    /// fsync the output file before it is renamed into place.
    pub sync: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            sync: true,
        }
    }
}

impl ConvertConfig {
    /// Returns a config with the given suffix and default everything else.
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            output_suffix: suffix.into(),
            ..Self::default()
        }
    }

    /// Checks that the settings cannot clobber the input file or escape its
    /// directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_suffix.is_empty() {
            return Err(ConfigError::EmptySuffix);
        }
        if self.output_suffix.contains('/') || self.output_suffix.contains('\\') {
            return Err(ConfigError::SuffixHasSeparator(self.output_suffix.clone()));
        }
        Ok(())
    }

    /// Derives the output path for `input` by appending the suffix.
    #[must_use]
    pub fn output_path(&self, input: &Path) -> PathBuf {
        append_to_path(input, &self.output_suffix)
    }
}

/// Appends `suffix` to the last component of `path` as raw text:
/// `cache.db` + `.lock` is `cache.db.lock`.
///
/// Used for every derived file name (output, temp and lock files).
#[must_use]
pub fn append_to_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests;
