use clap::Parser;
use config::{ConvertConfig, DEFAULT_OUTPUT_SUFFIX};
use std::path::PathBuf;

/// Convert store files into YAML files.
#[derive(Debug, Parser)]
#[command(name = "dbconv", version)]
pub struct Args {
    /// Store files to convert, in order.
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Appended to each input path to name its output file.
    #[arg(long, default_value = DEFAULT_OUTPUT_SUFFIX, value_name = "SUFFIX")]
    pub suffix: String,

    /// Do not fsync output files before renaming them into place.
    #[arg(long)]
    pub no_sync: bool,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn config(&self) -> ConvertConfig {
        ConvertConfig {
            output_suffix: self.suffix.clone(),
            sync: !self.no_sync,
        }
    }
}
