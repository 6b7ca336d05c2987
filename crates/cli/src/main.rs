//! # dbconv - store to YAML converter
//!
//! Converts each store file given on the command line into a YAML file next
//! to it. Paths are handled one after another; a failing path is reported
//! and the rest are still converted.
//!
//! ## Usage
//!
//! ```text
//! dbconv [--suffix .yaml] [--no-sync] [-v|-vv] <PATH>...
//!
//! --suffix <S>   appended to each input path to name its output (default ".yaml")
//! --no-sync      skip fsync before publishing the output
//! -v, -vv        raise log verbosity (info, debug); RUST_LOG overrides
//! ```
//!
//! ## Output
//!
//! One line per path. Successes go to stdout, failures (with the full error
//! chain) to stderr; logs also go to stderr.
//!
//! ```text
//! $ dbconv cache.db missing.db
//! OK cache.db -> cache.db.yaml (2 maps, 17 entries)
//! ERR missing.db: cannot open input missing.db: cannot open store missing.db: No such file or directory (os error 2)
//! $ echo $?
//! 1
//! ```

mod args;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use convert::Converter;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let converter = Converter::new(args.config()).context("invalid arguments")?;

    let mut failed = 0usize;
    for outcome in converter.convert_all(&args.paths) {
        match outcome.result {
            Ok(report) => println!(
                "OK {} -> {} ({} maps, {} entries)",
                report.input.display(),
                report.output.display(),
                report.maps.len(),
                report.entry_count()
            ),
            Err(e) => {
                failed += 1;
                eprintln!("ERR {}: {:#}", outcome.input.display(), anyhow::Error::new(e));
            }
        }
    }

    if failed > 0 {
        tracing::info!(failed, total = args.paths.len(), "some paths failed");
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
