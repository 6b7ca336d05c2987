//! Crash-safe publishing of output files.

use std::fs::{self, rename, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use store::tmp_path;

use crate::error::ConvertError;

/// Writes `path` through a temp file.
///
/// `fill` writes the whole content into `<path>.tmp`. Only if it succeeds
/// is the file flushed, optionally fsynced, and renamed over `path`. On any
/// failure the temp file is removed and an existing `path` is left as it
/// was, so a reader never sees truncated output.
pub(crate) fn write_atomically<F>(path: &Path, sync: bool, fill: F) -> Result<(), ConvertError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), ConvertError>,
{
    let tmp = tmp_path(path);
    let result = write_and_rename(path, &tmp, sync, fill);
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_and_rename<F>(path: &Path, tmp: &Path, sync: bool, fill: F) -> Result<(), ConvertError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), ConvertError>,
{
    let publish = |source| ConvertError::Publish {
        path: path.to_path_buf(),
        source,
    };

    let raw_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp)
        .map_err(publish)?;
    let mut file = BufWriter::new(raw_file);

    fill(&mut file)?;

    file.flush().map_err(publish)?;
    let raw_file = file.into_inner().map_err(|e| publish(e.into_error()))?;
    if sync {
        raw_file.sync_all().map_err(publish)?;
    }
    drop(raw_file);

    rename(tmp, path).map_err(publish)?;

    if sync {
        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
    }

    Ok(())
}
