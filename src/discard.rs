//! Discard lists: the reviewed checkpoint between `collect` and `clean`.
//!
//! A reviewer may delete rows from a saved list to keep those items. Loading
//! only projects the remaining ids, so a removed row and a row the classifier
//! never wrote are indistinguishable.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tempfile::NamedTempFile;

use crate::error::{CurateError, Result};
use crate::model::{DiscardEntry, ItemId};

pub type IdSet = HashSet<ItemId>;

#[derive(Deserialize)]
struct IdOnly {
    id: ItemId,
}

/// A fully written discard list not yet moved to its final path.
/// Dropping it without [`StagedList::commit`] leaves the target untouched.
pub struct StagedList {
    file: NamedTempFile,
    path: PathBuf,
}

impl StagedList {
    /// Renames the staged file over the target, replacing any previous run.
    pub fn commit(self) -> Result<PathBuf> {
        self.file.persist(&self.path).map_err(|err| err.error)?;
        Ok(self.path)
    }
}

/// Writes `entries` as a pretty JSON array into a temp file next to `path`.
pub fn stage_discard_list(path: &Path, entries: &[DiscardEntry]) -> Result<StagedList> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, entries)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    Ok(StagedList {
        file,
        path: path.to_path_buf(),
    })
}

/// Writes `entries` as a pretty JSON array, replacing any previous file.
pub fn save_discard_list(path: &Path, entries: &[DiscardEntry]) -> Result<()> {
    stage_discard_list(path, entries)?.commit()?;
    Ok(())
}

/// Reads a discard list and keeps only its ids. A missing file is fatal.
pub fn load_discard_ids(path: &Path) -> Result<IdSet> {
    if !path.is_file() {
        return Err(CurateError::MissingArtifact(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let rows: Vec<IdOnly> = serde_json::from_reader(BufReader::new(file))?;
    Ok(rows.into_iter().map(|row| row.id).collect())
}
