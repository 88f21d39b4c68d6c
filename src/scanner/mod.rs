//! Input directory scanning.
//!
//! Lists the flat input directory, classifies every file into an episode
//! group candidate, a font attachment, or noise, and trims stray episode
//! numbers with the gap filter.

pub mod classifier;
pub mod filter;

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use classifier::{EpisodeNumber, FileClass, FileClassifier, FontAttachment, MediaFile};
pub use filter::filter_episode_numbers;

/// Errors raised while scanning the input directory.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The input directory could not be listed.
    #[error("failed to read input directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The episode filter was handed an empty list.
    #[error("no episode numbers to filter")]
    NoEpisodes,

    /// A classification pattern failed to compile.
    #[error("invalid classification pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// List the regular files directly inside `dir`, sorted by file name.
///
/// Sub-directories are ignored; flattening them is done before a run.
/// Names that are not valid UTF-8 are skipped with a warning.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_err = |source| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();

        if !path.is_file() {
            debug!("Skipping non-file entry: {:?}", path);
            continue;
        }
        if entry.file_name().to_str().is_none() {
            warn!("Skipping file with non UTF-8 name: {:?}", path);
            continue;
        }

        files.push(path);
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
