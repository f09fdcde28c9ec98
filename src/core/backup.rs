//! Settings directory backups.
//!
//! Streams every file under the settings directory into a deflate
//! compressed zip archive, reporting per-entry progress.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::ProfileError;

/// Progress of a running backup, one event per archived entry.
#[derive(Debug, Clone, Copy)]
pub struct BackupProgress {
    pub processed: usize,
    pub total: usize,
}

impl BackupProgress {
    /// Fraction of entries processed so far, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

/// Archive every file under `source_dir` into a zip at `destination`.
///
/// Relative paths are preserved, with `source_dir` itself flattened as
/// the archive root. On failure the partially written archive is
/// removed rather than left behind truncated.
pub fn create_backup(
    source_dir: &Path,
    destination: &Path,
    mut on_progress: impl FnMut(BackupProgress),
) -> Result<(), ProfileError> {
    info!(
        "Backing up '{}' to '{}'",
        source_dir.display(),
        destination.display()
    );

    let result = write_archive(source_dir, destination, &mut on_progress);
    if result.is_err() {
        if let Err(e) = std::fs::remove_file(destination) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(
                    "Failed to remove partial backup archive '{}': {}",
                    destination.display(),
                    e
                );
            }
        }
    }
    result
}

fn write_archive(
    source_dir: &Path,
    destination: &Path,
    on_progress: &mut impl FnMut(BackupProgress),
) -> Result<(), ProfileError> {
    let entries = collect_files(source_dir)?;
    let total = entries.len();

    let file = File::create(destination).map_err(|e| {
        ProfileError::Archive(format!("cannot create '{}': {e}", destination.display()))
    })?;
    let mut archive = ZipWriter::new(file);
    // Size over speed: backups are infrequent and user initiated.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for (index, path) in entries.iter().enumerate() {
        let relative = path.strip_prefix(source_dir).map_err(|e| {
            ProfileError::Archive(format!("entry outside the source directory: {e}"))
        })?;
        let entry_name = entry_name(relative);

        archive.start_file(entry_name.as_str(), options).map_err(|e| {
            ProfileError::Archive(format!("cannot start entry '{entry_name}': {e}"))
        })?;
        let mut source = File::open(path).map_err(|e| {
            ProfileError::Archive(format!("cannot read '{}': {e}", path.display()))
        })?;
        io::copy(&mut source, &mut archive).map_err(|e| {
            ProfileError::Archive(format!("cannot write entry '{entry_name}': {e}"))
        })?;

        on_progress(BackupProgress {
            processed: index + 1,
            total,
        });
    }

    archive
        .finish()
        .map_err(|e| ProfileError::Archive(format!("cannot finalize the archive: {e}")))?;
    info!("Backup archive complete ({total} entries)");
    Ok(())
}

fn collect_files(source_dir: &Path) -> Result<Vec<PathBuf>, ProfileError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(source_dir).follow_links(false) {
        let entry = entry.map_err(|e| {
            ProfileError::Archive(format!("cannot walk '{}': {e}", source_dir.display()))
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Zip entry names always use forward slashes, regardless of platform.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
