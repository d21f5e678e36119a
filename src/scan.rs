//! Directory scanning: find the statement PDFs to convert.
//!
//! The scanner is deliberately dumb: it matches on the `.pdf` name suffix
//! only (case-sensitive), without opening or sniffing any file. A directory
//! entry that merely looks like a PDF is handed to the extractor, whose
//! per-file error handling deals with it. Matches are sorted by file name so
//! processing order and console output are stable across platforms.

use crate::error::StatementError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix that marks a folder entry as a statement document.
pub const STATEMENT_EXTENSION: &str = ".pdf";

/// List the statement PDFs in `folder`, sorted by file name.
///
/// Returns an empty vector when the folder exists but holds no matching
/// entries; the caller decides how to report that.
///
/// # Errors
/// - [`StatementError::FolderNotFound`] if the folder does not exist
/// - [`StatementError::FolderUnreadable`] for any other listing failure
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>, StatementError> {
    let entries = std::fs::read_dir(folder).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StatementError::FolderNotFound {
                path: folder.to_path_buf(),
            }
        } else {
            StatementError::FolderUnreadable {
                path: folder.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StatementError::FolderUnreadable {
            path: folder.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(STATEMENT_EXTENSION));
        if matches {
            files.push(path);
        }
    }

    files.sort();
    debug!("Found {} statement PDFs in {}", files.len(), folder.display());
    Ok(files)
}

/// Derive the statement name from a PDF path: the base name with the
/// extension stripped.
///
/// The name doubles as the second table's title in the generation request
/// and as the stem of the output CSV file.
pub fn statement_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
