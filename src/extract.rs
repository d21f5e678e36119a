//! Text extraction: turn one statement PDF into a single string.
//!
//! Thin wrapper over the `pdf-extract` crate, which walks the document's
//! pages in order and concatenates their text. The resulting string carries
//! no structure; it is opaque input for the prompt builder and is dropped as
//! soon as the statement has been processed.
//!
//! Both failure modes are per-file and recoverable by the caller:
//!
//! * [`FileError::NotFound`] — the file vanished between the directory
//!   listing and the open. Distinct so callers can report it as a race
//!   rather than a corrupt document.
//! * [`FileError::Extraction`] — everything else: unreadable file,
//!   zero-byte file, non-PDF bytes, corrupt structure.

use crate::error::FileError;
use std::path::Path;
use tracing::debug;

/// Extract the concatenated page text of the PDF at `path`.
///
/// CPU-bound and blocking; the orchestrator runs it under
/// `tokio::task::spawn_blocking`.
pub fn extract_text(path: &Path) -> Result<String, FileError> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FileError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            FileError::Extraction {
                path: path.to_path_buf(),
                detail: e.to_string(),
            }
        }
    })?;

    let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| FileError::Extraction {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    debug!(
        "Extracted {} chars from {}",
        text.len(),
        path.display()
    );
    Ok(text)
}
