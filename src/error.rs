//! Error types for the statement2csv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`StatementError`] — **Fatal**: the batch cannot proceed at all
//!   (missing statements folder, no API credential, invalid configuration).
//!   Returned as `Err(StatementError)` from the top-level `convert_folder*`
//!   functions.
//!
//! * [`FileError`] — **Non-fatal**: a single statement failed (file vanished,
//!   unextractable PDF, rejected generation call) but the rest of the batch
//!   is fine. Stored inside [`crate::convert::StatementResult`] so callers
//!   can inspect partial success rather than losing the whole run to one bad
//!   file.
//!
//! The separation lets callers decide their own tolerance: abort on the first
//! skipped statement, log and continue, or collect all errors for a post-run
//! report.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the statement2csv library.
///
/// Per-statement failures use [`FileError`] and are stored in
/// [`crate::convert::StatementResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum StatementError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The statements folder does not exist.
    #[error("statements folder not found: '{path}'\nCreate the folder or point the tool at an existing one.")]
    FolderNotFound { path: PathBuf },

    /// The statements folder exists but could not be listed.
    #[error("failed to read statements folder '{path}': {source}")]
    FolderUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No credential was configured and `OPENAI_API_KEY` is unset.
    #[error("no API key configured.\nSet OPENAI_API_KEY (or put it in a local .env file).")]
    MissingApiKey,

    // ── Generation service errors ─────────────────────────────────────────
    /// The generation service rejected the credential (401/403).
    #[error("authentication rejected by the generation service: {detail}")]
    Auth { detail: String },

    /// The generation call failed (network, quota, malformed response).
    #[error("generation service error: {message}")]
    Service { message: String },

    // ── Batch errors ──────────────────────────────────────────────────────
    /// Every scanned statement failed; no output was produced.
    #[error("all {total} statements failed.\nFirst error: {first_error}")]
    AllStatementsFailed { total: usize, first_error: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single statement.
///
/// Stored in [`crate::convert::StatementResult`] when a statement is skipped.
/// The batch continues unless ALL statements fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The file disappeared between listing and opening.
    #[error("statement file not found: '{path}'")]
    NotFound { path: PathBuf },

    /// The file could not be read or its text could not be extracted.
    #[error("could not extract text from '{path}': {detail}")]
    Extraction { path: PathBuf, detail: String },

    /// The generation call for this statement failed.
    #[error("generation failed for statement '{name}': {detail}")]
    Generation { name: String, detail: String },

    /// The CSV sibling file could not be written.
    #[error("failed to write output file '{path}': {detail}")]
    OutputWrite { path: PathBuf, detail: String },
}
