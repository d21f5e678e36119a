//! Batch conversion entry points.
//!
//! One call to [`convert_folder`] processes an entire statements folder:
//! scan, then for each PDF in turn extract its text, request the CSV
//! conversion, and write the reply next to the source file. The loop is
//! strictly sequential. One statement's bytes, text, and HTTP request are
//! all dropped before the next statement begins.
//!
//! ## Failure handling
//!
//! Per-statement failures of any kind (vanished file, unextractable
//! document, rejected generation call, unwritable output) are uniform:
//! logged, recorded in the per-file [`StatementResult`], and skipped. The
//! batch only fails outright when it cannot start (bad folder, missing
//! credential) or when every single statement failed.

use crate::config::ConversionConfig;
use crate::error::{FileError, StatementError};
use crate::extract;
use crate::prompt;
use crate::scan;
use crate::service::{GenerationOptions, GenerationService, OpenAiClient};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of one statement within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementResult {
    /// Statement name (source file base name, extension stripped).
    pub name: String,
    /// Path of the source PDF.
    pub pdf_path: PathBuf,
    /// Path of the written CSV; `None` when the statement was skipped.
    pub csv_path: Option<PathBuf>,
    /// Size of the written CSV in bytes; 0 when skipped.
    pub csv_bytes: usize,
    /// Wall-clock time spent on this statement.
    pub duration_ms: u64,
    /// The per-file error when the statement was skipped.
    pub error: Option<FileError>,
}

/// Aggregate counters for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStats {
    /// Statement PDFs found by the scan.
    pub total_files: usize,
    /// Statements whose CSV was written.
    pub converted: usize,
    /// Statements skipped with a per-file error.
    pub failed: usize,
    /// Total wall-clock time for the batch.
    pub total_duration_ms: u64,
}

/// Everything produced by one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// Per-statement outcomes, in processing (sorted file name) order.
    pub results: Vec<StatementResult>,
    /// Aggregate counters.
    pub stats: BatchStats,
}

/// Convert every statement PDF in the configured folder to a CSV sibling.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(BatchOutput)` on success, even if some statements were skipped
/// (check `output.stats.failed`). An empty folder returns an empty output.
///
/// # Errors
/// Returns `Err(StatementError)` only for fatal errors:
/// - Missing credential (checked before any file is touched)
/// - Missing or unreadable statements folder
/// - Every statement failed and no output was produced
pub async fn convert_folder(config: &ConversionConfig) -> Result<BatchOutput, StatementError> {
    let total_start = Instant::now();

    // ── Step 1: Resolve the generation service ───────────────────────────
    // Fails fast on an absent credential, before the folder is even read.
    let service = resolve_service(config)?;

    // ── Step 2: Scan the folder ──────────────────────────────────────────
    let files = scan::scan_folder(&config.input_folder)?;
    if files.is_empty() {
        info!(
            "No statement PDFs found in {}",
            config.input_folder.display()
        );
        return Ok(BatchOutput {
            results: Vec::new(),
            stats: BatchStats {
                total_files: 0,
                converted: 0,
                failed: 0,
                total_duration_ms: total_start.elapsed().as_millis() as u64,
            },
        });
    }

    let total = files.len();
    info!("Converting {} statements one at a time", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    // ── Step 3: Process statements sequentially ──────────────────────────
    let mut results: Vec<StatementResult> = Vec::with_capacity(total);
    for (idx, pdf_path) in files.iter().enumerate() {
        let num = idx + 1;
        let name = scan::statement_name(pdf_path);
        if let Some(ref cb) = config.progress_callback {
            cb.on_statement_start(num, total, &name);
        }

        let start = Instant::now();
        let outcome = process_statement(&service, pdf_path, &name, config).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok((csv_path, csv_bytes)) => {
                info!(
                    "Wrote {} ({} bytes) for statement '{}'",
                    csv_path.display(),
                    csv_bytes,
                    name
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_statement_complete(num, total, &name, csv_bytes);
                }
                results.push(StatementResult {
                    name,
                    pdf_path: pdf_path.clone(),
                    csv_path: Some(csv_path),
                    csv_bytes,
                    duration_ms,
                    error: None,
                });
            }
            Err(err) => {
                warn!("Skipping statement '{}': {}", name, err);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_statement_error(num, total, &name, &err.to_string());
                }
                results.push(StatementResult {
                    name,
                    pdf_path: pdf_path.clone(),
                    csv_path: None,
                    csv_bytes: 0,
                    duration_ms,
                    error: Some(err),
                });
            }
        }
    }

    // ── Step 4: Compute stats ────────────────────────────────────────────
    let converted = results.iter().filter(|r| r.error.is_none()).count();
    let failed = results.len() - converted;

    if converted == 0 {
        let first_error = results
            .iter()
            .find_map(|r| r.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(StatementError::AllStatementsFailed {
            total: results.len(),
            first_error,
        });
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, converted);
    }

    let stats = BatchStats {
        total_files: total,
        converted,
        failed,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Batch complete: {}/{} statements, {}ms total",
        converted, total, stats.total_duration_ms
    );

    Ok(BatchOutput { results, stats })
}

/// Synchronous wrapper around [`convert_folder`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_folder_sync(config: &ConversionConfig) -> Result<BatchOutput, StatementError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| StatementError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(convert_folder(config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the generation service, from most-specific to least-specific.
///
/// 1. **Pre-built service** (`config.service`) — the caller constructed and
///    configured the backend entirely; we use it as-is. This is how tests
///    run the batch loop without a network.
///
/// 2. **Configured key** (`config.api_key`) — an explicit, non-empty key
///    from the config builder.
///
/// 3. **Environment** — `OPENAI_API_KEY`, matching what the hosted service's
///    own tooling reads. Absence is a fatal [`StatementError::MissingApiKey`]
///    here, before any statement is touched, rather than a per-file
///    authentication failure later.
fn resolve_service(
    config: &ConversionConfig,
) -> Result<Arc<dyn GenerationService>, StatementError> {
    if let Some(ref service) = config.service {
        return Ok(Arc::clone(service));
    }

    let api_key = match config.api_key {
        Some(ref key) if !key.is_empty() => key.clone(),
        _ => std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(StatementError::MissingApiKey)?,
    };

    let client = OpenAiClient::new(api_key, config.model.clone(), config.api_timeout_secs)?;
    Ok(Arc::new(client))
}

/// Run one statement through extract → prompt → generate → write.
///
/// Returns the written CSV path and its size. Every failure is a
/// [`FileError`] so the caller records it and moves on.
async fn process_statement(
    service: &Arc<dyn GenerationService>,
    pdf_path: &Path,
    name: &str,
    config: &ConversionConfig,
) -> Result<(PathBuf, usize), FileError> {
    // Extraction is CPU-bound; keep it off the async executor.
    let blocking_path = pdf_path.to_path_buf();
    let statement_text = tokio::task::spawn_blocking(move || extract::extract_text(&blocking_path))
        .await
        .map_err(|e| FileError::Extraction {
            path: pdf_path.to_path_buf(),
            detail: format!("extraction task failed: {e}"),
        })??;

    let user_prompt = prompt::conversion_prompt(&statement_text, name);
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(prompt::DEFAULT_SYSTEM_PROMPT);
    let options = build_options(config);

    let reply = service
        .generate(system_prompt, &user_prompt, &options)
        .await
        .map_err(|e| FileError::Generation {
            name: name.to_string(),
            detail: e.to_string(),
        })?;

    // Truncating write, silent overwrite: re-running the batch replaces any
    // existing CSV without prompting.
    let csv_path = pdf_path.with_extension("csv");
    let csv_content = reply.trim();
    std::fs::write(&csv_path, csv_content.as_bytes()).map_err(|e| FileError::OutputWrite {
        path: csv_path.clone(),
        detail: e.to_string(),
    })?;

    Ok((csv_path, csv_content.len()))
}

/// Build `GenerationOptions` from the conversion config.
fn build_options(config: &ConversionConfig) -> GenerationOptions {
    GenerationOptions {
        temperature: config.temperature,
        max_output_tokens: config.max_output_tokens,
    }
}
