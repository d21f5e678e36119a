//! Progress-callback trait for per-statement batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the batch loop works through the folder. The CLI uses this to
//! drive a terminal progress bar; library callers can forward events to a
//! channel, a log, or a UI without the library knowing anything about how
//! the host application communicates.
//!
//! # Example
//!
//! ```rust
//! use statement2csv::{BatchProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_statement_complete(&self, num: usize, total: usize, name: &str, csv_bytes: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{num}/{total} {name} done ({csv_bytes} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch loop as it works through the statement folder.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The loop is strictly sequential, so no two methods
/// are ever called concurrently; `Send + Sync` is still required because the
/// callback crosses the async boundary of the orchestrator.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after scanning, before any statement is processed.
    ///
    /// Not called when the scan finds nothing to do.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a statement's text is extracted.
    ///
    /// `num` is 1-indexed within the sorted batch.
    fn on_statement_start(&self, num: usize, total: usize, name: &str) {
        let _ = (num, total, name);
    }

    /// Called when a statement's CSV has been written.
    ///
    /// `csv_bytes` is the size of the written output file.
    fn on_statement_complete(&self, num: usize, total: usize, name: &str, csv_bytes: usize) {
        let _ = (num, total, name, csv_bytes);
    }

    /// Called when a statement is skipped with a per-file error.
    fn on_statement_error(&self, num: usize, total: usize, name: &str, error: &str) {
        let _ = (num, total, name, error);
    }

    /// Called once after every statement has been attempted.
    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        let _ = (total_files, converted);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
