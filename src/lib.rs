//! # statement2csv
//!
//! Convert PDF credit-card statements to CSV using a chat-completion model.
//!
//! ## Why this crate?
//!
//! Every card issuer formats statements differently, so hand-written parsers
//! rot as soon as a layout changes. Instead this crate extracts each
//! statement's raw text and asks a text-generation model to reshape it into
//! two fixed tables (an account summary and a categorised transaction list),
//! writing the reply verbatim next to the source PDF. The model's output is
//! deliberately not validated; the tool is a converter, not an accountant.
//!
//! ## Pipeline Overview
//!
//! ```text
//! statements/*.pdf
//!  │
//!  ├─ 1. Scan      list the folder, keep ".pdf" entries, sort by name
//!  ├─ 2. Extract   page text via pdf-extract (CPU-bound, spawn_blocking)
//!  ├─ 3. Prompt    fixed two-table instruction + statement text
//!  ├─ 4. Generate  one chat-completion call per statement, temperature 0
//!  └─ 5. Write     <base>.csv sibling file, silent overwrite
//! ```
//!
//! Processing is strictly sequential: one statement at a time, one request
//! in flight. A statement that fails (vanished file, unextractable PDF,
//! rejected API call) is logged and skipped; the batch only errors when it
//! cannot start at all or when every statement failed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use statement2csv::{convert_folder, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENAI_API_KEY from the environment.
//!     let config = ConversionConfig::default();
//!     let output = convert_folder(&config).await?;
//!     println!(
//!         "{}/{} statements converted",
//!         output.stats.converted, output.stats.total_files
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `stmt2csv` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! statement2csv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod progress;
pub mod prompt;
pub mod scan;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, DEFAULT_INPUT_FOLDER, DEFAULT_MODEL};
pub use convert::{convert_folder, convert_folder_sync, BatchOutput, BatchStats, StatementResult};
pub use error::{FileError, StatementError};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use service::{GenerationOptions, GenerationService, OpenAiClient};
