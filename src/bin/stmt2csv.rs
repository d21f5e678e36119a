//! CLI binary for statement2csv.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use statement2csv::{
    convert_folder, BatchProgressCallback, ConversionConfig, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-statement
/// log lines using [indicatif]. The batch is sequential, so at most one
/// statement is in flight at a time.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Wall-clock start of the statement currently in flight.
    current_start: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");

        Arc::new(Self {
            bar,
            current_start: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.current_start
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_millis() as f64 / 1000.0)
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} statements  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total_files as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} statements…"))
        ));
    }

    fn on_statement_start(&self, _num: usize, _total: usize, name: &str) {
        *self.current_start.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(name.to_string());
    }

    fn on_statement_complete(&self, num: usize, total: usize, name: &str, csv_bytes: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3} {:<24} {}  {}",
            green("✓"),
            num,
            total,
            name,
            dim(&format!("{csv_bytes:>6} bytes")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_statement_error(&self, num: usize, total: usize, name: &str, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3} {:<24} {}  {}",
            red("✗"),
            num,
            total,
            name,
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        let failed = total_files.saturating_sub(converted);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} statements converted successfully",
                green("✔"),
                bold(&converted.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} statements converted  ({} skipped)",
                cyan("⚠"),
                bold(&converted.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert every PDF in ./statements (the default folder)
  stmt2csv

  # Convert a different folder
  stmt2csv ~/Documents/card-statements

  # Use a specific model and a tighter output bound
  stmt2csv --model gpt-4o --max-tokens 4000

  # Machine-readable batch report on stdout
  stmt2csv --json > report.json

OUTPUT:
  Each successfully converted statement <name>.pdf gains a sibling
  <name>.csv in the same folder, containing the model's reply verbatim:
  an account-summary table followed by a categorised transaction table.
  Existing CSVs are overwritten silently.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY     API key for the generation service (required).
                     Also read from a local .env file if present.

SETUP:
  1. Set API key:     export OPENAI_API_KEY=sk-...
  2. Drop PDFs in:    ./statements/
  3. Convert:         stmt2csv
"#;

/// Convert PDF credit-card statements to CSV using a chat-completion model.
#[derive(Parser, Debug)]
#[command(
    name = "stmt2csv",
    version,
    about = "Convert PDF credit-card statements to CSV using a chat-completion model",
    long_about = "Extracts the text of every PDF statement in a folder, asks a \
chat-completion model to reshape it into an account-summary table and a \
categorised transaction table, and writes the reply to a sibling .csv file.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Folder containing the statement PDFs.
    #[arg(default_value = "./statements", env = "STMT2CSV_FOLDER")]
    folder: PathBuf,

    /// Chat-completion model ID.
    #[arg(long, env = "STMT2CSV_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Max tokens the model may generate per statement.
    #[arg(long, env = "STMT2CSV_MAX_TOKENS", default_value_t = 10_000)]
    max_tokens: usize,

    /// Per-request timeout in seconds.
    #[arg(long, env = "STMT2CSV_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Output structured JSON (BatchOutput) on stdout instead of log lines.
    #[arg(long, env = "STMT2CSV_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "STMT2CSV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "STMT2CSV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "STMT2CSV_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load OPENAI_API_KEY and friends from a local .env file, if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let mut builder = ConversionConfig::builder()
        .input_folder(cli.folder.clone())
        .model(cli.model.clone())
        .max_output_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout);
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert_folder(&config).await.context("Conversion failed")?;

    if output.stats.total_files == 0 {
        println!(
            "No PDF statement files found in '{}'.",
            cli.folder.display()
        );
        return Ok(());
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet && !show_progress {
        // Only print inline stats when the progress callback is disabled.
        eprintln!(
            "Converted {}/{} statements in {}ms",
            output.stats.converted, output.stats.total_files, output.stats.total_duration_ms
        );
        if output.stats.failed > 0 {
            eprintln!("  {} statements skipped", output.stats.failed);
        }
    }

    Ok(())
}
