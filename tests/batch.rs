//! Integration tests for the batch loop.
//!
//! These tests run the full scan → extract → prompt → generate → write
//! pipeline against temporary folders, with a scripted [`GenerationService`]
//! standing in for the hosted endpoint. No network access and no API key are
//! required; live-endpoint coverage lives in `tests/e2e.rs`.

use async_trait::async_trait;
use statement2csv::{
    convert_folder, BatchProgressCallback, ConversionConfig, FileError, GenerationOptions,
    GenerationService, StatementError,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Build a minimal one-page PDF whose only content is `text` in Helvetica.
///
/// Offsets in the xref table are computed from the assembled bytes, so the
/// file is structurally valid and `pdf-extract` can read the text back out.
/// `text` must not contain parentheses or backslashes.
fn minimal_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    pdf.push_str("0000000000 65535 f \n");
    for offset in &offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));
    pdf.into_bytes()
}

fn write_statement(dir: &Path, name: &str, body_text: &str) {
    std::fs::write(dir.join(name), minimal_pdf(body_text)).unwrap();
}

/// Scripted generation service: records every prompt it receives and either
/// returns a canned reply or fails for prompts containing `fail_on`.
struct RecordingService {
    reply: String,
    prompts: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingService {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
            fail_on: None,
        })
    }

    fn failing_on(reply: &str, needle: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
            fail_on: Some(needle.to_string()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for RecordingService {
    async fn generate(
        &self,
        _system: &str,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, StatementError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(ref needle) = self.fail_on {
            if prompt.contains(needle) {
                return Err(StatementError::Service {
                    message: "simulated quota failure".into(),
                });
            }
        }
        Ok(self.reply.clone())
    }
}

fn config_with(folder: &Path, service: Arc<RecordingService>) -> ConversionConfig {
    ConversionConfig::builder()
        .input_folder(folder)
        .service(service)
        .build()
        .unwrap()
}

fn csv_files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".csv"))
        .collect();
    names.sort();
    names
}

// ── Empty folder ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_folder_performs_no_writes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"not a statement").unwrap();

    let service = RecordingService::replying("unused");
    let output = convert_folder(&config_with(dir.path(), Arc::clone(&service)))
        .await
        .unwrap();

    assert_eq!(output.stats.total_files, 0);
    assert!(output.results.is_empty());
    assert!(service.prompts().is_empty(), "no request should be sent");
    assert!(csv_files_in(dir.path()).is_empty(), "no CSV should exist");
}

// ── Successful conversion ────────────────────────────────────────────────────

#[tokio::test]
async fn converts_statement_and_writes_trimmed_csv() {
    let dir = tempfile::tempdir().unwrap();
    write_statement(dir.path(), "march.pdf", "Coffee Shop 12.50 groceries 84.20");

    // Padded reply: the written CSV must be the trimmed text.
    let service = RecordingService::replying("  Name, Amount\nTransactions, 2  \n");
    let output = convert_folder(&config_with(dir.path(), Arc::clone(&service)))
        .await
        .unwrap();

    assert_eq!(output.stats.total_files, 1);
    assert_eq!(output.stats.converted, 1);
    assert_eq!(output.stats.failed, 0);

    let csv = std::fs::read_to_string(dir.path().join("march.csv")).unwrap();
    assert_eq!(csv, "Name, Amount\nTransactions, 2");

    let result = &output.results[0];
    assert_eq!(result.name, "march");
    assert_eq!(result.csv_bytes, csv.len());
    assert!(result.error.is_none());

    // The prompt must title Table 2 after the statement and embed its text.
    let prompts = service.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Table 2: march"), "got:\n{}", prompts[0]);
    assert!(
        prompts[0].contains("Coffee"),
        "extracted statement text missing from prompt:\n{}",
        prompts[0]
    );
}

#[tokio::test]
async fn rerun_overwrites_existing_csv_silently() {
    let dir = tempfile::tempdir().unwrap();
    write_statement(dir.path(), "march.pdf", "Gas Station 40.00");
    std::fs::write(dir.path().join("march.csv"), b"stale output").unwrap();

    let service = RecordingService::replying("fresh output");
    convert_folder(&config_with(dir.path(), service))
        .await
        .unwrap();

    let csv = std::fs::read_to_string(dir.path().join("march.csv")).unwrap();
    assert_eq!(csv, "fresh output");
}

// ── Per-file failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn unextractable_file_is_skipped_and_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.pdf"), b"not a portable document").unwrap();
    write_statement(dir.path(), "march.pdf", "Rent 1500.00");

    let service = RecordingService::replying("csv body");
    let output = convert_folder(&config_with(dir.path(), Arc::clone(&service)))
        .await
        .unwrap();

    assert_eq!(output.stats.total_files, 2);
    assert_eq!(output.stats.converted, 1);
    assert_eq!(output.stats.failed, 1);

    let broken = output
        .results
        .iter()
        .find(|r| r.name == "broken")
        .expect("broken.pdf must appear in the results");
    assert!(matches!(broken.error, Some(FileError::Extraction { .. })));
    assert!(broken.csv_path.is_none());

    assert_eq!(csv_files_in(dir.path()), vec!["march.csv"]);
}

#[tokio::test]
async fn generation_failure_skips_file_and_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    write_statement(dir.path(), "april.pdf", "Taxi 18.00");
    write_statement(dir.path(), "march.pdf", "Cinema 24.00");

    // Sorted order puts april first; its failure must not stop march.
    let service = RecordingService::failing_on("csv body", "Table 2: april");
    let output = convert_folder(&config_with(dir.path(), Arc::clone(&service)))
        .await
        .unwrap();

    assert_eq!(output.stats.converted, 1);
    assert_eq!(output.stats.failed, 1);
    assert_eq!(service.prompts().len(), 2, "both statements must be attempted");

    let april = output.results.iter().find(|r| r.name == "april").unwrap();
    assert!(matches!(april.error, Some(FileError::Generation { .. })));

    assert_eq!(csv_files_in(dir.path()), vec!["march.csv"]);
}

#[tokio::test]
async fn generation_failure_leaves_earlier_outputs_untouched() {
    let dir = tempfile::tempdir().unwrap();
    write_statement(dir.path(), "april.pdf", "Groceries 92.10");
    write_statement(dir.path(), "march.pdf", "Restaurant 55.00");

    // april succeeds first; march fails afterwards.
    let service = RecordingService::failing_on("april table", "Table 2: march");
    convert_folder(&config_with(dir.path(), service))
        .await
        .unwrap();

    let april_csv = std::fs::read_to_string(dir.path().join("april.csv")).unwrap();
    assert_eq!(april_csv, "april table");
    assert!(!dir.path().join("march.csv").exists());
}

#[tokio::test]
async fn all_statements_failing_is_a_batch_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("one.pdf"), b"garbage").unwrap();
    std::fs::write(dir.path().join("two.pdf"), b"more garbage").unwrap();

    let service = RecordingService::replying("unused");
    let err = convert_folder(&config_with(dir.path(), service))
        .await
        .unwrap_err();

    match err {
        StatementError::AllStatementsFailed { total, first_error } => {
            assert_eq!(total, 2);
            assert!(
                first_error.contains("could not extract text"),
                "got: {first_error}"
            );
        }
        other => panic!("expected AllStatementsFailed, got: {other:?}"),
    }
}

// ── Fatal errors ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_folder_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-folder");

    let service = RecordingService::replying("unused");
    let config = ConversionConfig::builder()
        .input_folder(&missing)
        .service(service)
        .build()
        .unwrap();

    let err = convert_folder(&config).await.unwrap_err();
    assert!(matches!(err, StatementError::FolderNotFound { .. }));
}

#[tokio::test]
async fn missing_api_key_fails_before_touching_the_folder() {
    if std::env::var("OPENAI_API_KEY").is_ok() {
        println!("SKIP — OPENAI_API_KEY is set in this environment");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-folder");

    // No injected service and no key: the credential check must fire first,
    // even though the folder is also missing.
    let config = ConversionConfig::builder()
        .input_folder(&missing)
        .build()
        .unwrap();

    let err = convert_folder(&config).await.unwrap_err();
    assert!(matches!(err, StatementError::MissingApiKey), "got: {err:?}");
}

// ── Sync wrapper ─────────────────────────────────────────────────────────────

#[test]
fn convert_folder_sync_runs_outside_a_runtime() {
    let dir = tempfile::tempdir().unwrap();
    write_statement(dir.path(), "march.pdf", "Parking 9.00");

    let service = RecordingService::replying("Name, Amount");
    let output =
        statement2csv::convert_folder_sync(&config_with(dir.path(), service)).unwrap();

    assert_eq!(output.stats.converted, 1);
    assert!(dir.path().join("march.csv").exists());
}

// ── Progress callbacks ───────────────────────────────────────────────────────

#[tokio::test]
async fn progress_callbacks_fire_per_statement() {
    struct TestCallback {
        batch_total: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        batch_converted: AtomicUsize,
    }

    impl BatchProgressCallback for TestCallback {
        fn on_batch_start(&self, total_files: usize) {
            self.batch_total.store(total_files, Ordering::SeqCst);
        }
        fn on_statement_start(&self, _num: usize, _total: usize, _name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_statement_complete(&self, _num: usize, _total: usize, _name: &str, _bytes: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
        fn on_statement_error(&self, _num: usize, _total: usize, _name: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_batch_complete(&self, _total_files: usize, converted: usize) {
            self.batch_converted.store(converted, Ordering::SeqCst);
        }
    }

    let dir = tempfile::tempdir().unwrap();
    write_statement(dir.path(), "march.pdf", "Bus Pass 60.00");
    std::fs::write(dir.path().join("broken.pdf"), b"garbage").unwrap();

    let callback = Arc::new(TestCallback {
        batch_total: AtomicUsize::new(0),
        starts: AtomicUsize::new(0),
        completes: AtomicUsize::new(0),
        errors: AtomicUsize::new(0),
        batch_converted: AtomicUsize::new(0),
    });

    let service = RecordingService::replying("csv body");
    let config = ConversionConfig::builder()
        .input_folder(dir.path())
        .service(service)
        .progress_callback(Arc::clone(&callback) as Arc<dyn BatchProgressCallback>)
        .build()
        .unwrap();

    convert_folder(&config).await.unwrap();

    assert_eq!(callback.batch_total.load(Ordering::SeqCst), 2);
    assert_eq!(callback.starts.load(Ordering::SeqCst), 2);
    assert_eq!(callback.completes.load(Ordering::SeqCst), 1);
    assert_eq!(callback.errors.load(Ordering::SeqCst), 1);
    assert_eq!(callback.batch_converted.load(Ordering::SeqCst), 1);
}
