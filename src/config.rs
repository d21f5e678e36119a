//! Configuration types for statement-to-CSV conversion.
//!
//! All batch behaviour is controlled through [`ConversionConfig`], built via
//! its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config between the CLI and library callers and to see
//! in one place what a run will do.
//!
//! The builder validates once, up front: a config that builds successfully
//! will not fail later for configuration reasons. The API credential is the
//! exception by design. It is resolved when the generation service is
//! constructed (before any file is touched) so that `ConversionConfig::default()`
//! stays infallible and tests can inject a [`GenerationService`] without any
//! key at all.

use crate::error::StatementError;
use crate::progress::ProgressCallback;
use crate::service::GenerationService;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Folder scanned for statement PDFs when none is configured.
pub const DEFAULT_INPUT_FOLDER: &str = "./statements";

/// Chat-completion model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for one conversion batch.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use statement2csv::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .input_folder("./statements")
///     .model("gpt-4o-mini")
///     .max_output_tokens(10_000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Folder containing the statement PDFs. Default: `./statements`.
    ///
    /// Output CSVs are written next to their source PDFs in this folder.
    pub input_folder: PathBuf,

    /// Chat-completion model identifier. Default: `gpt-4o-mini`.
    pub model: String,

    /// API key for the generation service.
    ///
    /// If `None`, the `OPENAI_API_KEY` environment variable is read when the
    /// service is constructed. An absent credential fails the run before any
    /// statement is processed.
    pub api_key: Option<String>,

    /// Upper bound on tokens the service may generate per statement.
    /// Default: 10 000.
    ///
    /// A dense statement produces two full tables; 10 000 tokens covers even
    /// long statements without truncating the second table mid-row.
    pub max_output_tokens: usize,

    /// Sampling temperature for the generation call. Default: 0.0.
    ///
    /// Zero keeps repeated runs on identical input near-identical, modulo
    /// service-side nondeterminism.
    pub temperature: f32,

    /// Per-request timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Custom system instruction. If `None`, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Pre-constructed generation service. Takes precedence over `api_key`
    /// and `model`; the main injection point for tests.
    pub service: Option<Arc<dyn GenerationService>>,

    /// Progress callback fired per statement. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::from(DEFAULT_INPUT_FOLDER),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            max_output_tokens: 10_000,
            temperature: 0.0,
            api_timeout_secs: 120,
            system_prompt: None,
            service: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("input_folder", &self.input_folder)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_output_tokens", &self.max_output_tokens)
            .field("temperature", &self.temperature)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("system_prompt", &self.system_prompt)
            .field("service", &self.service.as_ref().map(|_| "<dyn GenerationService>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn input_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.config.input_folder = folder.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn service(mut self, service: Arc<dyn GenerationService>) -> Self {
        self.config.service = Some(service);
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, StatementError> {
        let c = &self.config;
        if c.max_output_tokens == 0 {
            return Err(StatementError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if c.model.is_empty() {
            return Err(StatementError::InvalidConfig(
                "model must not be empty".into(),
            ));
        }
        if c.input_folder.as_os_str().is_empty() {
            return Err(StatementError::InvalidConfig(
                "input_folder must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
