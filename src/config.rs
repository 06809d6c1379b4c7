//! Configuration types for OCR processing.
//!
//! Everything a run needs (service endpoint, credentials, output location,
//! write strategy) lives in [`OcrConfig`], built via [`OcrConfigBuilder`].
//! The persisted credential file is a separate concern, see
//! [`crate::settings::ConfigStore`].

use crate::backend::OcrBackend;
use crate::error::OcrError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default Mistral API root.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Default OCR model.
pub const DEFAULT_MODEL: &str = "mistral-ocr-latest";

/// Configuration for processing a file.
///
/// # Example
/// ```rust
/// use ocr2md::OcrConfig;
///
/// let config = OcrConfig::builder()
///     .api_key("sk-test")
///     .output_root("/tmp/ocr")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "mistral-ocr-latest");
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// API key for the OCR service. Required unless `backend` is set.
    pub api_key: Option<String>,

    /// Service API root. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// OCR model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Lifetime of the signed download URL handed to the OCR endpoint, in
    /// hours. Default: 1.
    ///
    /// The URL is consumed within seconds of being issued; one hour is the
    /// shortest lifetime the service accepts.
    pub signed_url_expiry_hours: u32,

    /// Whole-request HTTP timeout in seconds. Default: 300.
    ///
    /// Recognition of a long PDF is a single synchronous call on the service
    /// side and can take minutes.
    pub request_timeout_secs: u64,

    /// Directory under which `results_pdf/` and `results_image/` are created.
    /// Default: empty (the current working directory), so returned paths are
    /// relative, e.g. `results_pdf`.
    pub output_root: PathBuf,

    /// Write each output file to a temp file and rename it into place.
    /// Default: true.
    pub atomic_writes: bool,

    /// Pre-constructed OCR backend. Takes precedence over `api_key`.
    pub backend: Option<Arc<dyn OcrBackend>>,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            signed_url_expiry_hours: 1,
            request_timeout_secs: 300,
            output_root: PathBuf::new(),
            atomic_writes: true,
            backend: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("signed_url_expiry_hours", &self.signed_url_expiry_hours)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("output_root", &self.output_root)
            .field("atomic_writes", &self.atomic_writes)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProcessProgressCallback>"),
            )
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OcrConfig`].
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl fmt::Debug for OcrConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl OcrConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn signed_url_expiry_hours(mut self, hours: u32) -> Self {
        self.config.signed_url_expiry_hours = hours.max(1);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.output_root = root.into();
        self
    }

    pub fn atomic_writes(mut self, v: bool) -> Self {
        self.config.atomic_writes = v;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn OcrBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, OcrError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(OcrError::InvalidConfig(format!(
                "base URL must be an http(s) URL, got '{}'",
                c.base_url
            )));
        }
        if c.model.trim().is_empty() {
            return Err(OcrError::InvalidConfig("model must not be empty".into()));
        }
        if c.request_timeout_secs == 0 {
            return Err(OcrError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
