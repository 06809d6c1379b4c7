//! Error types for the ocr2md library.
//!
//! A single fatal error type, [`OcrError`], is returned by every fallible
//! operation. Each variant belongs to one [`ErrorKind`] so front ends can
//! decide how to present a failure without matching on every variant:
//!
//! * **Input** — the file is missing, unreadable or of an unsupported type.
//!   Raised before any network call or filesystem write.
//! * **RemoteService** — anything the OCR service (or the transport to it)
//!   rejected. Never retried.
//! * **Filesystem** — a directory or output file could not be created.
//!   Partial output may remain on disk.
//! * **Output** — the service answered, but the answer cannot be written
//!   (no pages, undecodable image payload).
//! * **Config** — the credential file could not be persisted.

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of an [`OcrError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    RemoteService,
    Filesystem,
    Output,
    Config,
    Internal,
}

/// All fatal errors returned by the ocr2md library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path (or is not a regular file).
    #[error("File not found: '{path}'\nCheck the path exists and is a regular file.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file extension is not one the OCR service accepts.
    #[error("Unsupported file type '{extension}' for '{path}'. Supported types: .pdf, .jpg, .jpeg, .png")]
    UnsupportedFileType { path: PathBuf, extension: String },

    // ── Remote service errors ─────────────────────────────────────────────
    /// No API key was configured for the OCR service.
    #[error("No API key configured.\nPass --api-key <KEY> or set MISTRAL_API_KEY.")]
    MissingApiKey,

    /// The service rejected the credentials (401/403).
    #[error("Authentication error from the OCR service: {detail}")]
    AuthError { detail: String },

    /// The service returned HTTP 429.
    #[error("Rate limit exceeded by the OCR service{}", retry_hint(.retry_after_secs))]
    RateLimitExceeded { retry_after_secs: Option<u64> },

    /// Any other non-success answer or transport failure.
    #[error("OCR service error during {stage}{}: {message}", status_suffix(.status))]
    RemoteService {
        stage: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The HTTP client timed out.
    #[error("OCR request timed out after {secs}s during {stage}\nIncrease --timeout.")]
    RequestTimeout { stage: &'static str, secs: u64 },

    /// The service answered with a body we could not interpret.
    #[error("Malformed response from the OCR service during {stage}: {detail}")]
    MalformedResponse { stage: &'static str, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The response carried no page to write.
    #[error("The OCR service returned no pages for '{name}'")]
    EmptyResponse { name: String },

    /// An embedded image payload is not valid base64.
    #[error("Image '{id}' has an invalid base64 payload: {detail}")]
    InvalidImagePayload { id: String, detail: String },

    // ── Filesystem errors ─────────────────────────────────────────────────
    /// Could not create an output directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The credential store could not be written back to disk.
    #[error("Failed to save config file '{path}': {source}")]
    ConfigWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OcrError::FileNotFound { .. }
            | OcrError::PermissionDenied { .. }
            | OcrError::UnsupportedFileType { .. } => ErrorKind::Input,
            OcrError::MissingApiKey
            | OcrError::AuthError { .. }
            | OcrError::RateLimitExceeded { .. }
            | OcrError::RemoteService { .. }
            | OcrError::RequestTimeout { .. }
            | OcrError::MalformedResponse { .. } => ErrorKind::RemoteService,
            OcrError::EmptyResponse { .. } | OcrError::InvalidImagePayload { .. } => {
                ErrorKind::Output
            }
            OcrError::CreateDirFailed { .. } | OcrError::OutputWriteFailed { .. } => {
                ErrorKind::Filesystem
            }
            OcrError::ConfigWriteFailed { .. } => ErrorKind::Config,
            OcrError::InvalidConfig(_) | OcrError::Internal(_) => ErrorKind::Internal,
        }
    }
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(" (retry after {secs}s)"),
        None => String::new(),
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_display() {
        let e = OcrError::UnsupportedFileType {
            path: PathBuf::from("notes.txt"),
            extension: ".txt".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".txt"), "got: {msg}");
        assert!(msg.contains(".pdf"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::Input);
    }

    #[test]
    fn rate_limit_display_with_retry() {
        let e = OcrError::RateLimitExceeded {
            retry_after_secs: Some(30),
        };
        assert!(e.to_string().contains("retry after 30s"));
        assert_eq!(e.kind(), ErrorKind::RemoteService);
    }

    #[test]
    fn rate_limit_display_without_retry() {
        let e = OcrError::RateLimitExceeded {
            retry_after_secs: None,
        };
        assert!(!e.to_string().contains("retry after"));
    }

    #[test]
    fn remote_service_display() {
        let e = OcrError::RemoteService {
            stage: "upload",
            status: Some(500),
            message: "boom".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("upload"), "got: {msg}");
        assert!(msg.contains("HTTP 500"), "got: {msg}");
        assert!(msg.contains("boom"), "got: {msg}");
    }

    #[test]
    fn filesystem_errors_keep_source() {
        use std::error::Error as _;
        let e = OcrError::OutputWriteFailed {
            path: PathBuf::from("results_pdf/a/a.md"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert_eq!(e.kind(), ErrorKind::Filesystem);
        assert!(e.source().is_some());
        assert!(e.to_string().contains("disk full"));
    }

    #[test]
    fn config_write_is_config_kind() {
        let e = OcrError::ConfigWriteFailed {
            path: PathBuf::from("config.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(e.kind(), ErrorKind::Config);
    }
}
