//! Progress-callback trait for processing events.
//!
//! Inject an [`Arc<dyn ProcessProgressCallback>`] via
//! [`crate::config::OcrConfigBuilder::progress_callback`] to be told what the
//! pipeline is doing: uploading, waiting on recognition, writing files.
//!
//! # Example
//!
//! ```rust
//! use ocr2md::{OcrConfig, ProcessProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct ImageCounter {
//!     written: AtomicUsize,
//! }
//!
//! impl ProcessProgressCallback for ImageCounter {
//!     fn on_image_written(&self, id: &str, _path: &std::path::Path) {
//!         let n = self.written.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("image {id} ({n} so far)");
//!     }
//! }
//!
//! let config = OcrConfig::builder()
//!     .progress_callback(Arc::new(ImageCounter { written: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline as it processes a file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Materialization runs on a blocking worker thread,
/// hence the `Send + Sync` bound.
pub trait ProcessProgressCallback: Send + Sync {
    /// Called before the file is uploaded.
    ///
    /// # Arguments
    /// * `file_name` — base name of the uploaded file
    /// * `bytes`     — upload size
    fn on_upload_start(&self, file_name: &str, bytes: usize) {
        let _ = (file_name, bytes);
    }

    /// Called once the service has accepted the upload.
    fn on_upload_complete(&self, file_id: &str) {
        let _ = file_id;
    }

    /// Called just before the recognition request is sent.
    fn on_recognition_start(&self) {}

    /// Called when the recognition response has been received.
    ///
    /// # Arguments
    /// * `pages`  — pages in the response
    /// * `images` — embedded images across all pages
    fn on_recognition_complete(&self, pages: usize, images: usize) {
        let _ = (pages, images);
    }

    /// Called after each image file is written.
    fn on_image_written(&self, id: &str, path: &Path) {
        let _ = (id, path);
    }

    /// Called after the markdown file is written.
    fn on_markdown_written(&self, path: &Path, bytes: usize) {
        let _ = (path, bytes);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ProcessProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::OcrConfig`].
pub type ProgressCallback = Arc<dyn ProcessProgressCallback>;
