//! The remote OCR collaborator.
//!
//! The rest of the crate only knows the [`OcrBackend`] trait: hand it the
//! file bytes, get back an [`OcrResponse`]. [`MistralOcrClient`] is the
//! implementation used by default; tests and library users can inject any
//! other through [`crate::config::OcrConfigBuilder::backend`].

use crate::error::OcrError;
use crate::response::{OcrResponse, SourceKind};
use async_trait::async_trait;

pub mod mistral;

pub use mistral::MistralOcrClient;

/// A document-OCR service.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Recognise `bytes` (the contents of `file_name`).
    ///
    /// `kind` tells the service whether it is looking at a paginated
    /// document or a single picture. Pages come back in document order.
    async fn submit(
        &self,
        bytes: &[u8],
        file_name: &str,
        kind: SourceKind,
    ) -> Result<OcrResponse, OcrError>;
}
