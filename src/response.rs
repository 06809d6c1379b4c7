//! Domain types for an OCR result.
//!
//! These are backend-neutral: the Mistral client translates its wire format
//! into them, and the materializer only ever sees these.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// How a source file is laid out on disk once recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// A paginated document (PDF). Written to `results_pdf/{name}/` with an
    /// `images/` folder.
    MultiPage,
    /// A standalone picture. Written to `results_image/{name}.md`.
    SingleAsset,
}

impl SourceKind {
    /// Classify a path by its extension (case-insensitive).
    ///
    /// Returns `None` for anything other than `.pdf`, `.jpg`, `.jpeg`, `.png`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(SourceKind::MultiPage),
            "jpg" | "jpeg" | "png" => Some(SourceKind::SingleAsset),
            _ => None,
        }
    }

    /// Name of the directory under the output root that holds results.
    pub fn results_dir_name(self) -> &'static str {
        match self {
            SourceKind::MultiPage => "results_pdf",
            SourceKind::SingleAsset => "results_image",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::MultiPage => f.write_str("document"),
            SourceKind::SingleAsset => f.write_str("image"),
        }
    }
}

/// An image region the service extracted from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    /// Markdown reference key and output filename stem.
    pub id: String,
    /// Data-URI-prefixed base64 payload, e.g. `data:image/jpeg;base64,/9j/...`.
    pub base64_data: String,
}

/// One recognised page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 0-indexed page position as reported by the service.
    pub index: usize,
    pub markdown: String,
    pub images: Vec<EmbeddedImage>,
}

/// The full answer to one OCR submission, pages in service order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrResponse {
    pub pages: Vec<Page>,
    /// Model that produced the response, when the service reports it.
    pub model: Option<String>,
    /// Pages billed by the service, when reported.
    pub pages_processed: Option<u32>,
}

impl OcrResponse {
    /// Total number of embedded images across all pages.
    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }
}
