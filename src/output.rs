//! Result types returned after a file has been processed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the materializer wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Materialized {
    /// The shared results root (`results_pdf` or `results_image`).
    ///
    /// For documents this is deliberately the root, not the per-document
    /// subdirectory; use [`Materialized::markdown_path`] for the exact file.
    pub output_dir: PathBuf,
    /// The markdown file that was written.
    pub markdown_path: PathBuf,
    /// Image files written, in write order (duplicates included).
    pub images: Vec<PathBuf>,
}

/// Summary of one `process_file` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// See [`Materialized::output_dir`].
    pub output_dir: PathBuf,
    pub markdown_path: PathBuf,
    /// Pages returned by the service.
    pub page_count: usize,
    /// Image files written to disk.
    pub image_count: usize,
    /// Wall-clock time of the whole run, including the remote round trips.
    pub duration_ms: u64,
}
