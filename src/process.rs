//! Processing entry points: one file in, one results tree out.
//!
//! The order matters: the input is validated and classified before the
//! backend is constructed, so a bad path or an unsupported extension never
//! reaches the network and never touches the output directory.

use crate::backend::{MistralOcrClient, OcrBackend};
use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::output::ProcessOutput;
use crate::pipeline::{input, materialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Recognise a PDF or image file and write the results to disk.
///
/// # Arguments
/// * `path`   — local `.pdf`, `.jpg`, `.jpeg` or `.png` file
/// * `config` — run configuration (API key, endpoint, output root)
///
/// # Returns
/// The shared results directory (`results_pdf` or `results_image` under the
/// output root) plus the exact markdown file written.
///
/// # Errors
/// - Input errors (missing file, unsupported type) before anything else
/// - Remote service errors from the backend, unretried
/// - Filesystem errors while writing; partial output may remain
pub async fn process_file(
    path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<ProcessOutput, OcrError> {
    let start = Instant::now();
    let path = path.as_ref();
    info!("Processing {}", path.display());

    // ── Step 1: Validate and classify input ─────────────────────────────
    let source = input::resolve_source(path)?;

    // ── Step 2: Get/create backend ──────────────────────────────────────
    let backend = resolve_backend(config)?;
    debug!("Using OCR backend '{}'", backend.name());

    // ── Step 3: Submit ──────────────────────────────────────────────────
    let bytes = source.read().await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_upload_start(&source.file_name, bytes.len());
    }
    let response = backend
        .submit(&bytes, &source.file_name, source.kind)
        .await?;
    drop(bytes);

    let page_count = response.pages.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_recognition_complete(page_count, response.image_count());
    }

    // ── Step 4: Write results ───────────────────────────────────────────
    let stem = source.stem.clone();
    let kind = source.kind;
    let write_config = config.clone();
    let materialized = tokio::task::spawn_blocking(move || {
        materialize::materialize(&response, &stem, kind, &write_config)
    })
    .await
    .map_err(|e| OcrError::Internal(format!("Writer task failed: {e}")))??;

    let output = ProcessOutput {
        output_dir: materialized.output_dir,
        markdown_path: materialized.markdown_path,
        page_count,
        image_count: materialized.images.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Processed {} in {}ms → {}",
        source.file_name,
        output.duration_ms,
        output.markdown_path.display()
    );
    Ok(output)
}

/// Synchronous wrapper around [`process_file`].
///
/// Creates a temporary tokio runtime internally; do not call from within an
/// async context.
pub fn process_file_sync(
    path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<ProcessOutput, OcrError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| OcrError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(process_file(path, config))
}

/// Pick the backend: an injected one wins, otherwise Mistral with the
/// configured key.
fn resolve_backend(config: &OcrConfig) -> Result<Arc<dyn OcrBackend>, OcrError> {
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }
    Ok(Arc::new(MistralOcrClient::new(config)?))
}
