//! Result materialization: lay an [`OcrResponse`] out on disk.
//!
//! ## Layout
//!
//! ```text
//! {root}/results_pdf/{name}/{name}.md          documents
//! {root}/results_pdf/{name}/images/{id}.png
//! {root}/results_image/{name}.md               single images
//! ```
//!
//! `{name}` is the source file stem and `{id}` the service's image id, used
//! verbatim (an id of `img-0.jpeg` becomes `img-0.jpeg.png`). Re-running for
//! the same name overwrites in place; two images sharing an id within one
//! response means the last one written wins.
//!
//! An id is only ever used as a single file name. Ids that are empty, `.`,
//! `..` or contain a path separator are skipped with a warning, so the
//! service cannot place files outside `images/`; their references stay
//! unrewritten.
//!
//! Nothing is rolled back on failure. An I/O error halfway through image
//! extraction leaves the images written so far in `images/`.

use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::output::Materialized;
use crate::pipeline::{decode, rewrite};
use crate::response::{OcrResponse, SourceKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Write `response` for the source named `stem`.
///
/// Returns the shared results root as [`Materialized::output_dir`] along
/// with the exact markdown file written.
pub fn materialize(
    response: &OcrResponse,
    stem: &str,
    kind: SourceKind,
    config: &OcrConfig,
) -> Result<Materialized, OcrError> {
    match kind {
        SourceKind::MultiPage => write_document(response, stem, config),
        SourceKind::SingleAsset => write_single(response, stem, config),
    }
}

fn write_document(
    response: &OcrResponse,
    stem: &str,
    config: &OcrConfig,
) -> Result<Materialized, OcrError> {
    let base_dir = config
        .output_root
        .join(SourceKind::MultiPage.results_dir_name());
    let doc_dir = base_dir.join(stem);
    let images_dir = doc_dir.join("images");

    ensure_dir(&base_dir)?;
    ensure_dir(&doc_dir)?;
    ensure_dir(&images_dir)?;

    let mut written = Vec::with_capacity(response.image_count());
    let mut page_markdowns = Vec::with_capacity(response.pages.len());

    for page in &response.pages {
        let mut targets = BTreeMap::new();
        for image in &page.images {
            if !is_safe_image_id(&image.id) {
                warn!(
                    "Page {}: skipping image with unusable id '{}'",
                    page.index + 1,
                    image.id
                );
                continue;
            }
            let bytes = decode::decode_image(image)?;
            let file_name = format!("{}.png", image.id);
            let path = images_dir.join(&file_name);
            write_file(&path, &bytes, config.atomic_writes)?;
            debug!("Wrote image {} ({} bytes)", path.display(), bytes.len());

            if let Some(ref cb) = config.progress_callback {
                cb.on_image_written(&image.id, &path);
            }
            targets.insert(image.id.clone(), format!("images/{file_name}"));
            written.push(path);
        }

        let markdown = rewrite::replace_image_refs(&page.markdown, &targets);
        for id in rewrite::unresolved_image_refs(&markdown) {
            warn!(
                "Page {}: image reference '{}' has no matching image in the response",
                page.index + 1,
                id
            );
        }
        page_markdowns.push(markdown);
    }

    let markdown_path = doc_dir.join(format!("{stem}.md"));
    let markdown = page_markdowns.join("\n\n");
    write_markdown(&markdown_path, &markdown, config)?;

    info!(
        "Wrote {} pages and {} images under {}",
        response.pages.len(),
        written.len(),
        doc_dir.display()
    );

    Ok(Materialized {
        output_dir: base_dir,
        markdown_path,
        images: written,
    })
}

fn write_single(
    response: &OcrResponse,
    stem: &str,
    config: &OcrConfig,
) -> Result<Materialized, OcrError> {
    let first = response
        .pages
        .first()
        .ok_or_else(|| OcrError::EmptyResponse {
            name: stem.to_string(),
        })?;

    let base_dir = config
        .output_root
        .join(SourceKind::SingleAsset.results_dir_name());
    ensure_dir(&base_dir)?;

    if response.pages.len() > 1 {
        debug!(
            "Image response has {} pages; only the first is written",
            response.pages.len()
        );
    }

    let markdown_path = base_dir.join(format!("{stem}.md"));
    write_markdown(&markdown_path, &first.markdown, config)?;
    info!("Wrote {}", markdown_path.display());

    Ok(Materialized {
        output_dir: base_dir,
        markdown_path,
        images: Vec::new(),
    })
}

fn write_markdown(path: &Path, markdown: &str, config: &OcrConfig) -> Result<(), OcrError> {
    write_file(path, markdown.as_bytes(), config.atomic_writes)?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_markdown_written(path, markdown.len());
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), OcrError> {
    std::fs::create_dir_all(path).map_err(|e| OcrError::CreateDirFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write `bytes` to `path`, replacing any existing file.
///
/// With `atomic` set the bytes go to a `{name}.tmp` sibling which is then
/// renamed over `path`, so readers never observe a half-written file. Both
/// paths create the file with the same umask-derived permissions.
fn write_file(path: &Path, bytes: &[u8], atomic: bool) -> Result<(), OcrError> {
    let write_err = |source| OcrError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if !atomic {
        return std::fs::write(path, bytes).map_err(write_err);
    }

    let tmp_path = tmp_sibling(path);
    std::fs::write(&tmp_path, bytes).map_err(write_err)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_err(e));
    }
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// An id usable verbatim as one file name inside `images/`.
fn is_safe_image_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}
