//! Input resolution: validate a user-supplied path and classify it.
//!
//! Everything here runs before the OCR backend is even constructed, so a bad
//! path or an unsupported extension never costs a network round trip and
//! never leaves anything on disk.

use crate::error::OcrError;
use crate::response::SourceKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A validated local source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Base name with extension, as uploaded.
    pub file_name: String,
    /// Base name without extension; drives every output path.
    pub stem: String,
    pub kind: SourceKind,
}

impl SourceFile {
    /// Read the file contents.
    pub async fn read(&self) -> Result<Vec<u8>, OcrError> {
        tokio::fs::read(&self.path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => OcrError::PermissionDenied {
                path: self.path.clone(),
            },
            _ => OcrError::FileNotFound {
                path: self.path.clone(),
            },
        })
    }
}

/// Validate `path` and classify it.
///
/// # Errors
/// - [`OcrError::FileNotFound`] if the path does not exist or is not a file
/// - [`OcrError::UnsupportedFileType`] for anything but pdf/jpg/jpeg/png
/// - [`OcrError::PermissionDenied`] if the file cannot be opened
pub fn resolve_source(path: impl AsRef<Path>) -> Result<SourceFile, OcrError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(OcrError::FileNotFound { path });
    }

    let kind = SourceKind::from_path(&path).ok_or_else(|| OcrError::UnsupportedFileType {
        extension: path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
            .unwrap_or_default(),
        path: path.clone(),
    })?;

    if let Err(e) = std::fs::File::open(&path) {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            return Err(OcrError::PermissionDenied { path });
        }
        return Err(OcrError::FileNotFound { path });
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!("Resolved {} source: {}", kind, path.display());
    Ok(SourceFile {
        path,
        file_name,
        stem,
        kind,
    })
}

/// MIME type to declare when uploading a file of this name.
pub fn mime_type_for(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}
