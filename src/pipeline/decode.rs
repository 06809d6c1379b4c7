//! Image payload decoding: data-URI base64 → raw bytes.
//!
//! The service delivers each extracted image as
//! `data:image/jpeg;base64,<payload>`. Everything up to and including the
//! first comma is the header; the rest is standard, padded base64.

use crate::error::OcrError;
use crate::response::EmbeddedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Split a data URI into `(header, payload)`.
///
/// The header includes the trailing comma. A string without a comma is
/// treated as a bare payload with an empty header.
pub fn split_data_uri(data: &str) -> (&str, &str) {
    match data.find(',') {
        Some(pos) => data.split_at(pos + 1),
        None => ("", data),
    }
}

/// Decode an embedded image's payload.
pub fn decode_image(image: &EmbeddedImage) -> Result<Vec<u8>, OcrError> {
    let (header, payload) = split_data_uri(&image.base64_data);
    if header.is_empty() {
        debug!("Image {} has no data-URI header; decoding as bare base64", image.id);
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| OcrError::InvalidImagePayload {
            id: image.id.clone(),
            detail: e.to_string(),
        })?;

    debug!("Decoded image {} → {} bytes", image.id, bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(data: &str) -> EmbeddedImage {
        EmbeddedImage {
            id: "img-0.jpeg".into(),
            base64_data: data.into(),
        }
    }

    #[test]
    fn strips_header_up_to_first_comma() {
        let (header, payload) = split_data_uri("data:image/png;base64,aGVsbG8=");
        assert_eq!(header, "data:image/png;base64,");
        assert_eq!(payload, "aGVsbG8=");
    }

    #[test]
    fn decodes_payload() {
        let bytes = decode_image(&image("data:image/jpeg;base64,aGVsbG8=")).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn bare_payload_is_accepted() {
        assert_eq!(decode_image(&image("aGVsbG8=")).unwrap(), b"hello");
    }

    #[test]
    fn reencoding_reproduces_original() {
        let original = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQ==";
        let bytes = decode_image(&image(original)).unwrap();
        let (header, _) = split_data_uri(original);
        assert_eq!(format!("{header}{}", STANDARD.encode(bytes)), original);
    }

    #[test]
    fn invalid_payload_is_an_error() {
        let err = decode_image(&image("data:image/png;base64,@@not base64@@")).unwrap_err();
        match err {
            OcrError::InvalidImagePayload { id, .. } => assert_eq!(id, "img-0.jpeg"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
