//! Mistral OCR over HTTP.
//!
//! A submission is three requests:
//!
//! 1. `POST /files` (multipart, `purpose=ocr`) uploads the file
//! 2. `GET /files/{id}/url?expiry=N` issues a short-lived signed URL for it
//! 3. `POST /ocr` runs recognition on that URL, asking for inline image
//!    payloads
//!
//! Failures are mapped onto [`OcrError`] and never retried here; a rejected
//! key or an exhausted quota is not going to get better on a second try.

use crate::backend::OcrBackend;
use crate::config::OcrConfig;
use crate::error::OcrError;
use crate::pipeline::input::mime_type_for;
use crate::progress::ProgressCallback;
use crate::response::{EmbeddedImage, OcrResponse, Page, SourceKind};
use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const STAGE_UPLOAD: &str = "upload";
const STAGE_SIGNED_URL: &str = "signed URL";
const STAGE_OCR: &str = "OCR";

/// Client for the Mistral document-OCR API.
#[derive(Clone)]
pub struct MistralOcrClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    expiry_hours: u32,
    timeout_secs: u64,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for MistralOcrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralOcrClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("expiry_hours", &self.expiry_hours)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SignedUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: DocumentChunk<'a>,
    include_image_base64: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DocumentChunk<'a> {
    DocumentUrl { document_url: &'a str },
    ImageUrl { image_url: &'a str },
}

#[derive(Debug, Deserialize)]
struct OcrResponseBody {
    pages: Vec<PageBody>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage_info: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageBody {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    markdown: String,
    #[serde(default)]
    images: Vec<ImageBody>,
}

#[derive(Debug, Deserialize)]
struct ImageBody {
    id: String,
    #[serde(default)]
    image_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    #[serde(default)]
    pages_processed: Option<u32>,
}

impl From<OcrResponseBody> for OcrResponse {
    fn from(body: OcrResponseBody) -> Self {
        let pages = body
            .pages
            .into_iter()
            .map(|p| Page {
                index: p.index,
                markdown: p.markdown,
                images: p
                    .images
                    .into_iter()
                    .filter_map(|img| match img.image_base64 {
                        Some(data) => Some(EmbeddedImage {
                            id: img.id,
                            base64_data: data,
                        }),
                        None => {
                            warn!("Image {} arrived without a payload; skipping", img.id);
                            None
                        }
                    })
                    .collect(),
            })
            .collect();

        OcrResponse {
            pages,
            model: body.model,
            pages_processed: body.usage_info.and_then(|u| u.pages_processed),
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────────────

impl MistralOcrClient {
    /// Build a client from the run configuration.
    ///
    /// # Errors
    /// [`OcrError::MissingApiKey`] if no non-blank key is configured.
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(OcrError::MissingApiKey)?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OcrError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            expiry_hours: config.signed_url_expiry_hours,
            timeout_secs: config.request_timeout_secs,
            progress: config.progress_callback.clone(),
        })
    }

    /// API root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn upload(&self, bytes: &[u8], file_name: &str) -> Result<String, OcrError> {
        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime_type_for(file_name))
            .map_err(|e| OcrError::Internal(format!("Invalid MIME type: {e}")))?;
        let form = multipart::Form::new()
            .text("purpose", "ocr")
            .part("file", part);

        debug!("Uploading {} ({} bytes)", file_name, bytes.len());
        let resp = self
            .client
            .post(format!("{}/files", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(STAGE_UPLOAD, e))?;

        let resp = check_status(STAGE_UPLOAD, resp).await?;
        let uploaded: UploadedFile = parse_json(STAGE_UPLOAD, resp).await?;
        Ok(uploaded.id)
    }

    async fn signed_url(&self, file_id: &str) -> Result<String, OcrError> {
        let resp = self
            .client
            .get(format!("{}/files/{}/url", self.base_url, file_id))
            .bearer_auth(&self.api_key)
            .query(&[("expiry", self.expiry_hours)])
            .send()
            .await
            .map_err(|e| self.transport_error(STAGE_SIGNED_URL, e))?;

        let resp = check_status(STAGE_SIGNED_URL, resp).await?;
        let signed: SignedUrl = parse_json(STAGE_SIGNED_URL, resp).await?;
        Ok(signed.url)
    }

    async fn recognise(&self, url: &str, kind: SourceKind) -> Result<OcrResponse, OcrError> {
        let document = match kind {
            SourceKind::MultiPage => DocumentChunk::DocumentUrl { document_url: url },
            SourceKind::SingleAsset => DocumentChunk::ImageUrl { image_url: url },
        };
        let request = OcrRequest {
            model: &self.model,
            document,
            include_image_base64: true,
        };

        let resp = self
            .client
            .post(format!("{}/ocr", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(STAGE_OCR, e))?;

        let resp = check_status(STAGE_OCR, resp).await?;
        let body: OcrResponseBody = parse_json(STAGE_OCR, resp).await?;
        Ok(body.into())
    }

    fn transport_error(&self, stage: &'static str, e: reqwest::Error) -> OcrError {
        if e.is_timeout() {
            OcrError::RequestTimeout {
                stage,
                secs: self.timeout_secs,
            }
        } else {
            OcrError::RemoteService {
                stage,
                status: None,
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl OcrBackend for MistralOcrClient {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn submit(
        &self,
        bytes: &[u8],
        file_name: &str,
        kind: SourceKind,
    ) -> Result<OcrResponse, OcrError> {
        let file_id = self.upload(bytes, file_name).await?;
        info!("Uploaded {} as {}", file_name, file_id);
        if let Some(ref cb) = self.progress {
            cb.on_upload_complete(&file_id);
        }

        let url = self.signed_url(&file_id).await?;
        debug!("Signed URL issued for {}", file_id);

        if let Some(ref cb) = self.progress {
            cb.on_recognition_start();
        }
        let response = self.recognise(&url, kind).await?;
        info!(
            "Recognised {}: {} pages, {} images (model {})",
            file_name,
            response.pages.len(),
            response.image_count(),
            response.model.as_deref().unwrap_or("unknown")
        );
        Ok(response)
    }
}

// ── Response helpers ─────────────────────────────────────────────────────────

/// Pass successful responses through; turn everything else into an error.
async fn check_status(stage: &'static str, resp: Response) -> Result<Response, OcrError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let retry_after_secs = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body);

    warn!("{} request failed: HTTP {} {}", stage, status.as_u16(), message);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OcrError::AuthError { detail: message },
        StatusCode::TOO_MANY_REQUESTS => OcrError::RateLimitExceeded { retry_after_secs },
        _ => OcrError::RemoteService {
            stage,
            status: Some(status.as_u16()),
            message,
        },
    })
}

async fn parse_json<T: DeserializeOwned>(
    stage: &'static str,
    resp: Response,
) -> Result<T, OcrError> {
    let text = resp.text().await.map_err(|e| OcrError::MalformedResponse {
        stage,
        detail: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| OcrError::MalformedResponse {
        stage,
        detail: e.to_string(),
    })
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"message": ..}`, `{"detail": ..}` and
/// `{"error": {"message": ..}}`; falls back to the (truncated) raw body.
fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            json.get("message"),
            json.get("detail"),
            json.get("error").and_then(|e| e.get("message")),
            json.get("error"),
        ];
        for candidate in candidates.into_iter().flatten() {
            if let Some(s) = candidate.as_str() {
                return s.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    if trimmed.chars().count() > 300 {
        format!("{}\u{2026}", trimmed.chars().take(299).collect::<String>())
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> OcrConfig {
        OcrConfig::builder()
            .api_key("test-key")
            .base_url(server.uri())
            .build()
            .unwrap()
    }

    #[test]
    fn requires_api_key() {
        let err = MistralOcrClient::new(&OcrConfig::default()).unwrap_err();
        assert!(matches!(err, OcrError::MissingApiKey));

        let blank = OcrConfig::builder().api_key("   ").build().unwrap();
        assert!(matches!(
            MistralOcrClient::new(&blank).unwrap_err(),
            OcrError::MissingApiKey
        ));
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let config = OcrConfig::builder()
            .api_key("k")
            .base_url("https://custom.example/v1/")
            .build()
            .unwrap();
        let client = MistralOcrClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://custom.example/v1");
    }

    #[test]
    fn document_chunk_wire_format() {
        let doc = serde_json::to_value(DocumentChunk::DocumentUrl { document_url: "u" }).unwrap();
        assert_eq!(doc, serde_json::json!({"type": "document_url", "document_url": "u"}));
        let img = serde_json::to_value(DocumentChunk::ImageUrl { image_url: "u" }).unwrap();
        assert_eq!(img, serde_json::json!({"type": "image_url", "image_url": "u"}));
    }

    #[test]
    fn response_conversion_skips_images_without_payload() {
        let body: OcrResponseBody = serde_json::from_value(serde_json::json!({
            "pages": [{
                "index": 0,
                "markdown": "![a](a) ![b](b)",
                "images": [
                    {"id": "a", "image_base64": "data:image/png;base64,AA=="},
                    {"id": "b", "image_base64": null}
                ],
                "dimensions": {"dpi": 200, "height": 100, "width": 100}
            }],
            "model": "mistral-ocr-2505",
            "usage_info": {"pages_processed": 1, "doc_size_bytes": 10}
        }))
        .unwrap();

        let response: OcrResponse = body.into();
        assert_eq!(response.pages.len(), 1);
        assert_eq!(response.pages[0].images.len(), 1);
        assert_eq!(response.pages[0].images[0].id, "a");
        assert_eq!(response.model.as_deref(), Some("mistral-ocr-2505"));
        assert_eq!(response.pages_processed, Some(1));
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(error_message(r#"{"message": "bad key"}"#), "bad key");
        assert_eq!(error_message(r#"{"detail": "nope"}"#), "nope");
        assert_eq!(
            error_message(r#"{"error": {"message": "quota", "type": "x"}}"#),
            "quota"
        );
        assert_eq!(error_message("plain text"), "plain text");
        assert_eq!(error_message(""), "empty response body");
        assert!(error_message(&"x".repeat(1000)).chars().count() <= 300);
    }

    #[tokio::test]
    async fn full_submission_flow() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/files"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "file-123", "object": "file", "purpose": "ocr"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/files/file-123/url"))
            .and(query_param("expiry", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://signed.example/file-123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/ocr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "pages": [
                    {"index": 0, "markdown": "# Page 1", "images": []},
                    {"index": 1, "markdown": "# Page 2", "images": []}
                ],
                "model": "mistral-ocr-latest"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = MistralOcrClient::new(&config_for(&server)).unwrap();
        let response = client
            .submit(b"%PDF-1.7", "doc.pdf", SourceKind::MultiPage)
            .await
            .unwrap();

        assert_eq!(response.pages.len(), 2);
        assert_eq!(response.pages[1].markdown, "# Page 2");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"message": "Unauthorized"})),
            )
            .mount(&server)
            .await;

        let client = MistralOcrClient::new(&config_for(&server)).unwrap();
        let err = client
            .submit(b"x", "a.png", SourceKind::SingleAsset)
            .await
            .unwrap_err();
        match err {
            OcrError::AuthError { detail } => assert_eq!(detail, "Unauthorized"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
            .expect(1)
            .mount(&server)
            .await;

        let client = MistralOcrClient::new(&config_for(&server)).unwrap();
        let err = client
            .submit(b"x", "a.png", SourceKind::SingleAsset)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OcrError::RateLimitExceeded {
                retry_after_secs: Some(12)
            }
        ));
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let client = MistralOcrClient::new(&config_for(&server)).unwrap();
        let err = client
            .submit(b"x", "a.pdf", SourceKind::MultiPage)
            .await
            .unwrap_err();
        match err {
            OcrError::RemoteService {
                stage,
                status,
                message,
            } => {
                assert_eq!(stage, STAGE_UPLOAD);
                assert_eq!(status, Some(503));
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_ocr_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "f"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/f/url"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"url": "https://u"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ocr"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = MistralOcrClient::new(&config_for(&server)).unwrap();
        let err = client
            .submit(b"x", "a.pdf", SourceKind::MultiPage)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::MalformedResponse { stage: STAGE_OCR, .. }));
    }
}
