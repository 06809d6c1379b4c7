//! # ocr2md
//!
//! Send a PDF or an image to a hosted OCR service (Mistral OCR) and write the
//! recognised Markdown, plus any images the service extracted, to disk.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Input     validate path, classify by extension (pdf → document,
//!  │               jpg/jpeg/png → image); nothing else runs on failure
//!  ├─ 2. Submit    upload → signed URL → OCR (one round trip each)
//!  ├─ 3. Decode    strip data-URI headers, base64-decode image payloads
//!  ├─ 4. Rewrite   ![id](id) → ![id](images/id.png)
//!  └─ 5. Write     results_pdf/{name}/{name}.md + images/, or
//!                  results_image/{name}.md
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr2md::{process_file, OcrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OcrConfig::builder()
//!         .api_key(std::env::var("MISTRAL_API_KEY")?)
//!         .build()?;
//!     let output = process_file("report.pdf", &config).await?;
//!     println!("results in {}", output.output_dir.display());
//!     println!("markdown at {}", output.markdown_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2md` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod response;
pub mod settings;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{MistralOcrClient, OcrBackend};
pub use config::{OcrConfig, OcrConfigBuilder, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::{ErrorKind, OcrError};
pub use output::{Materialized, ProcessOutput};
pub use pipeline::materialize::materialize;
pub use process::{process_file, process_file_sync};
pub use progress::{NoopProgressCallback, ProcessProgressCallback, ProgressCallback};
pub use response::{EmbeddedImage, OcrResponse, Page, SourceKind};
pub use settings::ConfigStore;
