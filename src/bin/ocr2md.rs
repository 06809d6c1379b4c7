//! CLI binary for ocr2md.
//!
//! A thin shim over the library crate with two modes:
//!
//! * headless: `ocr2md --file doc.pdf --api-key KEY`
//! * interactive: `ocr2md --gui`, a small terminal form that remembers the
//!   API key in the config file between runs

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ocr2md::settings::{ConfigStore, API_KEY, DEFAULT_CONFIG_FILE};
use ocr2md::{process_file, OcrConfig, ProcessOutput, ProcessProgressCallback, ProgressCallback};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const USAGE_HINT: &str =
    "Provide --file <PATH> and --api-key <KEY>, or use --gui to launch the interactive form.";

const PREVIEW_CHARS: usize = 500;

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that follows the upload → recognition → write stages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style =
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProcessProgressCallback for CliProgressCallback {
    fn on_upload_start(&self, file_name: &str, bytes: usize) {
        self.bar.set_prefix("Uploading");
        self.bar
            .set_message(format!("{file_name} {}", dim(&format!("({bytes} bytes)"))));
    }

    fn on_upload_complete(&self, file_id: &str) {
        self.bar.println(format!("  {} uploaded {}", green("✓"), dim(file_id)));
    }

    fn on_recognition_start(&self) {
        self.bar.set_prefix("Recognising");
        self.bar.set_message("waiting for the OCR service…");
    }

    fn on_recognition_complete(&self, pages: usize, images: usize) {
        self.bar.println(format!(
            "  {} recognised {} pages, {} images",
            green("✓"),
            pages,
            images
        ));
        self.bar.set_prefix("Writing");
        self.bar.set_message("");
    }

    fn on_image_written(&self, id: &str, _path: &Path) {
        self.bar.set_message(id.to_string());
    }

    fn on_markdown_written(&self, path: &Path, bytes: usize) {
        self.bar.println(format!(
            "  {} wrote {} {}",
            green("✓"),
            path.display(),
            dim(&format!("({bytes} bytes)"))
        ));
    }
}

/// Recognise PDFs and images with Mistral OCR and save the Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "ocr2md",
    version,
    about = "Recognise PDFs and images with Mistral OCR and save the Markdown",
    long_about = "Upload a PDF or image to the Mistral OCR service and write the recognised \
Markdown to results_pdf/{name}/{name}.md (with extracted images in images/) or \
results_image/{name}.md.",
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// Launch the interactive form.
    #[arg(long)]
    gui: bool,

    /// File to process (.pdf, .jpg, .jpeg, .png).
    #[arg(long)]
    file: Option<PathBuf>,

    /// Mistral API key.
    #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Credential file used by the interactive form.
    #[arg(long, env = "OCR2MD_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory under which results_pdf/ and results_image/ are created.
    #[arg(long, env = "OCR2MD_OUTPUT_ROOT")]
    output_root: Option<PathBuf>,

    /// OCR model ID.
    #[arg(long, env = "OCR2MD_MODEL", default_value = ocr2md::DEFAULT_MODEL)]
    model: String,

    /// API root URL.
    #[arg(long, env = "OCR2MD_BASE_URL", default_value = ocr2md::DEFAULT_BASE_URL)]
    base_url: String,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "OCR2MD_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Write output files in place instead of via temp file + rename.
    #[arg(long)]
    no_atomic: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "OCR2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCR2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OCR2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep library INFO logs
    // from tearing through it.
    let show_progress = spinner_enabled(&cli);
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let result = if cli.gui {
        run_interactive(&cli).await
    } else {
        match (&cli.file, &cli.api_key) {
            (Some(file), Some(key)) => run_headless(&cli, file, key).await,
            _ => {
                eprintln!("{} {}", red("error:"), USAGE_HINT);
                return ExitCode::FAILURE;
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", red("Processing failed:"), e);
            ExitCode::FAILURE
        }
    }
}

/// The spinner is off with `--quiet` or `--no-progress`, in every mode.
fn spinner_enabled(cli: &Cli) -> bool {
    !cli.quiet && !cli.no_progress
}

/// Map CLI args to `OcrConfig`.
fn build_config(
    cli: &Cli,
    api_key: &str,
    progress: Option<ProgressCallback>,
) -> Result<OcrConfig> {
    let mut builder = OcrConfig::builder()
        .api_key(api_key)
        .model(&cli.model)
        .base_url(&cli.base_url)
        .request_timeout_secs(cli.timeout)
        .atomic_writes(!cli.no_atomic);

    if let Some(ref root) = cli.output_root {
        builder = builder.output_root(root);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Run one file with an optional spinner, clearing it whatever the outcome.
async fn run_once(
    cli: &Cli,
    file: &Path,
    api_key: &str,
    show_progress: bool,
) -> Result<ProcessOutput> {
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress = spinner
        .clone()
        .map(|cb| cb as Arc<dyn ProcessProgressCallback>);

    let config = build_config(cli, api_key, progress)?;
    let result = process_file(file, &config).await;

    if let Some(cb) = spinner {
        cb.finish();
    }
    Ok(result?)
}

async fn run_headless(cli: &Cli, file: &Path, api_key: &str) -> Result<()> {
    let output = run_once(cli, file, api_key, spinner_enabled(cli)).await?;

    if !cli.quiet {
        eprintln!(
            "{}  {} pages, {} images  {}ms",
            green("✔"),
            output.page_count,
            output.image_count,
            output.duration_ms
        );
    }
    println!("Processing complete! Results saved in: {}", output.output_dir.display());
    Ok(())
}

// ── Interactive form ─────────────────────────────────────────────────────────

async fn run_interactive(cli: &Cli) -> Result<()> {
    let mut store = ConfigStore::open(&cli.config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", bold("OCR Processing Tool"));
    println!("{}", dim("Supported file types: PDF, JPG, JPEG, PNG"));

    loop {
        // Credential field, pre-filled from the store (or --api-key).
        let saved = cli
            .api_key
            .clone()
            .or_else(|| store.get_str(API_KEY).map(str::to_string))
            .unwrap_or_default();
        let key_prompt = if saved.is_empty() {
            "API Key: ".to_string()
        } else {
            format!("API Key [{}]: ", mask_key(&saved))
        };
        let Some(entered) = prompt(&mut lines, &key_prompt).await? else {
            return Ok(());
        };
        let api_key = if entered.is_empty() { saved } else { entered };

        let Some(file) = prompt(&mut lines, "File: ").await? else {
            return Ok(());
        };
        let file = file.trim_matches(|c| c == '"' || c == '\'').to_string();

        if api_key.is_empty() {
            println!("{} Please enter an API key", red("✘"));
            continue;
        }
        if file.is_empty() {
            println!("{} Please choose a file to process", red("✘"));
            continue;
        }

        if let Err(e) = store.set(API_KEY, api_key.as_str()) {
            warn!("Could not save API key: {}", e);
        }

        println!("{}", dim("Processing, please wait…"));
        let file = PathBuf::from(file);
        match run_once(cli, &file, &api_key, spinner_enabled(cli)).await {
            Ok(output) => {
                println!("{} Processing complete!", green("✔"));
                println!(
                    "Results saved in: {}",
                    bold(&output.markdown_path.display().to_string())
                );
                show_preview(&output.markdown_path);
            }
            Err(e) => {
                println!("{} Processing failed: {:#}", red("✘"), e);
            }
        }

        let Some(again) = prompt(&mut lines, "Process another file? [y/N]: ").await? else {
            return Ok(());
        };
        if !matches!(again.to_ascii_lowercase().as_str(), "y" | "yes") {
            return Ok(());
        }
    }
}

/// Print `label`, read one trimmed line. `None` on end of input.
async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush().ok();
    let line = lines.next_line().await.context("Failed to read from stdin")?;
    Ok(line.map(|l| l.trim().to_string()))
}

fn show_preview(markdown_path: &Path) {
    let Ok(content) = std::fs::read_to_string(markdown_path) else {
        return;
    };
    let preview: String = content.chars().take(PREVIEW_CHARS).collect();
    println!("\nPreview:\n{}", dim(&"-".repeat(40)));
    println!("{preview}...");
}

/// `sk-abcdef123456` → `sk-a…3456`.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}\u{2026}{tail}")
}
