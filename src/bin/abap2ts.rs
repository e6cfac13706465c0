//! CLI binary for abap-techspec.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig`, runs the pipeline and writes the `.docx`.

use abap_techspec::pipeline::input::{read_source, read_text};
use abap_techspec::{
    generate_specification, write_document, ConversionStats, GenerationConfig,
    GenerationProgressCallback, ProgressCallback, Stage, StaticRetriever,
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut started) = self.stage_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_prefix(capitalise(&stage.to_string()));
        self.bar.set_message(match stage {
            Stage::Retrieve => "searching knowledge base…",
            Stage::Explain => "asking the model to explain the code…",
            Stage::Draft => "drafting the specification…",
            Stage::Render => "building the document…",
        });
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let elapsed_ms = self
            .stage_started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        self.bar.println(format!(
            "  {} {:<14} {:<16} {}",
            green("✓"),
            capitalise(&stage.to_string()),
            dim(detail),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_retry(&self, stage: Stage, attempt: u32, backoff_ms: u64, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(80) {
            Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} {} retry {} in {}ms  {}",
            yellow("↻"),
            stage,
            attempt,
            backoff_ms,
            dim(&msg),
        ));
    }
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a specification with a knowledge-base file
  abap2ts zsd_sales_report.abap --context kb/sd_tables.txt

  # Choose output path and model
  abap2ts zmm_po_upload.abap --context kb/*.txt -o specs/po_upload.docx --model gpt-4o

  # Read ABAP from stdin
  cat zfi_posting.abap | abap2ts - --context kb/fi.txt

  # Keep the generated markup for review, then re-render it later
  abap2ts zsd_sales_report.abap --context kb/sd.txt --save-markup spec.md
  abap2ts --from-markup spec.md -o spec.docx

  # JSON stats on stdout
  abap2ts zsd_sales_report.abap --context kb/sd.txt --json

MARKUP CONVENTIONS (what --from-markup understands):
  1. OVERVIEW            numbered ALL-CAPS line → section heading
  **Selection Screen**   bold-only line → subheading
  text with **bold**     paragraph with bold runs
  | A | B |              consecutive pipe rows → grid table (first row = header)
  ```  …  ```            fenced lines → monospace code block
  PAGE 2                 page break
  ---  ===               separator lines are ignored

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override log filter (e.g. abap_techspec=debug)

Without --context (or with context files that contain no passages) no LLM
call is made and the document contains only the "no relevant context"
notice.
"#;

/// Generate Word technical specifications from ABAP source.
#[derive(Parser, Debug)]
#[command(
    name = "abap2ts",
    version,
    about = "Generate Word technical specifications from ABAP source using LLMs",
    long_about = "Explain an ABAP program with an LLM, draft a technical specification \
grounded in your knowledge-base files, and compile it into a styled .docx document. \
Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any OpenAI-compatible \
endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// ABAP source file, or `-` for stdin. With --from-markup: a markup file.
    input: String,

    /// Write the .docx to this file.
    #[arg(short, long, env = "ABAP2TS_OUTPUT", default_value = "technical_spec.docx")]
    output: PathBuf,

    /// Knowledge-base text files; blank-line-separated passages become context.
    #[arg(long = "context", env = "ABAP2TS_CONTEXT", value_delimiter = ',', num_args = 1..)]
    context: Vec<PathBuf>,

    /// Use at most this many knowledge-base passages.
    #[arg(long, env = "ABAP2TS_TOP_K")]
    top_k: Option<usize>,

    /// LLM model ID (default: gpt-4o).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Max LLM output tokens per call.
    #[arg(long, env = "ABAP2TS_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Retries per LLM call on failure.
    #[arg(long, env = "ABAP2TS_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Minimum length requested from the model, in words.
    #[arg(long, env = "ABAP2TS_MIN_WORDS", default_value_t = 2000)]
    min_words: usize,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "ABAP2TS_API_TIMEOUT", default_value_t = 180)]
    api_timeout: u64,

    /// Treat INPUT as already-generated markup and only render it.
    #[arg(long)]
    from_markup: bool,

    /// Also write the generated markup to this file.
    #[arg(long, env = "ABAP2TS_SAVE_MARKUP")]
    save_markup: Option<PathBuf>,

    /// Print run statistics as JSON on stdout.
    #[arg(long, env = "ABAP2TS_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "ABAP2TS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ABAP2TS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ABAP2TS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    let start = Instant::now();

    // ── Render-only mode ─────────────────────────────────────────────────
    if cli.from_markup {
        let markup = read_text(&cli.input)
            .await
            .with_context(|| format!("Failed to read markup from {}", cli.input))?;
        let stats = render_to_path(&markup.text, &cli.output)?;
        report(&cli, &stats, start)?;
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress_cb = spinner
        .clone()
        .map(|cb| cb as Arc<dyn GenerationProgressCallback>);
    let config = build_config(&cli, progress_cb)?;

    // ── Generate ─────────────────────────────────────────────────────────
    let source = read_source(&cli.input)
        .await
        .with_context(|| format!("Failed to read ABAP source from {}", cli.input))?;

    let generated = generate_specification(&source.text, &config).await;
    if let Some(ref s) = spinner {
        s.finish();
    }
    let generated = generated.context("Specification generation failed")?;

    if let Some(ref path) = cli.save_markup {
        tokio::fs::write(path, &generated.markup)
            .await
            .with_context(|| format!("Failed to save markup to {}", path.display()))?;
    }

    // ── Render ───────────────────────────────────────────────────────────
    let render_start = Instant::now();
    let mut stats = render_to_path(&generated.markup, &cli.output)?;
    stats.render_duration_ms = render_start.elapsed().as_millis() as u64;
    stats.generation_duration_ms = render_start.duration_since(start).as_millis() as u64;
    stats.no_context = generated.no_context;
    stats.context_passages = generated.context_passages;
    stats.total_input_tokens = generated.input_tokens;
    stats.total_output_tokens = generated.output_tokens;

    if generated.no_context && !cli.quiet && !cli.json {
        eprintln!(
            "{} no knowledge-base context found; the document contains only a notice",
            yellow("⚠")
        );
    }

    report(&cli, &stats, start)
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .min_words(cli.min_words)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }

    if !cli.context.is_empty() {
        let mut retriever = StaticRetriever::from_files(cli.context.as_slice())
            .context("Failed to load knowledge-base files")?;
        if let Some(k) = cli.top_k {
            retriever = retriever.with_top_k(k);
        }
        tracing::info!(
            "Loaded {} passages from {} context files",
            retriever.len(),
            cli.context.len()
        );
        builder = builder.retriever(Arc::new(retriever));
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Compile markup and write the `.docx` to `path` via a sibling temp file.
fn render_to_path(markup: &str, path: &Path) -> Result<ConversionStats> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    let elements = write_document(markup, &mut tmp).context("Failed to write document")?;
    let docx_bytes = tmp.as_file().metadata().map(|m| m.len() as usize).unwrap_or(0);
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(ConversionStats {
        docx_bytes,
        elements,
        ..Default::default()
    })
}

fn report(cli: &Cli, stats: &ConversionStats, start: Instant) -> Result<()> {
    let mut stats = stats.clone();
    stats.total_duration_ms = start.elapsed().as_millis() as u64;

    if cli.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?;
        println!("{json}");
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }

    let e = &stats.elements;
    eprintln!(
        "{}  {} headings, {} tables, {} code blocks  {}ms  →  {}",
        green("✔"),
        e.headings,
        e.tables,
        e.code_blocks,
        stats.total_duration_ms,
        bold(&cli.output.display().to_string()),
    );
    if stats.total_input_tokens > 0 || stats.total_output_tokens > 0 {
        eprintln!(
            "   {} tokens in  /  {} tokens out  {}",
            dim(&stats.total_input_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
            cyan(&format!("({} passages)", stats.context_passages)),
        );
    }
    Ok(())
}
