//! Conversion entry points.
//!
//! Two layers:
//!
//! * [`write_document`] / [`render_docx`]: the deterministic markup →
//!   `.docx` compiler. Synchronous, no I/O besides the caller's sink, and
//!   the only failure is that sink rejecting bytes.
//! * [`generate_specification`] / [`convert`]: the LLM glue that produces
//!   markup from ABAP source and then calls the compiler.
//!
//! Every call builds its own compiler and document, so a server can run any
//! number of conversions concurrently without shared state.

use crate::config::GenerationConfig;
use crate::document::DocumentSummary;
use crate::error::TechSpecError;
use crate::output::{ConversionOutput, ConversionStats, GeneratedSpec};
use crate::pipeline::{compile, input, llm, package, postprocess};
use crate::progress::Stage;
use crate::prompts::NO_CONTEXT_SENTINEL;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Compile markup and write the serialised `.docx` to `sink`.
///
/// Malformed markup never fails: see [`crate::pipeline::compile`] for the
/// fallbacks. The only error is the sink refusing the bytes.
///
/// # Example
/// ```rust
/// let mut buf = Vec::new();
/// let summary = abap_techspec::write_document("1. OVERVIEW\nReads **VBAK**.", &mut buf).unwrap();
/// assert_eq!(summary.headings, 1);
/// assert!(buf.starts_with(b"PK"));
/// ```
pub fn write_document<W: Write + ?Sized>(
    markup: &str,
    sink: &mut W,
) -> Result<DocumentSummary, TechSpecError> {
    let document = compile::compile(markup);
    let summary = document.summary();
    let bytes = package::package_docx(&document)?;

    sink.write_all(&bytes)
        .and_then(|()| sink.flush())
        .map_err(|e| TechSpecError::SinkWriteFailed { source: e })?;

    debug!("Wrote {} bytes of docx to sink", bytes.len());
    Ok(summary)
}

/// Compile markup into an in-memory `.docx` buffer.
pub fn render_docx(markup: &str) -> Result<Vec<u8>, TechSpecError> {
    let mut buf = Vec::new();
    write_document(markup, &mut buf)?;
    Ok(buf)
}

/// Render an existing markup file (or `-` for stdin) to a `.docx` file.
///
/// No LLM is involved; useful for re-rendering a saved generation.
pub async fn render_markup_file(
    markup_input: &str,
    output_path: impl AsRef<Path>,
) -> Result<DocumentSummary, TechSpecError> {
    let markup = input::read_text(markup_input).await?;
    let mut buf = Vec::new();
    let summary = write_document(&markup.text, &mut buf)?;
    write_atomic(output_path.as_ref(), buf).await?;
    Ok(summary)
}

/// Produce specification markup for a block of ABAP source.
///
/// When the retriever returns no usable passages this short-circuits to
/// [`NO_CONTEXT_SENTINEL`] without contacting any provider; the sentinel is
/// ordinary content, not an error.
pub async fn generate_specification(
    source: &str,
    config: &GenerationConfig,
) -> Result<GeneratedSpec, TechSpecError> {
    let cb = config.progress_callback.as_ref();

    // ── Step 1: Retrieve context ─────────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_stage_start(Stage::Retrieve);
    }
    let passages = gather_context(source, config);
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Retrieve, &format!("{} passages", passages.len()));
    }

    if passages.is_empty() {
        info!("No knowledge-base context found; returning sentinel");
        return Ok(GeneratedSpec {
            markup: NO_CONTEXT_SENTINEL.to_string(),
            no_context: true,
            context_passages: 0,
            explanation_chars: 0,
            input_tokens: 0,
            output_tokens: 0,
        });
    }

    // ── Step 2: Resolve provider ─────────────────────────────────────────
    let provider = resolve_provider(config)?;

    // ── Step 3: Explain the source ───────────────────────────────────────
    if let Some(cb) = cb {
        cb.on_stage_start(Stage::Explain);
    }
    let explanation = llm::explain_source(&provider, source, config).await?;
    info!("Explanation: {} chars", explanation.content.len());
    if let Some(cb) = cb {
        cb.on_stage_complete(
            Stage::Explain,
            &format!("{} chars", explanation.content.len()),
        );
    }

    // ── Step 4: Draft the specification ──────────────────────────────────
    if let Some(cb) = cb {
        cb.on_stage_start(Stage::Draft);
    }
    let draft =
        llm::draft_specification(&provider, source, &explanation.content, &passages, config)
            .await?;
    let markup = postprocess::clean_markup(&draft.content);
    info!("Specification: {} chars", markup.len());
    if let Some(cb) = cb {
        cb.on_stage_complete(Stage::Draft, &format!("{} chars", markup.len()));
    }

    Ok(GeneratedSpec {
        markup,
        no_context: false,
        context_passages: passages.len(),
        explanation_chars: explanation.content.len(),
        input_tokens: explanation.input_tokens + draft.input_tokens,
        output_tokens: explanation.output_tokens + draft.output_tokens,
    })
}

/// Generate a specification and render it to `.docx` in memory.
pub async fn convert(
    source: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<ConversionOutput, TechSpecError> {
    let total_start = Instant::now();
    let source = source.as_ref();
    info!("Starting conversion of {} bytes of ABAP source", source.len());

    let generation_start = Instant::now();
    let generated = generate_specification(source, config).await?;
    let generation_duration_ms = generation_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(Stage::Render);
    }
    let render_start = Instant::now();
    let mut docx = Vec::new();
    let elements = write_document(&generated.markup, &mut docx)?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(Stage::Render, &format!("{} bytes", docx.len()));
    }

    let stats = ConversionStats {
        no_context: generated.no_context,
        context_passages: generated.context_passages,
        total_input_tokens: generated.input_tokens,
        total_output_tokens: generated.output_tokens,
        generation_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        docx_bytes: docx.len(),
        elements,
    };

    info!(
        "Conversion complete: {} headings, {} tables, {} bytes, {}ms total",
        stats.elements.headings, stats.elements.tables, stats.docx_bytes, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        markup: generated.markup,
        docx,
        stats,
    })
}

/// Generate a specification and write the `.docx` directly to a file.
///
/// Uses atomic write (temp file in the target directory + rename).
pub async fn convert_to_file(
    source: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<ConversionOutput, TechSpecError> {
    let output = convert(source, config).await?;
    write_atomic(output_path.as_ref(), output.docx.clone()).await?;
    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    source: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<ConversionOutput, TechSpecError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TechSpecError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(source, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Non-blank passages from the configured retriever.
fn gather_context(source: &str, config: &GenerationConfig) -> Vec<String> {
    let Some(ref retriever) = config.retriever else {
        debug!("No retriever configured");
        return Vec::new();
    };
    retriever
        .retrieve(source)
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect()
}

async fn write_atomic(path: &Path, bytes: Vec<u8>) -> Result<(), TechSpecError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || persist_bytes(&path, &bytes))
        .await
        .map_err(|e| TechSpecError::Internal(format!("writer task panicked: {e}")))?
}

/// Temp file next to `path`, then rename over it.
fn persist_bytes(path: &Path, bytes: &[u8]) -> Result<(), TechSpecError> {
    let write_err = |source: std::io::Error| TechSpecError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    debug!("Persisted {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`)
/// 2. **Named provider + model** (`config.provider_name`)
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`)
/// 4. **OpenAI** when `OPENAI_API_KEY` is set
/// 5. **Full auto-detection** (`ProviderFactory::from_env`)
fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, TechSpecError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| TechSpecError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, TechSpecError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        TechSpecError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
