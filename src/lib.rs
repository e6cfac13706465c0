//! # abap-techspec
//!
//! Turn ABAP source into a Word technical-specification document.
//!
//! ## Why this crate?
//!
//! An LLM can describe an ABAP program well, but its markdown-ish output is
//! not something a functional team can sign off. This crate keeps the LLM
//! at arm's length: it asks for loosely structured markup and then compiles
//! that markup, line by line, into a styled `.docx` with headings, bold runs,
//! code blocks, grid tables and page breaks. The compiler never rejects
//! input; every surprise in the markup degrades to a plain paragraph.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ABAP source
//!  │
//!  ├─ 1. Retrieve  knowledge-base passages (none → sentinel, no LLM call)
//!  ├─ 2. Explain   LLM call 1: technical & functional walkthrough
//!  ├─ 3. Draft     LLM call 2: specification markup
//!  ├─ 4. Clean     strip wrapper fences and invisible characters
//!  ├─ 5. Compile   line-oriented state machine → document elements
//!  └─ 6. Package   WordprocessingML zip → `.docx` bytes
//! ```
//!
//! Steps 5–6 are available on their own through [`write_document`] and
//! [`render_docx`] and need no API key.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use abap_techspec::{convert_to_file, GenerationConfig, StaticRetriever};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let kb = StaticRetriever::from_files(&["kb/sales_tables.txt"])?;
//!     let config = GenerationConfig::builder()
//!         .retriever(Arc::new(kb))
//!         .build()?;
//!
//!     let abap = std::fs::read_to_string("zsd_report.abap")?;
//!     let output = convert_to_file(&abap, "technical_spec.docx", &config).await?;
//!     eprintln!("{} headings, {} tables",
//!         output.stats.elements.headings,
//!         output.stats.elements.tables);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `abap2ts` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! abap-techspec = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, DEFAULT_MODEL};
pub use convert::{
    convert, convert_sync, convert_to_file, generate_specification, render_docx,
    render_markup_file, write_document,
};
pub use document::{Document, DocumentSummary, Element, Run, Table, DOCUMENT_TITLE};
pub use error::TechSpecError;
pub use output::{ConversionOutput, ConversionStats, GeneratedSpec};
pub use pipeline::compile::compile;
pub use pipeline::package::DOCX_MIME_TYPE;
pub use pipeline::retrieve::{ContextRetriever, StaticRetriever};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use prompts::NO_CONTEXT_SENTINEL;
