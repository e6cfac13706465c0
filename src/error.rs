//! Error types for the abap-techspec library.
//!
//! There is deliberately only one error type. Everything that can go wrong
//! with the *shape* of the generated markup (unbalanced fences, ragged
//! tables, stray `**` markers) is resolved locally by the compiler with a
//! deterministic fallback and never reaches this module.
//!
//! What remains are genuinely fatal conditions:
//!
//! * the ABAP source could not be read,
//! * the LLM provider is missing or kept failing after all retries,
//! * the caller's sink rejected the serialised document bytes.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the abap-techspec library.
#[derive(Debug, Error)]
pub enum TechSpecError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source file was not found at the given path.
    #[error("Source file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The source was read but contains nothing but whitespace.
    #[error("Source '{origin}' is empty; nothing to document")]
    EmptySource { origin: String },

    /// Reading the source failed for another I/O reason.
    #[error("Failed to read source '{origin}': {source}")]
    SourceReadFailed {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API kept failing after every retry.
    #[error("LLM API error during {stage} after {retries} retries: {message}")]
    LlmApiError {
        stage: String,
        retries: u32,
        message: String,
    },

    /// A single LLM call exceeded the configured timeout.
    #[error("LLM call timed out after {secs}s during {stage}")]
    ApiTimeout { stage: String, secs: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The caller-supplied sink rejected the document bytes.
    #[error("Failed to write document to sink: {source}")]
    SinkWriteFailed {
        #[source]
        source: std::io::Error,
    },

    /// Building the in-memory `.docx` archive failed.
    #[error("Failed to package document: {0}")]
    Packaging(String),

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zip::result::ZipError> for TechSpecError {
    fn from(e: zip::result::ZipError) -> Self {
        TechSpecError::Packaging(e.to_string())
    }
}
