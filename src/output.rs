//! Result types returned by the conversion entry points.

use crate::document::DocumentSummary;
use serde::{Deserialize, Serialize};

/// Markup produced by the generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSpec {
    /// Cleaned markup, ready for [`crate::convert::write_document`].
    pub markup: String,

    /// `true` when retrieval found nothing and `markup` is the sentinel.
    pub no_context: bool,

    /// Number of knowledge-base passages fed into the prompt.
    pub context_passages: usize,

    /// Characters in the intermediate explanation (0 for the sentinel).
    pub explanation_chars: usize,

    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Everything produced by [`crate::convert::convert`].
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Markup the document was rendered from.
    pub markup: String,

    /// Serialised `.docx` bytes.
    #[serde(skip)]
    pub docx: Vec<u8>,

    pub stats: ConversionStats,
}

/// Aggregate statistics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub no_context: bool,
    pub context_passages: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// Wall-clock time spent in LLM calls.
    pub generation_duration_ms: u64,
    /// Wall-clock time spent compiling and packaging.
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
    pub docx_bytes: usize,
    pub elements: DocumentSummary,
}
