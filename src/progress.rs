//! Progress-callback trait for generation stage events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to follow
//! a run as it moves through retrieval, the two LLM calls and rendering.
//! The CLI forwards these events to a spinner; a server could forward them
//! to a log or a websocket.
//!
//! # Example
//!
//! ```rust
//! use abap_techspec::{GenerationConfig, GenerationProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl GenerationProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("→ {}", stage);
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// A step of the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Knowledge-base lookup.
    Retrieve,
    /// LLM call 1: line-by-line explanation of the source.
    Explain,
    /// LLM call 2: the specification markup itself.
    Draft,
    /// Markup → `.docx`.
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Retrieve => "retrieval",
            Stage::Explain => "explanation",
            Stage::Draft => "specification",
            Stage::Render => "rendering",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as it moves through each [`Stage`].
///
/// All methods have no-op defaults so callers override only what they need.
pub trait GenerationProgressCallback: Send + Sync {
    /// A stage is about to run.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// A stage finished; `detail` is a short human-readable summary
    /// (passage count, characters generated, bytes written).
    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        let _ = (stage, detail);
    }

    /// An LLM call failed and will be retried after `backoff_ms`.
    fn on_retry(&self, stage: Stage, attempt: u32, backoff_ms: u64, error: &str) {
        let _ = (stage, attempt, backoff_ms, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
