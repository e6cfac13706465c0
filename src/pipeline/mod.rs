//! Pipeline stages for ABAP → technical specification conversion.
//!
//! Each submodule implements exactly one step so it can be tested in
//! isolation.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ retrieve ──▶ llm ──▶ postprocess ──▶ markup ─▶ compile ─▶ render ──▶ package
//! (file)    (passages)   (2×)    (cleanup)       └──── markup compiler ─────┘    (.docx)
//! ```
//!
//! 1. [`input`]       — read the ABAP source from a file or stdin
//! 2. [`retrieve`]    — knowledge-base passages via [`retrieve::ContextRetriever`]
//! 3. [`llm`]         — explanation + specification calls with retry/backoff
//! 4. [`postprocess`] — strip wrapper fences and invisible characters
//! 5. [`markup`]      — classify each line into a token
//! 6. [`compile`]     — region state machine and block accumulator
//! 7. [`render`]      — blocks → styled document elements
//! 8. [`package`]     — document → Office Open XML bytes
//!
//! Stages 5–8 are synchronous, deterministic and never fail on input shape.

pub mod compile;
pub mod input;
pub mod llm;
pub mod markup;
pub mod package;
pub mod postprocess;
pub mod render;
pub mod retrieve;
