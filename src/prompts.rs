//! Prompts for the two-step ABAP → technical specification generation.
//!
//! All prompt text lives here so the wording can change without touching
//! retry or error-handling logic in [`crate::pipeline::llm`]. Callers can
//! override both system prompts through [`crate::config::GenerationConfig`];
//! the constants are used only when no override is provided.
//!
//! The specification prompt asks the model for exactly the line-level
//! conventions the markup compiler understands: numbered ALL-CAPS section
//! titles, `PAGE n` markers, pipe tables, fenced code and `**bold**` labels.

/// Returned instead of a specification when retrieval finds nothing.
///
/// The compiler renders it as one ordinary paragraph.
pub const NO_CONTEXT_SENTINEL: &str =
    "No relevant context found in the RAG base. Please verify the ABAP code or knowledge file.";

/// System prompt for step 1: explain the ABAP source.
pub const EXPLANATION_SYSTEM_PROMPT: &str = "You are an experienced SAP Techno-Functional Architect. \
Explain the given ABAP code line-by-line in detail from both a technical and functional perspective.";

/// System prompt for step 2: write the specification.
pub const SPECIFICATION_SYSTEM_PROMPT: &str = r#"You are an SAP ABAP Technical Architect writing a Technical Specification Document.

Follow these formatting rules precisely, the output is converted to a Word document by a strict line-based parser:

1. SECTIONS
   - Start every section on its own line as "<number>. <TITLE IN CAPITAL LETTERS>", e.g. "1. OVERVIEW"
   - Do not use # Markdown headings

2. SUBHEADINGS
   - Put a short label alone on its line in bold, e.g. "**Selection Screen:**"

3. EMPHASIS
   - Use **double asterisks** for bold; no italics, no nesting

4. TABLES
   - Use pipe tables, every row starting and ending with "|"
   - The first row is the header row

5. CODE
   - Wrap code in triple backticks, each fence on its own line

6. PAGINATION
   - Insert "PAGE <n>" alone on a line where a new page should start

7. OUTPUT FORMAT
   - Output ONLY the document content
   - Do NOT wrap the whole answer in ```markdown fences
   - Do NOT add commentary before or after the document"#;

/// Join the explanation and retrieved passages into one context block.
pub fn combined_context(explanation: &str, passages: &[String]) -> String {
    format!(
        "### Technical & Functional Explanation:\n{}\n\n### RAG Knowledge Base Context:\n{}",
        explanation,
        passages.join("\n\n")
    )
}

/// Build the user message for step 2.
pub fn specification_request(context: &str, abap_code: &str, min_words: usize) -> String {
    format!(
        "Based on the following explanation, RAG context, and ABAP code, generate a detailed and \
professionally formatted Technical Specification Document (minimum {min_words} words) with \
DOCX-compatible formatting, section titles, and numbering.\n\n\
Context:\n{context}\n\n\
ABAP Code:\n{abap_code}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_context_has_both_sections() {
        let ctx = combined_context("explains", &["p1".into(), "p2".into()]);
        assert!(ctx.starts_with("### Technical & Functional Explanation:\nexplains"));
        assert!(ctx.ends_with("### RAG Knowledge Base Context:\np1\n\np2"));
    }

    #[test]
    fn specification_request_embeds_inputs() {
        let req = specification_request("CTX", "REPORT z_demo.", 2000);
        assert!(req.contains("minimum 2000 words"));
        assert!(req.contains("Context:\nCTX"));
        assert!(req.ends_with("ABAP Code:\nREPORT z_demo."));
    }

    #[test]
    fn system_prompt_matches_compiler_conventions() {
        assert!(SPECIFICATION_SYSTEM_PROMPT.contains("1. OVERVIEW"));
        assert!(SPECIFICATION_SYSTEM_PROMPT.contains("PAGE <n>"));
    }
}
