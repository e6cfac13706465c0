//! Line classification for generator markup.
//!
//! The generator output has no schema beyond a handful of line-level
//! conventions. [`classify`] maps one trimmed line onto a small token
//! alphabet. It is pure and knows nothing about the current region; the
//! compiler decides what a token means while inside a code block or table.
//!
//! ## Priority
//!
//! Checks run in a fixed order and the first match wins:
//!
//! ```text
//! blank / separator  >  page break  >  fence  >  table row  >  header  >  plain
//! ```
//!
//! Reordering these changes output: `PAGE 2` would otherwise fall through
//! to plain text, and `|---|` rows would be swallowed as separators.

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker that opens and closes a code block.
pub const FENCE: &str = "```";

/// Classified form of one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineToken<'a> {
    /// Empty line or a horizontal-rule style separator such as `---`.
    Blank,
    /// `PAGE <n>` marker.
    PageBreak,
    /// Line starting with [`FENCE`]; any info string after it is ignored.
    Fence,
    /// Line that starts and ends with `|`.
    TableRow(&'a str),
    /// `<n>. ALL CAPS TITLE`.
    Header(&'a str),
    /// Anything else; paragraph or subheading text.
    Plain(&'a str),
}

static RE_PAGE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^PAGE\s+\d+$").unwrap());

static RE_SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s+[A-Z][A-Z0-9 &/\-]*$").unwrap());

/// Classify an already-trimmed line.
pub fn classify(line: &str) -> LineToken<'_> {
    if line.is_empty() || is_separator_line(line) {
        return LineToken::Blank;
    }
    if RE_PAGE_BREAK.is_match(line) {
        return LineToken::PageBreak;
    }
    if line.starts_with(FENCE) {
        return LineToken::Fence;
    }
    if is_table_row(line) {
        return LineToken::TableRow(line);
    }
    if RE_SECTION_HEADER.is_match(line) {
        return LineToken::Header(line);
    }
    LineToken::Plain(line)
}

/// Three or more rule characters, optionally space-separated (`---`, `* * *`).
fn is_separator_line(line: &str) -> bool {
    let mut count = 0usize;
    for c in line.chars() {
        match c {
            '-' | '=' | '_' | '*' => count += 1,
            ' ' | '\t' => {}
            _ => return false,
        }
    }
    count >= 3
}

/// A line that starts and ends with the pipe delimiter.
///
/// A lone `|` counts: it yields a one-cell row with empty content.
pub fn is_table_row(line: &str) -> bool {
    line.starts_with('|') && line.ends_with('|')
}

/// A GFM alignment row such as `| --- | :---: |`.
pub fn is_alignment_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|')
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}
