//! Post-processing: deterministic cleanup of generated markup.
//!
//! The markup compiler tolerates almost anything, but a few model habits
//! would still change the rendered document:
//!
//! - wrapping the whole answer in a ` ```markdown ... ``` ` fence, which the
//!   compiler would faithfully render as one giant code block
//! - Windows `\r\n` / bare `\r` line endings
//! - invisible Unicode (zero-width spaces, BOM, soft hyphens) that slip into
//!   section titles and stop them matching the header pattern
//!
//! Line endings are normalised first so the fence pattern only has to
//! match `\n`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw generator output.
///
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip an outer ```` ```markdown ```` fence wrapping the whole answer
/// 3. Strip invisible Unicode
pub fn clean_markup(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_outer_fence(&s);
    remove_invisible_chars(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip outer fence ────────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md|text)?\n(.*)\n```\s*$").unwrap());

/// Only a fence that wraps the *entire* answer is removed; a response that
/// merely starts with a code listing keeps its fences.
fn strip_outer_fence(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCE.captures(trimmed) {
        Some(caps) if !caps[1].lines().any(|l| l.trim_start().starts_with("```")) => {
            caps[1].to_string()
        }
        _ => input.to_string(),
    }
}

// ── Rule 3: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}
