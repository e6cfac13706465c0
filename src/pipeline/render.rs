//! Block rendering: map a completed content block onto document elements.
//!
//! Rendering never fails. Ragged tables are squared off against the header
//! row, unbalanced `**` markers are kept as literal text, and a table with
//! no usable rows renders to nothing.

use crate::document::{Element, Run, Table};
use crate::pipeline::compile::ContentBlock;
use crate::pipeline::markup::is_alignment_row;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Render one block. Returns `None` only for a zero-row table.
pub fn render_block(block: ContentBlock) -> Option<Element> {
    match block {
        ContentBlock::Paragraph(text) => Some(render_paragraph(&text)),
        ContentBlock::Subheading(text) => Some(render_subheading(&text)),
        ContentBlock::CodeBlock(lines) => Some(render_code_block(&lines)),
        ContentBlock::Table(rows) => render_table(&rows).map(Element::Table),
    }
}

pub fn render_heading(text: &str) -> Element {
    Element::Heading(text.to_uppercase())
}

/// Subheading text with surrounding asterisks, colons, dashes and
/// whitespace removed.
pub fn render_subheading(text: &str) -> Element {
    let stripped = text
        .trim_matches(|c: char| matches!(c, '*' | ':' | '-' | '–') || c.is_whitespace())
        .to_string();
    Element::Subheading(stripped)
}

pub fn render_paragraph(text: &str) -> Element {
    Element::Paragraph(parse_emphasis(text))
}

pub fn render_code_block(lines: &[String]) -> Element {
    Element::CodeBlock(lines.join("\n"))
}

// ── Inline emphasis ──────────────────────────────────────────────────────────

static RE_BOLD_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

/// Split text into runs on `**bold**` spans.
///
/// Non-nesting, left to right, first match wins. Text after the last
/// matched span is appended verbatim, so a dangling `**` stays literal.
/// Empty plain segments between adjacent spans are not emitted.
pub fn parse_emphasis(text: &str) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut cursor = 0;

    for caps in RE_BOLD_SPAN.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > cursor {
            runs.push(Run::plain(&text[cursor..whole.start()]));
        }
        runs.push(Run::bold(inner.as_str()));
        cursor = whole.end();
    }

    if cursor < text.len() || runs.is_empty() {
        runs.push(Run::plain(&text[cursor..]));
    }
    runs
}

// ── Tables ───────────────────────────────────────────────────────────────────

/// Split a raw `| a | b |` row into trimmed cells.
pub fn split_cells(row: &str) -> Vec<String> {
    row.trim()
        .trim_matches('|')
        .split('|')
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// Build a grid table from raw row lines.
///
/// The first non-alignment row is the header and fixes the column count.
/// Only an alignment row directly under the header is skipped; later rows
/// are data even when they look like `| - | - |`. Data rows are truncated
/// or padded with empty cells to match the header.
pub fn render_table(rows: &[String]) -> Option<Table> {
    let mut lines = rows
        .iter()
        .map(String::as_str)
        .skip_while(|row| is_alignment_row(row))
        .peekable();

    let Some(header) = lines.next().map(split_cells) else {
        debug!("Dropping table with no usable rows ({} raw lines)", rows.len());
        return None;
    };
    lines.next_if(|row| is_alignment_row(row));
    let parsed = lines.map(split_cells);
    let columns = header.len();

    let body = parsed
        .map(|mut cells| {
            if cells.len() > columns {
                debug!(
                    "Table row has {} cells, header has {}; extra cells dropped",
                    cells.len(),
                    columns
                );
            }
            cells.resize(columns, String::new());
            cells
        })
        .collect();

    Some(Table {
        header,
        rows: body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn emphasis_three_runs() {
        assert_eq!(
            parse_emphasis("plain **bold** plain"),
            vec![Run::plain("plain "), Run::bold("bold"), Run::plain(" plain")]
        );
    }

    #[test]
    fn emphasis_unmatched_marker_is_literal() {
        assert_eq!(
            parse_emphasis("plain **not closed"),
            vec![Run::plain("plain **not closed")]
        );
    }

    #[test]
    fn emphasis_odd_marker_after_pair() {
        assert_eq!(
            parse_emphasis("**a** and ** dangling"),
            vec![Run::bold("a"), Run::plain(" and ** dangling")]
        );
    }

    #[test]
    fn emphasis_adjacent_spans() {
        assert_eq!(
            parse_emphasis("**a****b**"),
            vec![Run::bold("a"), Run::bold("b")]
        );
    }

    #[test]
    fn emphasis_empty_pair_is_literal() {
        assert_eq!(parse_emphasis("x **** y"), vec![Run::plain("x **** y")]);
    }

    #[test]
    fn emphasis_multibyte_text() {
        assert_eq!(
            parse_emphasis("Größe **Ä** ✓"),
            vec![Run::plain("Größe "), Run::bold("Ä"), Run::plain(" ✓")]
        );
    }

    #[test]
    fn heading_is_upper_cased() {
        assert_eq!(
            render_heading("1. Overview"),
            Element::Heading("1. OVERVIEW".into())
        );
    }

    #[test]
    fn subheading_strips_markers() {
        assert_eq!(
            render_subheading("**Input Parameters:**"),
            Element::Subheading("Input Parameters".into())
        );
        assert_eq!(
            render_subheading("**Notes**:"),
            Element::Subheading("Notes".into())
        );
        assert_eq!(
            render_subheading("**Outputs** –"),
            Element::Subheading("Outputs".into())
        );
    }

    #[test]
    fn code_block_joins_lines() {
        let lines = vec!["DATA lv TYPE i.".to_string(), "lv = 1.".to_string()];
        assert_eq!(
            render_code_block(&lines),
            Element::CodeBlock("DATA lv TYPE i.\nlv = 1.".into())
        );
    }

    fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn table_header_and_rows() {
        let table = render_table(&rows(&["| A | B |", "|---|---|", "| 1 | 2 |"])).unwrap();
        assert_eq!(table.header, vec!["A", "B"]);
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn table_extra_cells_dropped_short_rows_padded() {
        let table =
            render_table(&rows(&["|A|B|", "|1|2|3|4|", "|x|", "|p|q|"])).unwrap();
        assert_eq!(table.columns(), 2);
        assert_eq!(
            table.rows,
            vec![
                vec!["1".to_string(), "2".to_string()],
                vec!["x".to_string(), String::new()],
                vec!["p".to_string(), "q".to_string()],
            ]
        );
    }

    #[test]
    fn table_with_only_alignment_rows_is_dropped() {
        assert_eq!(render_table(&rows(&["|---|---|"])), None);
        assert_eq!(render_table(&[]), None);
    }

    #[test]
    fn dash_data_rows_are_kept() {
        let table = render_table(&rows(&[
            "| Field | Check |",
            "| --- | --- |",
            "| VBELN | - |",
            "| - | - |",
            "|---|---|",
        ]))
        .unwrap();
        assert_eq!(
            table.rows,
            vec![
                vec!["VBELN".to_string(), "-".to_string()],
                vec!["-".to_string(), "-".to_string()],
                vec!["---".to_string(), "---".to_string()],
            ]
        );
    }

    #[test]
    fn header_only_table_renders() {
        let table = render_table(&rows(&["| Field | Type |"])).unwrap();
        assert_eq!(table.header, vec!["Field", "Type"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn render_block_dispatch() {
        assert_eq!(
            render_block(ContentBlock::Paragraph("hi".into())),
            Some(Element::Paragraph(vec![Run::plain("hi")]))
        );
        assert_eq!(render_block(ContentBlock::Table(rows(&["|---|"]))), None);
    }
}
