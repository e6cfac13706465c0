//! Markup compiler: the block accumulator state machine.
//!
//! [`Compiler`] consumes markup one line at a time, buffers lines into
//! logical blocks and hands each completed block to the renderer. All parse
//! state lives in the compiler value itself, so concurrent requests simply
//! use separate instances.
//!
//! ## State Machine
//!
//! ```text
//! Normal --fence-->         InCodeBlock --fence-->  Normal     [CodeBlock]
//! Normal --table row-->     InTable     --other-->  Normal     [Table, flush, re-process line]
//! Normal --header-->        Normal                             [flush, start Section]
//! Normal --page break-->    Normal                             [flush, PageBreak]
//! Normal --plain-->         Normal                             [accumulate]
//! any    --end of input-->  terminal                           [close open region, flush]
//! ```
//!
//! Blank and separator lines never change state. A page break inside a code
//! block is honoured (it outranks the fence check) and the code region stays
//! open across it.

use crate::document::{Document, Element};
use crate::pipeline::markup::{classify, LineToken};
use crate::pipeline::render;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

/// Multi-line region the compiler is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Normal,
    InCodeBlock,
    InTable,
}

/// A classified block ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Paragraph(String),
    Subheading(String),
    CodeBlock(Vec<String>),
    /// Raw `|`-delimited row lines; the first is the header.
    Table(Vec<String>),
}

/// Section item waiting for the next flush. Plain lines are classified
/// into paragraphs or subheadings only when flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Line(String),
    Code(Vec<String>),
    Table(Vec<String>),
}

#[derive(Debug, Default)]
struct Section {
    heading: Option<String>,
    pending: Vec<Pending>,
}

/// Streaming markup → [`Document`] compiler.
#[derive(Debug)]
pub struct Compiler {
    region: Region,
    section: Section,
    code_lines: Vec<String>,
    table_rows: Vec<String>,
    document: Document,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            region: Region::Normal,
            section: Section::default(),
            code_lines: Vec::new(),
            table_rows: Vec::new(),
            document: Document::new(),
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// The document rendered so far (pending blocks excluded).
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Feed one raw input line. Surrounding whitespace is trimmed.
    pub fn feed_line(&mut self, raw: &str) {
        let line = raw.trim();
        let token = classify(line);

        match self.region {
            Region::InCodeBlock => match token {
                LineToken::Blank => {}
                LineToken::PageBreak => self.page_break(),
                LineToken::Fence => self.close_code_block(),
                _ => self.code_lines.push(line.to_string()),
            },
            Region::InTable => match token {
                LineToken::Blank => {}
                LineToken::TableRow(row) => self.table_rows.push(row.to_string()),
                other => {
                    self.close_table();
                    self.apply_normal(other);
                }
            },
            Region::Normal => self.apply_normal(token),
        }
    }

    fn apply_normal(&mut self, token: LineToken<'_>) {
        match token {
            LineToken::Blank => {}
            LineToken::PageBreak => self.page_break(),
            LineToken::Fence => {
                trace!("Entering code block");
                self.region = Region::InCodeBlock;
            }
            LineToken::TableRow(row) => {
                trace!("Entering table");
                self.region = Region::InTable;
                self.table_rows.push(row.to_string());
            }
            LineToken::Header(text) => {
                self.flush();
                self.section.heading = Some(text.to_string());
            }
            LineToken::Plain(text) => self.section.pending.push(Pending::Line(text.to_string())),
        }
    }

    fn page_break(&mut self) {
        self.flush();
        self.document.push(Element::PageBreak);
    }

    fn close_code_block(&mut self) {
        let lines = std::mem::take(&mut self.code_lines);
        trace!("Closing code block with {} lines", lines.len());
        self.section.pending.push(Pending::Code(lines));
        self.region = Region::Normal;
    }

    fn close_table(&mut self) {
        let rows = std::mem::take(&mut self.table_rows);
        trace!("Closing table with {} rows", rows.len());
        self.section.pending.push(Pending::Table(rows));
        self.region = Region::Normal;
        self.flush();
    }

    /// Render the current heading and all pending blocks, in order.
    ///
    /// A no-op when nothing is pending. Open code/table buffers are not
    /// touched; they join the section only when their region closes.
    pub fn flush(&mut self) {
        if let Some(heading) = self.section.heading.take() {
            self.document.push(render::render_heading(&heading));
        }
        if self.section.pending.is_empty() {
            return;
        }
        debug!("Flushing {} pending blocks", self.section.pending.len());

        for item in self.section.pending.drain(..) {
            let block = match item {
                Pending::Line(line) => classify_content(line),
                Pending::Code(lines) => ContentBlock::CodeBlock(lines),
                Pending::Table(rows) => ContentBlock::Table(rows),
            };
            if let Some(element) = render::render_block(block) {
                self.document.push(element);
            }
        }
    }

    /// Close any open region, flush, and return the finished document.
    pub fn finish(mut self) -> Document {
        match self.region {
            Region::InCodeBlock => {
                debug!(
                    "Input ended inside a code block; closing it with {} lines",
                    self.code_lines.len()
                );
                self.close_code_block();
            }
            Region::InTable => {
                debug!("Input ended inside a table; closing it");
                self.close_table();
            }
            Region::Normal => {}
        }
        self.flush();
        self.document
    }
}

/// Compile a whole markup string into a document.
pub fn compile(markup: &str) -> Document {
    let mut compiler = Compiler::new();
    for line in markup.lines() {
        compiler.feed_line(line);
    }
    compiler.finish()
}

// ── Subheading heuristic ─────────────────────────────────────────────────────

static RE_BOLD_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*([^*]+)\*\*\s*([:\-–]?)\s*$").unwrap());

/// Longest bold label (in words) that may carry trailing punctuation and
/// still count as a subheading.
const SHORT_LABEL_WORDS: usize = 3;

/// Decide whether a plain line is a subheading or a paragraph.
///
/// * `**Processing Logic**` and `**Processing Logic:**`: the whole line is
///   one bold span: subheading.
/// * `**Inputs**:`: a bold span of at most three words followed only by
///   punctuation: subheading.
/// * anything else, including `**Note:** text`: paragraph.
pub fn classify_content(line: String) -> ContentBlock {
    let label = RE_BOLD_LABEL.captures(&line).and_then(|caps| {
        let tail = caps.get(2).map_or("", |m| m.as_str());
        let inner = caps.get(1)?.as_str();
        let words = inner.split_whitespace().count();
        (words > 0 && (tail.is_empty() || words <= SHORT_LABEL_WORDS)).then(|| inner.to_string())
    });

    match label {
        // Only the text inside the markers; trailing `:`/`-` punctuation is dropped.
        Some(label) => ContentBlock::Subheading(label),
        None => ContentBlock::Paragraph(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Run, Table, DOCUMENT_TITLE};
    use pretty_assertions::assert_eq;

    fn body(markup: &str) -> Vec<Element> {
        compile(markup).body().to_vec()
    }

    fn para(text: &str) -> Element {
        Element::Paragraph(vec![Run::plain(text)])
    }

    #[test]
    fn header_paragraph_table_page_break_scenario() {
        let markup = [
            "1. OVERVIEW",
            "This is **important**.",
            "|A|B|",
            "|1|2|",
            "PAGE 2",
            "2. DETAILS",
            "text",
        ]
        .join("\n");

        assert_eq!(
            body(&markup),
            vec![
                Element::Heading("1. OVERVIEW".into()),
                Element::Paragraph(vec![
                    Run::plain("This is "),
                    Run::bold("important"),
                    Run::plain("."),
                ]),
                Element::Table(Table {
                    header: vec!["A".into(), "B".into()],
                    rows: vec![vec!["1".into(), "2".into()]],
                }),
                Element::PageBreak,
                Element::Heading("2. DETAILS".into()),
                para("text"),
            ]
        );
    }

    #[test]
    fn empty_and_whitespace_input_yield_title_only() {
        for input in ["", "   ", "\n\n\t\n", "---\n***"] {
            let doc = compile(input);
            assert_eq!(
                doc.elements(),
                &[Element::Title(DOCUMENT_TITLE.into())],
                "input {input:?}"
            );
        }
    }

    #[test]
    fn sentinel_is_single_paragraph() {
        let sentinel = crate::prompts::NO_CONTEXT_SENTINEL;
        assert_eq!(body(sentinel), vec![para(sentinel)]);
    }

    #[test]
    fn flush_on_empty_state_is_noop() {
        let mut c = Compiler::new();
        c.flush();
        c.flush();
        assert_eq!(c.document().len(), 1);

        c.feed_line("hello");
        c.flush();
        let after_first = c.document().len();
        c.flush();
        assert_eq!(c.document().len(), after_first);
    }

    #[test]
    fn flush_leaves_open_regions_alone() {
        let mut c = Compiler::new();
        c.feed_line("```");
        c.feed_line("WRITE 'x'.");
        c.flush();
        assert_eq!(c.region(), Region::InCodeBlock);
        assert_eq!(c.document().len(), 1);
        assert_eq!(
            c.finish().body(),
            &[Element::CodeBlock("WRITE 'x'.".into())]
        );
    }

    #[test]
    fn unterminated_code_fence_is_emitted() {
        assert_eq!(
            body("intro\n```abap\nDATA lv TYPE i.\nlv = 1."),
            vec![
                para("intro"),
                Element::CodeBlock("DATA lv TYPE i.\nlv = 1.".into()),
            ]
        );
    }

    #[test]
    fn code_lines_are_not_classified() {
        assert_eq!(
            body("```\n1. NOT A HEADER\n|not|a table|\n**not bold**\n```"),
            vec![Element::CodeBlock(
                "1. NOT A HEADER\n|not|a table|\n**not bold**".into()
            )]
        );
    }

    #[test]
    fn empty_code_block_still_renders() {
        assert_eq!(body("```\n```"), vec![Element::CodeBlock(String::new())]);
    }

    #[test]
    fn code_block_keeps_arrival_order() {
        assert_eq!(
            body("1. LOGIC\nbefore\n```\nx = 1.\n```\nafter"),
            vec![
                Element::Heading("1. LOGIC".into()),
                para("before"),
                Element::CodeBlock("x = 1.".into()),
                para("after"),
            ]
        );
    }

    #[test]
    fn page_break_inside_code_block_keeps_region_open() {
        assert_eq!(
            body("```\na\nPAGE 4\nb\n```"),
            vec![Element::PageBreak, Element::CodeBlock("a\nb".into())]
        );
    }

    #[test]
    fn trailing_table_is_emitted() {
        assert_eq!(
            body("|H1|H2|\n|a|b|"),
            vec![Element::Table(Table {
                header: vec!["H1".into(), "H2".into()],
                rows: vec![vec!["a".into(), "b".into()]],
            })]
        );
    }

    #[test]
    fn table_interrupted_by_header_flushes_then_reclassifies() {
        assert_eq!(
            body("|A|\n|1|\n2. NEXT"),
            vec![
                Element::Table(Table {
                    header: vec!["A".into()],
                    rows: vec![vec!["1".into()]],
                }),
                Element::Heading("2. NEXT".into()),
            ]
        );
    }

    #[test]
    fn fence_inside_table_closes_table_first() {
        assert_eq!(
            body("|A|\n```\ncode\n```"),
            vec![
                Element::Table(Table {
                    header: vec!["A".into()],
                    rows: vec![],
                }),
                Element::CodeBlock("code".into()),
            ]
        );
    }

    #[test]
    fn blank_line_does_not_end_table() {
        let doc = body("|A|B|\n\n|1|2|\nafter");
        assert_eq!(doc.len(), 2);
        match &doc[0] {
            Element::Table(t) => assert_eq!(t.rows.len(), 1),
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn zero_row_table_is_dropped() {
        assert_eq!(body("|---|---|\ntext"), vec![para("text")]);
    }

    #[test]
    fn heading_emitted_once_per_section() {
        assert_eq!(
            body("1. SCOPE\n|A|\nafter table\nPAGE 2\nnext page"),
            vec![
                Element::Heading("1. SCOPE".into()),
                Element::Table(Table {
                    header: vec!["A".into()],
                    rows: vec![],
                }),
                para("after table"),
                Element::PageBreak,
                para("next page"),
            ]
        );
    }

    #[test]
    fn heading_without_content_still_renders() {
        assert_eq!(
            body("1. EMPTY\n2. ALSO EMPTY"),
            vec![
                Element::Heading("1. EMPTY".into()),
                Element::Heading("2. ALSO EMPTY".into()),
            ]
        );
    }

    #[test]
    fn subheading_classification() {
        let cases = [
            ("**Processing Logic**", true),
            ("**Processing Logic:**", true),
            ("**Inputs**:", true),
            ("**A very long label here**:", false),
            ("**Note:** the report runs nightly", false),
            ("**a** and **b**", false),
            ("plain text", false),
        ];
        for (line, expected) in cases {
            let is_sub = matches!(classify_content(line.into()), ContentBlock::Subheading(_));
            assert_eq!(is_sub, expected, "line {line:?}");
        }
    }

    #[test]
    fn subheading_rendered_stripped() {
        assert_eq!(
            body("**Selection Screen:**"),
            vec![Element::Subheading("Selection Screen".into())]
        );
    }

    #[test]
    fn dash_tailed_subheading_drops_markers() {
        for line in ["**Inputs** -", "**Inputs** –", "**Inputs**:", "**Inputs** :"] {
            assert_eq!(
                body(line),
                vec![Element::Subheading("Inputs".into())],
                "line {line:?}"
            );
        }
    }

    #[test]
    fn lines_are_trimmed() {
        assert_eq!(
            body("   1. OVERVIEW   \n\t indented text  "),
            vec![Element::Heading("1. OVERVIEW".into()), para("indented text")]
        );
    }

    /// Every non-blank, non-separator line must surface in some element.
    #[test]
    fn no_content_loss() {
        let inputs = [
            "1. OVERVIEW\nalpha\n|x|y|\n|1|2|\nbeta\n```\ngamma\n```\nPAGE 3\ndelta",
            "```\nunterminated\ncode",
            "|open|table\nnot a row|\n|a|b|",
            "**Label:**\n**bold** tail\n2. END\nomega",
            "|h|\n```\nc1\n|r|\n```\n3. AFTER\nz",
        ];

        for input in inputs {
            let doc = compile(input);
            let mut rendered = String::new();
            for el in doc.body() {
                match el {
                    Element::Heading(t) | Element::Subheading(t) | Element::CodeBlock(t) => {
                        rendered.push_str(t)
                    }
                    Element::Paragraph(runs) => {
                        for r in runs {
                            rendered.push_str(&r.text);
                        }
                    }
                    Element::Table(t) => {
                        rendered.push_str(&t.header.join(" "));
                        for row in &t.rows {
                            rendered.push_str(&row.join(" "));
                        }
                    }
                    Element::PageBreak | Element::Title(_) => {}
                }
                rendered.push('\n');
            }

            for line in input.lines().map(str::trim) {
                if matches!(classify(line), LineToken::Blank | LineToken::PageBreak | LineToken::Fence) {
                    continue;
                }
                let needle = line.trim_matches(|c: char| c == '|' || c == '*' || c == ':');
                for word in needle.split(|c: char| c == '|' || c == '*').map(str::trim) {
                    assert!(
                        word.is_empty() || rendered.contains(word),
                        "{word:?} from {line:?} missing in {rendered:?}"
                    );
                }
            }
        }
    }
}
