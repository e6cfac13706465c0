//! The rendered document model and its fixed style table.
//!
//! A [`Document`] is an append-only sequence of [`Element`]s. The compiler
//! owns one instance per call and hands it to the packager once the whole
//! markup has been consumed; nothing reads it back in between.
//!
//! Styles are not configurable. Downstream consumers of the generated
//! specifications rely on this exact visual contract:
//!
//! | Element    | Weight          | Color  | Size    | Spacing after |
//! |------------|-----------------|--------|---------|---------------|
//! | Heading    | bold            | blue   | 14 pt   | 12 pt         |
//! | Subheading | bold            | blue   | 12 pt   | 6 pt          |
//! | Paragraph  | bold spans only | —      | —       | 6 pt          |
//! | Code block | regular         | —      | 10 pt   | 6 pt          |

use serde::Serialize;

/// Text of the fixed title element that opens every document.
pub const DOCUMENT_TITLE: &str = "TECHNICAL SPECIFICATION";

/// Visual attributes applied to every run of one element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    /// Force every run bold (headings); paragraphs only bold emphasised runs.
    pub bold: bool,
    /// Hex RGB colour without the leading `#`.
    pub color: Option<&'static str>,
    /// Font size in points.
    pub size_pt: Option<u32>,
    /// Paragraph spacing after, in points.
    pub space_after_pt: Option<u32>,
    /// Font family override.
    pub font: Option<&'static str>,
}

pub const HEADING_STYLE: TextStyle = TextStyle {
    bold: true,
    color: Some("0000FF"),
    size_pt: Some(14),
    space_after_pt: Some(12),
    font: None,
};

pub const SUBHEADING_STYLE: TextStyle = TextStyle {
    bold: true,
    color: Some("0000FF"),
    size_pt: Some(12),
    space_after_pt: Some(6),
    font: None,
};

pub const PARAGRAPH_STYLE: TextStyle = TextStyle {
    bold: false,
    color: None,
    size_pt: None,
    space_after_pt: Some(6),
    font: None,
};

pub const CODE_STYLE: TextStyle = TextStyle {
    bold: false,
    color: None,
    size_pt: Some(10),
    space_after_pt: Some(6),
    font: Some("Courier New"),
};

/// A span of text with uniform emphasis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    pub text: String,
    pub bold: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// A grid table whose rows all have exactly `header.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn columns(&self) -> usize {
        self.header.len()
    }
}

/// One rendered element, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Element {
    /// The fixed document title.
    Title(String),
    /// Section heading, already upper-cased.
    Heading(String),
    /// Short bold label inside a section.
    Subheading(String),
    /// Body text with inline emphasis runs.
    Paragraph(Vec<Run>),
    /// Monospace block; lines joined with `\n`.
    CodeBlock(String),
    Table(Table),
    PageBreak,
}

/// An append-only sequence of rendered elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    elements: Vec<Element>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document that already contains the fixed title element.
    pub fn new() -> Self {
        Self {
            elements: vec![Element::Title(DOCUMENT_TITLE.to_string())],
        }
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Elements after the fixed title.
    pub fn body(&self) -> &[Element] {
        &self.elements[1..]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// `true` when only the title element is present.
    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    /// Count of elements per kind, used for conversion stats.
    pub fn summary(&self) -> DocumentSummary {
        let mut s = DocumentSummary::default();
        for el in self.body() {
            match el {
                Element::Title(_) => {}
                Element::Heading(_) => s.headings += 1,
                Element::Subheading(_) => s.subheadings += 1,
                Element::Paragraph(_) => s.paragraphs += 1,
                Element::CodeBlock(_) => s.code_blocks += 1,
                Element::Table(_) => s.tables += 1,
                Element::PageBreak => s.page_breaks += 1,
            }
        }
        s
    }
}

/// Per-kind element counts of a rendered [`Document`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct DocumentSummary {
    pub headings: usize,
    pub subheadings: usize,
    pub paragraphs: usize,
    pub code_blocks: usize,
    pub tables: usize,
    pub page_breaks: usize,
}
