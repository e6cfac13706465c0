//! Document packaging: [`Document`] → Office Open XML (`.docx`) bytes.
//!
//! A `.docx` file is a zip archive of XML parts. We emit the smallest set
//! Word, LibreOffice and Pages all accept:
//!
//! ```text
//! [Content_Types].xml
//! _rels/.rels
//! docProps/core.xml
//! word/document.xml
//! word/styles.xml
//! word/_rels/document.xml.rels
//! ```
//!
//! The archive is assembled in memory and handed back as one buffer; the
//! caller decides where the bytes go.

use crate::document::{
    Document, Element, Run, Table, TextStyle, CODE_STYLE, HEADING_STYLE, PARAGRAPH_STYLE,
    SUBHEADING_STYLE,
};
use crate::error::TechSpecError;
use std::borrow::Cow;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// MIME type of the produced file, for HTTP responses and the like.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const CORE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Technical Specification</dc:title><dc:creator>abap-techspec</dc:creator></cp:coreProperties>"#;

/// `Heading1` for the title and `TableGrid` for tables; everything else is
/// styled with direct run/paragraph properties.
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="0"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="480" w:after="240"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="2F5496"/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/><w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:left w:w="108" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style><w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:basedOn w:val="TableNormal"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders></w:tblPr></w:style></w:styles>"#;

/// Serialise a document into `.docx` bytes.
pub fn package_docx(document: &Document) -> Result<Vec<u8>, TechSpecError> {
    let body = document_xml(document);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, &str); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", ROOT_RELS_XML),
        ("docProps/core.xml", CORE_XML),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML),
        ("word/styles.xml", STYLES_XML),
        ("word/document.xml", &body),
    ];

    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())
            .map_err(|e| TechSpecError::Packaging(format!("{name}: {e}")))?;
    }

    let bytes = zip.finish()?.into_inner();
    debug!(
        "Packaged {} elements into {} bytes of docx",
        document.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Build `word/document.xml` for the given document.
pub fn document_xml(document: &Document) -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<w:document xmlns:w="{W_NS}"><w:body>"#));

    for element in document.elements() {
        write_element(&mut xml, element);
    }

    // US Letter, 1" margins.
    xml.push_str(
        r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#,
    );
    xml.push_str("</w:body></w:document>");
    xml
}

fn write_element(xml: &mut String, element: &Element) {
    match element {
        Element::Title(text) => {
            xml.push_str(r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr>"#);
            write_run(xml, text, None, false);
            xml.push_str("</w:p>");
        }
        Element::Heading(text) => styled_paragraph(xml, &HEADING_STYLE, &[Run::plain(text.as_str())]),
        Element::Subheading(text) => {
            styled_paragraph(xml, &SUBHEADING_STYLE, &[Run::plain(text.as_str())])
        }
        Element::Paragraph(runs) => styled_paragraph(xml, &PARAGRAPH_STYLE, runs),
        Element::CodeBlock(code) => styled_paragraph(xml, &CODE_STYLE, &[Run::plain(code.as_str())]),
        Element::Table(table) => write_table(xml, table),
        Element::PageBreak => xml.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#),
    }
}

fn styled_paragraph(xml: &mut String, style: &TextStyle, runs: &[Run]) {
    xml.push_str("<w:p>");
    if let Some(after) = style.space_after_pt {
        // Spacing is in twentieths of a point.
        xml.push_str(&format!(r#"<w:pPr><w:spacing w:after="{}"/></w:pPr>"#, after * 20));
    }
    for run in runs {
        write_run(xml, &run.text, Some(style), style.bold || run.bold);
    }
    xml.push_str("</w:p>");
}

fn write_run(xml: &mut String, text: &str, style: Option<&TextStyle>, bold: bool) {
    xml.push_str("<w:r>");

    let mut props = String::new();
    if let Some(font) = style.and_then(|s| s.font) {
        props.push_str(&format!(
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
        ));
    }
    if bold {
        props.push_str("<w:b/>");
    }
    if let Some(color) = style.and_then(|s| s.color) {
        props.push_str(&format!(r#"<w:color w:val="{color}"/>"#));
    }
    if let Some(size) = style.and_then(|s| s.size_pt) {
        // Sizes are in half-points.
        props.push_str(&format!(r#"<w:sz w:val="{}"/>"#, size * 2));
    }
    if !props.is_empty() {
        xml.push_str("<w:rPr>");
        xml.push_str(&props);
        xml.push_str("</w:rPr>");
    }

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<w:br/>");
        }
        write_text(xml, line);
    }
    xml.push_str("</w:r>");
}

fn write_text(xml: &mut String, text: &str) {
    let clean = strip_invalid_xml_chars(text);
    xml.push_str(r#"<w:t xml:space="preserve">"#);
    xml.push_str(&html_escape::encode_text(&clean));
    xml.push_str("</w:t>");
}

fn write_table(xml: &mut String, table: &Table) {
    xml.push_str(
        r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="0" w:type="auto"/><w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="1" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/></w:tblPr>"#,
    );
    xml.push_str("<w:tblGrid>");
    for _ in 0..table.columns() {
        xml.push_str("<w:gridCol/>");
    }
    xml.push_str("</w:tblGrid>");

    write_table_row(xml, &table.header);
    for row in &table.rows {
        write_table_row(xml, row);
    }
    xml.push_str("</w:tbl>");
}

fn write_table_row(xml: &mut String, cells: &[String]) {
    xml.push_str("<w:tr>");
    for cell in cells {
        // Every cell needs at least one paragraph, even when empty.
        xml.push_str(r#"<w:tc><w:tcPr><w:tcW w:w="0" w:type="auto"/></w:tcPr><w:p>"#);
        if !cell.is_empty() {
            write_run(xml, cell, None, false);
        }
        xml.push_str("</w:p></w:tc>");
    }
    xml.push_str("</w:tr>");
}

/// Drop characters XML 1.0 forbids (most C0 controls, lone surrogates are
/// impossible in `str`, plus U+FFFE/U+FFFF).
fn strip_invalid_xml_chars(text: &str) -> Cow<'_, str> {
    let valid = |c: char| {
        matches!(c, '\t' | '\n' | '\r')
            || ('\u{20}'..='\u{D7FF}').contains(&c)
            || ('\u{E000}'..='\u{FFFD}').contains(&c)
            || c >= '\u{10000}'
    };
    if text.chars().all(valid) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| valid(c)).collect())
    }
}
