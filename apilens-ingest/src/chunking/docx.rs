//! Word document chunking.

use std::io::{Cursor, Read};

use apilens_core::{DocumentChunker, DocumentType, ParsedGenericDocument};
use chrono::DateTime;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::{TextChunker, file_stem, truncate_chars};
use crate::error::{IngestError, Result};

const CORE_PROPS_PATH: &str = "docProps/core.xml";

static CORE_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(dc:creator|dcterms:created|dcterms:modified)(?:\s[^>]*)?>([^<]*)</")
        .expect("core property regex")
});

/// Extracts paragraph text from `.docx` files and chunks it as plain text.
///
/// Author and dates come from the package core properties.
#[derive(Debug, Clone, Default)]
pub struct DocxChunker {
    text: TextChunker,
}

impl DocxChunker {
    /// Create a chunker with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a configured text chunker for the extracted paragraphs.
    pub fn with_text_chunker(text: TextChunker) -> Self {
        Self { text }
    }

    /// Extract and chunk a Word document.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::TextExtraction`] when the bytes are not a
    /// readable `.docx` archive.
    pub fn chunk(&self, bytes: &[u8], source_file: Option<&str>) -> Result<ParsedGenericDocument> {
        let content = extract_text(bytes)?;
        debug!("Extracted {} characters from DOCX", content.len());

        let title = file_stem(source_file)
            .or_else(|| {
                content
                    .lines()
                    .find(|line| !line.trim().is_empty())
                    .map(|line| truncate_chars(line.trim(), 100))
            })
            .unwrap_or_else(|| "Untitled Document".to_string());

        let mut doc = ParsedGenericDocument::new(title, content, DocumentType::Docx)
            .with_source_file(source_file);

        if let Some(xml) = read_core_xml(bytes) {
            let props = CoreProperties::parse(&xml);
            doc.author = props.creator;
            doc.created_date = props.created;
            doc.modified_date = props.modified;
        }

        self.text.fill_chunks(&mut doc, false);
        Ok(doc)
    }
}

/// `dc:creator`, `dcterms:created` and `dcterms:modified` from `core.xml`.
#[derive(Debug, Default, PartialEq)]
struct CoreProperties {
    creator: Option<String>,
    created: Option<String>,
    modified: Option<String>,
}

impl CoreProperties {
    fn parse(xml: &str) -> Self {
        let mut props = Self::default();
        for caps in CORE_PROPERTY.captures_iter(xml) {
            let value = unescape_xml(caps[2].trim());
            if value.is_empty() {
                continue;
            }
            match &caps[1] {
                "dc:creator" => props.creator = Some(value),
                "dcterms:created" => props.created = Some(normalize_date(value)),
                _ => props.modified = Some(normalize_date(value)),
            }
        }
        props
    }
}

fn read_core_xml(bytes: &[u8]) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).ok()?;
    let mut file = archive.by_name(CORE_PROPS_PATH).ok()?;
    let mut xml = String::new();
    if let Err(e) = file.read_to_string(&mut xml) {
        warn!("Failed to read {}: {}", CORE_PROPS_PATH, e);
        return None;
    }
    Some(xml)
}

/// W3CDTF timestamps are RFC 3339; anything else is kept verbatim.
fn normalize_date(raw: String) -> String {
    DateTime::parse_from_rfc3339(&raw).map_or(raw, |date| date.to_rfc3339())
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Paragraph texts joined by blank lines.
fn extract_text(bytes: &[u8]) -> Result<String> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| IngestError::text_extraction(format!("DOCX parsing failed: {e}")))?;

    let mut paragraphs = Vec::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(para) = child {
            let mut text = String::new();
            for run in para.children {
                if let ParagraphChild::Run(run) = run {
                    for child in run.children {
                        if let RunChild::Text(text_elem) = child {
                            text.push_str(&text_elem.text);
                        }
                    }
                }
            }
            if !text.trim().is_empty() {
                paragraphs.push(text);
            }
        }
    }

    Ok(paragraphs.join("\n\n"))
}

impl DocumentChunker for DocxChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::Docx
    }

    fn chunk_bytes(
        &self,
        bytes: &[u8],
        source_file: Option<&str>,
    ) -> apilens_core::Result<ParsedGenericDocument> {
        Ok(self.chunk(bytes, source_file)?)
    }

    fn name(&self) -> &'static str {
        "DocxChunker"
    }
}
