//! PDF chunking.

use apilens_core::{
    DocumentChunk, DocumentChunker, DocumentType, ParsedGenericDocument,
    config::PdfChunkConfig,
};
use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, info, warn};

use super::{file_stem, pack_paragraphs, split_paragraphs, truncate_chars};
use crate::error::{IngestError, Result};

const PAGE_SEPARATOR: &str = "\n\n";

/// Chunks PDF files page by page.
///
/// A page of at most `max_page_chars` characters is one chunk; a longer page
/// is split at blank lines and packed into chunks of at most
/// `max_chunk_chars`. Every chunk keeps its 1-based page number. A page whose
/// text cannot be extracted is replaced by a placeholder line instead of
/// failing the document.
#[derive(Debug, Clone, Default)]
pub struct PdfChunker {
    config: PdfChunkConfig,
}

impl PdfChunker {
    /// Create a chunker with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chunker with custom limits.
    pub fn with_config(config: PdfChunkConfig) -> Self {
        Self { config }
    }

    /// Extract and chunk a PDF.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::TextExtraction`] when the bytes are not a
    /// loadable PDF and [`IngestError::DocumentParsing`] when it has no pages.
    pub fn chunk(&self, bytes: &[u8], source_file: Option<&str>) -> Result<ParsedGenericDocument> {
        let pdf = Document::load_mem(bytes)
            .map_err(|e| IngestError::text_extraction(format!("PDF parsing failed: {e}")))?;
        if pdf.get_pages().is_empty() {
            return Err(IngestError::document_parsing("PDF contains no pages"));
        }

        let pages: Vec<String> = pdf
            .get_pages()
            .into_keys()
            .map(|page_number| {
                pdf.extract_text(&[page_number]).unwrap_or_else(|e| {
                    warn!("Failed to extract text from page {}: {}", page_number, e);
                    format!("[Error extracting text from page {page_number}: {e}]")
                })
            })
            .collect();

        let info = info_dictionary(&pdf);
        let mut doc = self.chunk_pages(&pages, source_file);

        if let Some(title) = info.as_ref().and_then(|d| info_string(d, b"Title")) {
            doc.title = title;
        }
        doc.author = info.as_ref().and_then(|d| info_string(d, b"Author"));
        doc.created_date = info
            .as_ref()
            .and_then(|d| info_string(d, b"CreationDate"))
            .map(|raw| parse_pdf_date(&raw).unwrap_or(raw));
        doc.modified_date = info
            .as_ref()
            .and_then(|d| info_string(d, b"ModDate"))
            .map(|raw| parse_pdf_date(&raw).unwrap_or(raw));

        info!(
            "Extracted {} pages into {} chunks from {}",
            pages.len(),
            doc.chunk_count(),
            source_file.unwrap_or("<memory>")
        );
        Ok(doc)
    }

    /// Chunk already extracted page texts, numbered from 1.
    pub fn chunk_pages(&self, pages: &[String], source_file: Option<&str>) -> ParsedGenericDocument {
        let content = pages.join(PAGE_SEPARATOR);
        let title = file_stem(source_file)
            .or_else(|| {
                content
                    .lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(|line| truncate_chars(line, 100))
            })
            .unwrap_or_else(|| "Untitled Document".to_string());

        let mut doc = ParsedGenericDocument::new(title, content, DocumentType::Pdf)
            .with_source_file(source_file);
        doc.page_count = u32::try_from(pages.len()).ok();

        let mut offset = 0;
        for (page_number, page) in (1u32..).zip(pages) {
            let page_chars = page.chars().count();

            if page_chars <= self.config.max_page_chars {
                doc.push_chunk(
                    DocumentChunk::new(page.trim())
                        .with_page(page_number)
                        .with_span(offset, offset + page_chars)
                        .with_metadata("chunk_type", "page"),
                );
            } else {
                let parts = pack_paragraphs(
                    &split_paragraphs(page),
                    self.config.max_chunk_chars,
                    0,
                );
                debug!("Page {} split into {} chunks", page_number, parts.len());
                for part in parts {
                    doc.push_chunk(
                        DocumentChunk::new(part.text)
                            .with_page(page_number)
                            .with_span(offset + part.start, offset + part.end)
                            .with_metadata("chunk_type", "page_part"),
                    );
                }
            }

            offset += page_chars + PAGE_SEPARATOR.len();
        }

        if doc.chunks.is_empty() {
            warn!("No extractable text in {} pages", pages.len());
            for page_number in (1u32..).take(pages.len()) {
                doc.push_chunk(
                    DocumentChunk::new(format!("[Page {page_number}: no extractable text]"))
                        .with_page(page_number)
                        .with_metadata("chunk_type", "page_marker"),
                );
            }
        }

        doc
    }
}

impl DocumentChunker for PdfChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::Pdf
    }

    fn chunk_bytes(
        &self,
        bytes: &[u8],
        source_file: Option<&str>,
    ) -> apilens_core::Result<ParsedGenericDocument> {
        Ok(self.chunk(bytes, source_file)?)
    }

    fn name(&self) -> &'static str {
        "PdfChunker"
    }
}

fn info_dictionary(pdf: &Document) -> Option<Dictionary> {
    match pdf.trailer.get(b"Info").ok()? {
        Object::Reference(id) => pdf.get_dictionary(*id).ok().cloned(),
        Object::Dictionary(dict) => Some(dict.clone()),
        _ => None,
    }
}

fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    let Object::String(bytes, _) = dict.get(key).ok()? else {
        return None;
    };
    let text = decode_pdf_string(bytes);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Decode a PDF text string: UTF-16BE with a byte order mark, else one byte
/// per character.
fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Parse `D:YYYYMMDDHHmmSSOHH'mm'` into RFC 3339. Missing trailing fields
/// take their lowest value; a missing offset means UTC.
fn parse_pdf_date(raw: &str) -> Option<String> {
    const DEFAULTS: &str = "00000101000000";

    let body = raw.trim().strip_prefix("D:").unwrap_or(raw.trim());
    let digits: String = body.chars().take_while(char::is_ascii_digit).take(14).collect();
    if digits.len() < 4 {
        return None;
    }

    let padded = format!("{digits}{}", &DEFAULTS[digits.len()..]);
    let naive = NaiveDateTime::parse_from_str(&padded, "%Y%m%d%H%M%S").ok()?;

    let rest = &body[digits.len()..];
    let offset_seconds = match rest.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let parts: Vec<i32> = rest[1..]
                .split('\'')
                .filter(|p| !p.is_empty())
                .take(2)
                .map(str::parse::<i32>)
                .collect::<std::result::Result<_, _>>()
                .ok()?;
            let hours = parts.first().copied().unwrap_or(0);
            let minutes = parts.get(1).copied().unwrap_or(0);
            let seconds = hours * 3600 + minutes * 60;
            if sign == '-' { -seconds } else { seconds }
        }
        _ => 0,
    };

    let offset = FixedOffset::east_opt(offset_seconds)?;
    let date = offset.from_local_datetime(&naive).single()?;
    Some(date.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Stream, dictionary};

    fn build_pdf(text: &str) -> Vec<u8> {
        build_pdf_with(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ])
    }

    fn build_pdf_with(operations: Vec<Operation>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Release Notes"),
            "Author" => Object::string_literal("Docs Team"),
            "CreationDate" => Object::string_literal("D:20240115103000Z"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_extracts_pages_and_info() {
        let bytes = build_pdf("Hello World");
        let doc = PdfChunker::new().chunk(&bytes, Some("notes.pdf")).unwrap();

        assert_eq!(doc.document_type, DocumentType::Pdf);
        assert_eq!(doc.page_count, Some(1));
        assert_eq!(doc.title, "Release Notes");
        assert_eq!(doc.author.as_deref(), Some("Docs Team"));
        assert_eq!(doc.created_date.as_deref(), Some("2024-01-15T10:30:00+00:00"));
        assert_eq!(doc.chunks.len(), 1);
        assert_eq!(doc.chunks[0].page_number, Some(1));
        assert!(doc.chunks[0].content.contains("Hello World"));
    }

    #[test]
    fn test_textless_pdf_keeps_a_page_chunk() {
        let bytes = build_pdf_with(Vec::new());
        let doc = PdfChunker::new().chunk(&bytes, Some("scan.pdf")).unwrap();

        assert_eq!(doc.page_count, Some(1));
        assert_eq!(doc.chunk_count(), 1);
        assert_eq!(doc.chunks[0].chunk_index, 0);
        assert_eq!(doc.chunks[0].page_number, Some(1));
        assert!(!doc.chunks[0].content.trim().is_empty());
    }

    #[test]
    fn test_blank_pages_become_markers() {
        let pages = vec![String::new(), "  \n".to_string()];
        let doc = PdfChunker::new().chunk_pages(&pages, None);

        let contents: Vec<_> = doc.chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["[Page 1: no extractable text]", "[Page 2: no extractable text]"]
        );
        assert_eq!(doc.chunks[1].page_number, Some(2));
        assert_eq!(doc.chunks[1].chunk_index, 1);
        assert_eq!(doc.chunks[1].metadata["chunk_type"], "page_marker");
    }

    #[test]
    fn test_malformed_bytes_are_an_error() {
        let err = PdfChunker::new()
            .chunk(b"%PDF-1.4 truncated", None)
            .unwrap_err();
        assert!(matches!(err, IngestError::TextExtraction { .. }));
    }

    #[test]
    fn test_small_pages_become_single_chunks() {
        let pages = vec!["Page one text.".to_string(), "Page two text.".to_string()];
        let doc = PdfChunker::new().chunk_pages(&pages, None);

        assert_eq!(doc.chunks.len(), 2);
        assert_eq!(doc.chunks[1].page_number, Some(2));
        assert_eq!(doc.chunks[1].start_char, Some(16));
        assert_eq!(doc.title, "Page one text.");
    }

    #[test]
    fn test_oversized_page_is_packed_by_paragraph() {
        let paragraph = "Paragraph sentence text. ".repeat(20);
        let page = vec![paragraph.trim().to_string(); 5].join("\n\n");
        let doc = PdfChunker::new().chunk_pages(&[page], None);

        assert!(doc.chunks.len() > 1);
        for chunk in &doc.chunks {
            assert_eq!(chunk.page_number, Some(1));
            assert!(chunk.char_len() <= 1500);
            assert_eq!(chunk.metadata["chunk_type"], "page_part");
        }
    }

    #[test]
    fn test_pdf_dates() {
        assert_eq!(
            parse_pdf_date("D:20230301120000+02'00'").as_deref(),
            Some("2023-03-01T12:00:00+02:00")
        );
        assert_eq!(
            parse_pdf_date("D:2021").as_deref(),
            Some("2021-01-01T00:00:00+00:00")
        );
        assert_eq!(parse_pdf_date("yesterday"), None);
    }

    #[test]
    fn test_utf16_strings_decode() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
    }
}
