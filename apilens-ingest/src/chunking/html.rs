//! HTML chunking.

use apilens_core::{DocumentChunker, DocumentType, ParsedGenericDocument};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{TextChunker, file_stem, truncate_chars};

const BLOCK_TAGS: [&str; 12] = [
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "pre", "blockquote", "td", "th",
];

static BLOCKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(&BLOCK_TAGS.join(", ")).expect("block selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("title selector"));
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("h1 selector"));
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("body selector"));

/// Extracts visible block text from HTML and chunks it as Markdown.
///
/// Headings are rendered as `#` headers so section splitting applies, list
/// items as `- ` bullets. Blocks nested inside another block are covered by
/// their outermost block.
#[derive(Debug, Clone, Default)]
pub struct HtmlChunker {
    text: TextChunker,
}

impl HtmlChunker {
    /// Create a chunker with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a configured text chunker for the extracted text.
    pub fn with_text_chunker(text: TextChunker) -> Self {
        Self { text }
    }

    /// Extract and chunk an HTML page.
    pub fn chunk(&self, content: &str, source_file: Option<&str>) -> ParsedGenericDocument {
        let html = Html::parse_document(content);

        let title = first_text(&html, &TITLE)
            .or_else(|| first_text(&html, &H1))
            .map(|t| truncate_chars(&t, 100))
            .or_else(|| file_stem(source_file))
            .unwrap_or_else(|| "Untitled Document".to_string());

        let text = extract_blocks(&html);
        let mut doc = ParsedGenericDocument::new(title, text, DocumentType::Html)
            .with_source_file(source_file);
        self.text.fill_chunks(&mut doc, true);
        doc
    }
}

impl DocumentChunker for HtmlChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::Html
    }

    fn chunk_bytes(
        &self,
        bytes: &[u8],
        source_file: Option<&str>,
    ) -> apilens_core::Result<ParsedGenericDocument> {
        Ok(self.chunk(&String::from_utf8_lossy(bytes), source_file))
    }

    fn name(&self) -> &'static str {
        "HtmlChunker"
    }
}

fn first_text(html: &Html, selector: &Selector) -> Option<String> {
    html.select(selector)
        .map(|element| normalize_whitespace(&element.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn extract_blocks(html: &Html) -> String {
    let mut blocks = Vec::new();

    for element in html.select(&BLOCKS) {
        let nested = element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| BLOCK_TAGS.contains(&ancestor.value().name()));
        if nested {
            continue;
        }

        let name = element.value().name();
        let raw: String = element.text().collect();
        let text = if name == "pre" {
            raw.trim_matches('\n').to_string()
        } else {
            normalize_whitespace(&raw)
        };
        if text.trim().is_empty() {
            continue;
        }

        let block = match name {
            "li" => format!("- {text}"),
            "pre" => format!("```\n{text}\n```"),
            "blockquote" => format!("> {text}"),
            heading if heading.len() == 2 && heading.starts_with('h') => {
                let level = heading[1..].parse::<usize>().unwrap_or(1);
                format!("{} {text}", "#".repeat(level))
            }
            _ => text,
        };
        blocks.push(block);
    }

    if blocks.is_empty() {
        debug!("No block elements found, falling back to body text");
        let fallback = html
            .select(&BODY)
            .next()
            .map(|body| normalize_whitespace(&body.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default();
        return fallback;
    }

    debug!("Extracted {} blocks from HTML", blocks.len());
    blocks.join("\n\n")
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
