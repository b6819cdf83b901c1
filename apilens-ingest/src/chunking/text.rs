//! Text and Markdown chunking.

use apilens_core::{
    DocumentChunk, DocumentChunker, DocumentType, ParsedGenericDocument,
    config::TextChunkConfig,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{TextSpan, file_stem, pack_paragraphs, split_paragraphs, split_windows, truncate_chars};
use crate::detector;

static SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{2,6} +(.*?)\s*$").expect("section header regex"));

static TITLE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^# +(.*?)\s*$").expect("title header regex"));

const MAX_TITLE_CHARS: usize = 100;

/// How the chunker decides between Markdown sections and plain paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// Use the Markdown density heuristic.
    #[default]
    Auto,
    /// Always split on section headers.
    Markdown,
    /// Always pack paragraphs.
    Plain,
}

/// Chunks plain text and Markdown.
///
/// Markdown is split into sections at `##`..`######` header lines (headers
/// inside fenced code blocks are ignored); a section longer than
/// `section_max_chars` is cut into overlapping windows. Plain text is split
/// into blank-line paragraphs packed up to `chunk_size`, or into overlapping
/// windows when it has no paragraph structure.
///
/// # Examples
///
/// ```rust
/// use apilens_ingest::chunking::TextChunker;
///
/// let chunker = TextChunker::new();
/// let doc = chunker.chunk("# Guide\n\nIntro.\n\n## Install\n\n- run it\n", Some("guide.md"));
///
/// assert_eq!(doc.title, "Guide");
/// assert_eq!(doc.chunks.len(), 2);
/// assert_eq!(doc.chunks[1].section_title.as_deref(), Some("Install"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TextChunker {
    config: TextChunkConfig,
    mode: TextMode,
}

impl TextChunker {
    /// Create a chunker with default limits and automatic mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chunker with custom limits.
    pub fn with_config(config: TextChunkConfig) -> Self {
        Self {
            config,
            mode: TextMode::Auto,
        }
    }

    /// Set the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: TextMode) -> Self {
        self.mode = mode;
        self
    }

    /// Get the chunking limits.
    pub fn config(&self) -> &TextChunkConfig {
        &self.config
    }

    fn is_markdown(&self, content: &str) -> bool {
        match self.mode {
            TextMode::Auto => detector::is_markdown(content),
            TextMode::Markdown => true,
            TextMode::Plain => false,
        }
    }

    /// Chunk text, typing the result as Markdown or text.
    pub fn chunk(&self, content: &str, source_file: Option<&str>) -> ParsedGenericDocument {
        let markdown = self.is_markdown(content);
        let document_type = if markdown {
            DocumentType::Markdown
        } else {
            DocumentType::Text
        };

        let mut doc = ParsedGenericDocument::new(
            extract_title(content, source_file),
            content,
            document_type,
        )
        .with_source_file(source_file);
        self.fill_chunks(&mut doc, markdown);
        doc
    }

    /// Chunk `doc.content` into `doc`, keeping its title and type.
    pub(crate) fn fill_chunks(&self, doc: &mut ParsedGenericDocument, markdown: bool) {
        let chunks = if markdown {
            self.markdown_chunks(&doc.content)
        } else {
            self.plain_chunks(&doc.content)
        };
        doc.extend_chunks(chunks);
        doc.ensure_chunk();
        doc.metadata.insert("markdown".to_string(), markdown.into());

        debug!(
            "Chunked {} characters into {} chunks (markdown: {})",
            doc.character_count,
            doc.chunk_count(),
            markdown
        );
    }

    fn markdown_chunks(&self, content: &str) -> Vec<DocumentChunk> {
        let sections = split_sections(content);
        debug!("Split markdown into {} sections", sections.len());

        let mut chunks = Vec::new();
        for section in sections {
            let len = section.raw.chars().count();
            if len <= self.config.section_max_chars {
                chunks.push(
                    DocumentChunk::new(section.raw.trim())
                        .with_section(section.title.clone())
                        .with_span(section.start, section.start + len)
                        .with_metadata("chunk_type", "section"),
                );
                continue;
            }

            for window in split_windows(
                &section.raw,
                self.config.chunk_size,
                self.config.chunk_overlap,
            ) {
                chunks.push(
                    DocumentChunk::new(window.text)
                        .with_section(section.title.clone())
                        .with_span(section.start + window.start, section.start + window.end)
                        .with_metadata("chunk_type", "section_window"),
                );
            }
        }
        chunks
    }

    fn plain_chunks(&self, content: &str) -> Vec<DocumentChunk> {
        let paragraphs = split_paragraphs(content);
        let (spans, chunk_type) = if paragraphs.len() <= 1 {
            (
                split_windows(content, self.config.chunk_size, self.config.chunk_overlap),
                "window",
            )
        } else {
            (
                pack_paragraphs(
                    &paragraphs,
                    self.config.chunk_size,
                    self.config.chunk_overlap,
                ),
                "paragraphs",
            )
        };

        spans
            .into_iter()
            .map(|TextSpan { start, end, text }| {
                DocumentChunk::new(text)
                    .with_span(start, end)
                    .with_metadata("chunk_type", chunk_type)
            })
            .collect()
    }
}

impl DocumentChunker for TextChunker {
    fn document_type(&self) -> DocumentType {
        match self.mode {
            TextMode::Markdown => DocumentType::Markdown,
            TextMode::Auto | TextMode::Plain => DocumentType::Text,
        }
    }

    fn chunk_bytes(
        &self,
        bytes: &[u8],
        source_file: Option<&str>,
    ) -> apilens_core::Result<ParsedGenericDocument> {
        Ok(self.chunk(&String::from_utf8_lossy(bytes), source_file))
    }

    fn name(&self) -> &'static str {
        "TextChunker"
    }
}

/// A Markdown section: the header line with everything up to the next one.
#[derive(Debug)]
struct Section {
    title: Option<String>,
    start: usize,
    raw: String,
}

fn split_sections(content: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        title: None,
        start: 0,
        raw: String::new(),
    };
    let mut offset = 0;
    let mut in_fence = false;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        }

        let header = if in_fence {
            None
        } else {
            SECTION_HEADER
                .captures(line.trim_end_matches(['\n', '\r']))
                .map(|c| c[1].to_string())
        };

        if let Some(title) = header {
            let finished = std::mem::replace(
                &mut current,
                Section {
                    title: Some(title),
                    start: offset,
                    raw: String::new(),
                },
            );
            if !finished.raw.trim().is_empty() {
                sections.push(finished);
            }
        }

        current.raw.push_str(line);
        offset += line.chars().count();
    }

    if !current.raw.trim().is_empty() {
        sections.push(current);
    }
    sections
}

/// Title: the first `# ` header, else the first non-empty line, else the file
/// stem.
pub(crate) fn extract_title(content: &str, source_file: Option<&str>) -> String {
    if let Some(caps) = TITLE_HEADER.captures(content) {
        let title = caps[1].trim();
        if !title.is_empty() {
            return truncate_chars(title, MAX_TITLE_CHARS);
        }
    }

    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| truncate_chars(line, MAX_TITLE_CHARS))
        .or_else(|| file_stem(source_file))
        .unwrap_or_else(|| "Untitled Document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> TextChunker {
        TextChunker::with_config(
            TextChunkConfig::default()
                .with_chunk_size(100)
                .with_chunk_overlap(10)
                .with_section_max_chars(150),
        )
    }

    #[test]
    fn test_markdown_sections_keep_headers() {
        let md = "# Title\n\nIntro text.\n\n- point\n\n## First\n\nAlpha.\n\n### Nested\n\nBeta.\n";
        let doc = TextChunker::new().chunk(md, None);

        assert_eq!(doc.document_type, DocumentType::Markdown);
        assert_eq!(doc.title, "Title");
        assert_eq!(doc.chunks.len(), 3);
        assert_eq!(doc.chunks[0].section_title, None);
        assert!(doc.chunks[1].content.starts_with("## First"));
        assert_eq!(doc.chunks[2].section_title.as_deref(), Some("Nested"));
    }

    #[test]
    fn test_headers_in_code_fences_are_ignored() {
        let md = "## Shell\n\n```sh\n## not a header\necho hi\n```\n\n- done\n";
        let doc = TextChunker::new().with_mode(TextMode::Markdown).chunk(md, None);
        assert_eq!(doc.chunks.len(), 1);
    }

    #[test]
    fn test_oversized_section_is_windowed() {
        let body = "Sentence number one is here. ".repeat(20);
        let md = format!("## Big\n\n{body}\n\n## Small\n\nok\n");
        let doc = small().with_mode(TextMode::Markdown).chunk(&md, None);

        let big: Vec<_> = doc
            .chunks
            .iter()
            .filter(|c| c.section_title.as_deref() == Some("Big"))
            .collect();
        assert!(big.len() > 1);
        assert!(big.iter().all(|c| c.char_len() <= 100));
        assert_eq!(doc.chunks.last().unwrap().section_title.as_deref(), Some("Small"));
    }

    #[test]
    fn test_plain_paragraphs_are_packed() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let doc = TextChunker::new().chunk(text, Some("notes.txt"));

        assert_eq!(doc.document_type, DocumentType::Text);
        assert_eq!(doc.chunks.len(), 1);
        assert_eq!(doc.chunks[0].content, text);
        assert_eq!(doc.title, "First paragraph.");
    }

    #[test]
    fn test_unstructured_text_uses_windows() {
        let text = "lorem ipsum ".repeat(50);
        let doc = small().with_mode(TextMode::Plain).chunk(&text, None);

        assert!(doc.chunks.len() > 1);
        for (i, chunk) in doc.chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.metadata["chunk_type"], "window");
        }
    }

    #[test]
    fn test_whitespace_only_text_keeps_one_chunk() {
        let doc = TextChunker::new().chunk("   \n", None);

        assert_eq!(doc.chunk_count(), 1);
        assert_eq!(doc.chunks[0].chunk_index, 0);
        assert_eq!(doc.chunks[0].content, "   \n");
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert_eq!(TextChunker::new().chunk("", None).chunk_count(), 0);
    }

    #[test]
    fn test_title_fallbacks() {
        assert_eq!(extract_title("   \n", Some("dir/readme.txt")), "readme");
        assert_eq!(extract_title("", None), "Untitled Document");
    }

    #[test]
    fn test_chunk_bytes_decodes_lossily() {
        let doc = TextChunker::new()
            .chunk_bytes(b"caf\xc3\xa9 and \xff bytes", None)
            .unwrap();
        assert_eq!(doc.chunks.len(), 1);
        assert!(doc.content.starts_with("café"));
    }
}
