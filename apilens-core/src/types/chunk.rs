//! Chunked general documents (text, Markdown, JSON, PDF, ...).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{DocumentType, VectorDocument, document::DOCUMENT_TYPE_KEY};

/// A bounded-size text segment with provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    /// Chunk text.
    pub content: String,

    /// 0-based position within the parent document.
    pub chunk_index: usize,

    /// Chunker-specific metadata (JSON key path, array range, ...).
    pub metadata: Map<String, Value>,

    /// Originating page for paged formats.
    pub page_number: Option<u32>,

    /// Heading of the section the chunk belongs to.
    pub section_title: Option<String>,

    /// Character offset of the chunk start in the parent content.
    pub start_char: Option<usize>,

    /// Character offset one past the chunk end in the parent content.
    pub end_char: Option<usize>,
}

impl DocumentChunk {
    /// Create a chunk. The index is assigned when the chunk is pushed into a
    /// [`ParsedGenericDocument`].
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            chunk_index: 0,
            metadata: Map::new(),
            page_number: None,
            section_title: None,
            start_char: None,
            end_char: None,
        }
    }

    /// Set the originating page.
    #[must_use]
    pub fn with_page(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    /// Set the section heading.
    #[must_use]
    pub fn with_section<S: Into<String>>(mut self, title: Option<S>) -> Self {
        self.section_title = title.map(Into::into);
        self
    }

    /// Set the character span.
    #[must_use]
    pub fn with_span(mut self, start_char: usize, end_char: usize) -> Self {
        self.start_char = Some(start_char);
        self.end_char = Some(end_char);
        self
    }

    /// Add chunk metadata.
    #[must_use]
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Character length of the chunk text.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// A general document split into ordered chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedGenericDocument {
    /// Document title.
    pub title: String,

    /// Full extracted text.
    pub content: String,

    /// Ordered chunks; `chunks[i].chunk_index == i`.
    pub chunks: Vec<DocumentChunk>,

    /// Detected or hinted type.
    pub document_type: DocumentType,

    /// File the document came from.
    pub source_file: Option<String>,

    /// Document-level metadata.
    pub metadata: Map<String, Value>,

    /// Number of pages for paged formats.
    pub page_count: Option<u32>,

    /// Whitespace-separated word count of `content`.
    pub word_count: usize,

    /// Character count of `content`.
    pub character_count: usize,

    /// Author from document properties.
    pub author: Option<String>,

    /// Creation date from document properties (RFC 3339 when parseable).
    pub created_date: Option<String>,

    /// Modification date from document properties (RFC 3339 when parseable).
    pub modified_date: Option<String>,
}

impl ParsedGenericDocument {
    /// Create an empty document; counts are derived from `content`.
    pub fn new<T, C>(title: T, content: C, document_type: DocumentType) -> Self
    where
        T: Into<String>,
        C: Into<String>,
    {
        let content = content.into();
        Self {
            title: title.into(),
            word_count: content.split_whitespace().count(),
            character_count: content.chars().count(),
            content,
            chunks: Vec::new(),
            document_type,
            source_file: None,
            metadata: Map::new(),
            page_count: None,
            author: None,
            created_date: None,
            modified_date: None,
        }
    }

    /// Set the source file.
    #[must_use]
    pub fn with_source_file(mut self, source_file: Option<&str>) -> Self {
        self.source_file = source_file.map(str::to_string);
        self
    }

    /// Append a chunk, assigning the next sequential index.
    ///
    /// Chunks whose text is blank are dropped so every projected record keeps
    /// non-empty content.
    pub fn push_chunk(&mut self, mut chunk: DocumentChunk) {
        if chunk.content.trim().is_empty() {
            return;
        }
        chunk.chunk_index = self.chunks.len();
        self.chunks.push(chunk);
    }

    /// Append several chunks in order.
    pub fn extend_chunks<I: IntoIterator<Item = DocumentChunk>>(&mut self, chunks: I) {
        for chunk in chunks {
            self.push_chunk(chunk);
        }
    }

    /// Guarantee at least one chunk for non-empty content.
    ///
    /// When every candidate chunk was blank, the raw content becomes a single
    /// `whole` chunk spanning the full text.
    pub fn ensure_chunk(&mut self) {
        if !self.chunks.is_empty() || self.content.is_empty() {
            return;
        }
        self.chunks.push(
            DocumentChunk::new(self.content.clone())
                .with_span(0, self.character_count)
                .with_metadata("chunk_type", "whole"),
        );
    }

    /// Number of chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Project the chunks into vector-store records.
    pub fn to_vector_documents(&self) -> Vec<VectorDocument> {
        let total = self.chunks.len();
        self.chunks
            .iter()
            .map(|chunk| {
                let mut doc = VectorDocument::builder()
                    .content(chunk.content.clone())
                    .metadata(DOCUMENT_TYPE_KEY, self.document_type.as_str())
                    .metadata("title", self.title.clone())
                    .metadata_opt("source_file", self.source_file.clone())
                    .metadata("chunk_index", chunk.chunk_index)
                    .metadata("total_chunks", total)
                    .metadata_opt("page_number", chunk.page_number)
                    .metadata_opt("section_title", chunk.section_title.clone())
                    .metadata_opt("start_char", chunk.start_char)
                    .metadata_opt("end_char", chunk.end_char)
                    .build();
                for (key, value) in &chunk.metadata {
                    doc.metadata
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
                doc
            })
            .collect()
    }
}
