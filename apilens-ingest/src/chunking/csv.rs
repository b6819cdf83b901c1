//! CSV chunking.

use apilens_core::{
    DocumentChunk, DocumentChunker, DocumentType, ParsedGenericDocument,
    config::CsvChunkConfig,
};
use serde_json::Value;
use tracing::debug;

use super::file_stem;
use crate::error::{IngestError, Result};

/// Renders CSV rows as `header: value` lines and packs them into chunks.
#[derive(Debug, Clone, Default)]
pub struct CsvChunker {
    config: CsvChunkConfig,
}

impl CsvChunker {
    /// Create a chunker with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chunker with custom limits.
    pub fn with_config(config: CsvChunkConfig) -> Self {
        Self { config }
    }

    /// Parse and chunk CSV text. The first record is the header row.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::DocumentParsing`] on malformed records.
    pub fn chunk(&self, content: &str, source_file: Option<&str>) -> Result<ParsedGenericDocument> {
        let mut reader = ::csv::ReaderBuilder::new()
            .flexible(true)
            .trim(::csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| IngestError::document_parsing(format!("CSV header error: {e}")))?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if h.is_empty() {
                    format!("column_{}", i + 1)
                } else {
                    h.to_string()
                }
            })
            .collect();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                IngestError::document_parsing(format!("CSV row {} error: {e}", index + 1))
            })?;
            let line = record
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    let header = headers
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| format!("column_{}", i + 1));
                    format!("{header}: {value}")
                })
                .collect::<Vec<_>>()
                .join(" | ");
            rows.push(line);
        }

        let title = file_stem(source_file).unwrap_or_else(|| "CSV Document".to_string());
        let mut doc = ParsedGenericDocument::new(title, content, DocumentType::Csv)
            .with_source_file(source_file);
        doc.metadata.insert(
            "columns".to_string(),
            Value::Array(headers.iter().cloned().map(Value::String).collect()),
        );
        doc.metadata.insert("row_count".to_string(), rows.len().into());

        if rows.is_empty() && !headers.is_empty() {
            doc.push_chunk(
                DocumentChunk::new(format!("Columns: {}", headers.join(", ")))
                    .with_metadata("chunk_type", "header"),
            );
        }
        doc.extend_chunks(self.pack_rows(&rows));
        doc.ensure_chunk();

        debug!(
            "Chunked {} CSV rows into {} chunks",
            rows.len(),
            doc.chunk_count()
        );
        Ok(doc)
    }

    fn pack_rows(&self, rows: &[String]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut current: Vec<&str> = Vec::new();
        let mut current_chars = 0;

        for (index, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if !current.is_empty() && current_chars + 1 + len > self.config.max_chunk_chars {
                chunks.push(rows_chunk(&current, start, index - 1));
                current.clear();
                current_chars = 0;
            }
            if current.is_empty() {
                start = index;
                current_chars = len;
            } else {
                current_chars += 1 + len;
            }
            current.push(row);
        }

        if !current.is_empty() {
            chunks.push(rows_chunk(&current, start, rows.len() - 1));
        }
        chunks
    }
}

/// Rows are numbered from 1, excluding the header row.
fn rows_chunk(rows: &[&str], first: usize, last: usize) -> DocumentChunk {
    DocumentChunk::new(rows.join("\n"))
        .with_metadata("chunk_type", "rows")
        .with_metadata("row_start", first + 1)
        .with_metadata("row_end", last + 1)
}

impl DocumentChunker for CsvChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::Csv
    }

    fn chunk_bytes(
        &self,
        bytes: &[u8],
        source_file: Option<&str>,
    ) -> apilens_core::Result<ParsedGenericDocument> {
        Ok(self.chunk(&String::from_utf8_lossy(bytes), source_file)?)
    }

    fn name(&self) -> &'static str {
        "CsvChunker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_render_with_headers() {
        let csv = "endpoint,method\n/users, GET\n/users,POST\n";
        let doc = CsvChunker::new().chunk(csv, Some("routes.csv")).unwrap();

        assert_eq!(doc.title, "routes");
        assert_eq!(doc.chunks.len(), 1);
        assert_eq!(
            doc.chunks[0].content,
            "endpoint: /users | method: GET\nendpoint: /users | method: POST"
        );
        assert_eq!(doc.chunks[0].metadata["row_end"], 2);
        assert_eq!(doc.metadata["row_count"], 2);
    }

    #[test]
    fn test_rows_are_packed_by_size() {
        let mut csv = String::from("id,payload\n");
        for i in 0..20 {
            csv.push_str(&format!("{i},{}\n", "p".repeat(90)));
        }
        let doc = CsvChunker::with_config(CsvChunkConfig {
            max_chunk_chars: 300,
        })
        .chunk(&csv, None)
        .unwrap();

        assert!(doc.chunks.len() > 1);
        assert!(doc.chunks.iter().all(|c| c.char_len() <= 300));
        assert_eq!(doc.chunks[0].metadata["row_start"], 1);
        assert_eq!(doc.chunks.last().unwrap().metadata["row_end"], 20);
    }

    #[test]
    fn test_header_only() {
        let doc = CsvChunker::new().chunk("a,b\n", None).unwrap();
        assert_eq!(doc.chunks.len(), 1);
        assert_eq!(doc.chunks[0].content, "Columns: a, b");
    }

    #[test]
    fn test_ragged_rows_are_accepted() {
        let doc = CsvChunker::new().chunk("a,b\n1\n2,3,4\n", None).unwrap();
        assert!(doc.chunks[0].content.contains("column_3: 4"));
    }
}
