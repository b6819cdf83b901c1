//! Generic JSON chunking.

use apilens_core::{
    DocumentChunk, DocumentChunker, DocumentType, ParsedGenericDocument,
    config::JsonChunkConfig,
};
use serde_json::Value;
use tracing::debug;

use super::{file_stem, split_windows};
use crate::error::{IngestError, Result};

/// Chunks arbitrary JSON that is not an API specification.
///
/// Objects yield one chunk per key. An entry whose `key: value` rendering
/// exceeds `max_entry_chars` is chunked recursively and its sub-chunks carry
/// a `parent_key`. Arrays are grouped into runs of at most `max_group_items`
/// elements and `max_group_chars` characters.
#[derive(Debug, Clone, Default)]
pub struct JsonChunker {
    config: JsonChunkConfig,
}

impl JsonChunker {
    /// Create a chunker with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chunker with custom limits.
    pub fn with_config(config: JsonChunkConfig) -> Self {
        Self { config }
    }

    /// Parse and chunk JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidJson`] when the content is not JSON.
    pub fn chunk(&self, content: &str, source_file: Option<&str>) -> Result<ParsedGenericDocument> {
        let value: Value = serde_json::from_str(content).map_err(IngestError::invalid_json)?;
        Ok(self.build(&value, content.to_string(), source_file))
    }

    /// Chunk an already parsed value.
    pub fn chunk_value(&self, value: &Value, source_file: Option<&str>) -> ParsedGenericDocument {
        self.build(value, render(value), source_file)
    }

    fn build(&self, value: &Value, content: String, source_file: Option<&str>) -> ParsedGenericDocument {
        let mut doc = ParsedGenericDocument::new(
            json_title(value, source_file),
            content,
            DocumentType::JsonGeneric,
        )
        .with_source_file(source_file);

        doc.metadata
            .insert("root_type".to_string(), root_type(value).into());
        if let Value::Object(map) = value {
            doc.metadata
                .insert("top_level_keys".to_string(), map.len().into());
        }

        let mut chunks = Vec::new();
        self.chunk_node(value, "", None, &mut chunks);
        if chunks.is_empty() {
            chunks.push(DocumentChunk::new(render(value)).with_metadata("chunk_type", "value"));
        }
        doc.extend_chunks(chunks);

        debug!(
            "Chunked JSON {} into {} chunks",
            root_type(value),
            doc.chunk_count()
        );
        doc
    }

    fn chunk_node(
        &self,
        value: &Value,
        path: &str,
        parent_key: Option<&str>,
        out: &mut Vec<DocumentChunk>,
    ) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.chunk_entry(key, child, path, parent_key, out);
                }
            }
            Value::Array(items) => self.chunk_array(items, path, parent_key, out),
            scalar => {
                let label = if path.is_empty() { "$" } else { path };
                push_scalar(scalar, label, self.config.max_entry_chars, parent_key, out);
            }
        }
    }

    fn chunk_entry(
        &self,
        key: &str,
        value: &Value,
        path: &str,
        parent_key: Option<&str>,
        out: &mut Vec<DocumentChunk>,
    ) {
        let label = join_path(path, key);
        let entry = format!("{label}: {}", render(value));

        if entry.chars().count() <= self.config.max_entry_chars {
            out.push(
                with_parent(DocumentChunk::new(entry), parent_key)
                    .with_metadata("json_key", key)
                    .with_metadata("json_path", label)
                    .with_metadata("chunk_type", "object_entry"),
            );
            return;
        }

        if is_composite(value) {
            debug!("Entry {} exceeds limit, chunking recursively", label);
            self.chunk_node(value, &label, Some(key), out);
            return;
        }

        for window in split_windows(&entry, self.config.max_entry_chars, 0) {
            out.push(
                with_parent(DocumentChunk::new(window.text), parent_key)
                    .with_metadata("json_key", key)
                    .with_metadata("json_path", label.as_str())
                    .with_metadata("chunk_type", "object_entry_part"),
            );
        }
    }

    fn chunk_array(
        &self,
        items: &[Value],
        path: &str,
        parent_key: Option<&str>,
        out: &mut Vec<DocumentChunk>,
    ) {
        let mut group = ArrayGroup::default();

        for (index, item) in items.iter().enumerate() {
            let len = render(item).chars().count();

            if len > self.config.max_group_chars {
                group.flush(path, parent_key, out);
                let item_path = format!("{path}[{index}]");
                if is_composite(item) {
                    self.chunk_node(item, &item_path, parent_key, out);
                } else {
                    push_scalar(item, &item_path, self.config.max_group_chars, parent_key, out);
                }
                continue;
            }

            if !group.items.is_empty()
                && (group.items.len() >= self.config.max_group_items
                    || group.chars + len > self.config.max_group_chars)
            {
                group.flush(path, parent_key, out);
            }

            if group.items.is_empty() {
                group.start = index;
            }
            group.items.push(item);
            group.chars += len;
        }

        group.flush(path, parent_key, out);
    }
}

#[derive(Default)]
struct ArrayGroup<'a> {
    start: usize,
    items: Vec<&'a Value>,
    chars: usize,
}

impl ArrayGroup<'_> {
    fn flush(&mut self, path: &str, parent_key: Option<&str>, out: &mut Vec<DocumentChunk>) {
        if self.items.is_empty() {
            return;
        }

        let end = self.start + self.items.len() - 1;
        let rendered = serde_json::to_string_pretty(&self.items).unwrap_or_default();
        let json_path = if path.is_empty() { "$" } else { path };

        out.push(
            with_parent(
                DocumentChunk::new(format!("{json_path}[{}..={end}]: {rendered}", self.start)),
                parent_key,
            )
            .with_metadata("json_path", json_path)
            .with_metadata("chunk_type", "array_group")
            .with_metadata("array_start", self.start)
            .with_metadata("array_end", end)
            .with_metadata("item_count", self.items.len()),
        );

        self.items.clear();
        self.chars = 0;
    }
}

impl DocumentChunker for JsonChunker {
    fn document_type(&self) -> DocumentType {
        DocumentType::JsonGeneric
    }

    fn chunk_bytes(
        &self,
        bytes: &[u8],
        source_file: Option<&str>,
    ) -> apilens_core::Result<ParsedGenericDocument> {
        Ok(self.chunk(&String::from_utf8_lossy(bytes), source_file)?)
    }

    fn name(&self) -> &'static str {
        "JsonChunker"
    }
}

/// One `value` chunk, or `value_part` windows when the rendering exceeds `limit`.
fn push_scalar(
    scalar: &Value,
    label: &str,
    limit: usize,
    parent_key: Option<&str>,
    out: &mut Vec<DocumentChunk>,
) {
    let rendered = render(scalar);
    if rendered.chars().count() <= limit {
        out.push(
            with_parent(DocumentChunk::new(rendered), parent_key)
                .with_metadata("json_path", label)
                .with_metadata("chunk_type", "value"),
        );
        return;
    }

    debug!("Scalar at {} exceeds {} characters, windowing", label, limit);
    for window in split_windows(&rendered, limit, 0) {
        out.push(
            with_parent(DocumentChunk::new(window.text), parent_key)
                .with_metadata("json_path", label)
                .with_metadata("chunk_type", "value_part"),
        );
    }
}

fn with_parent(chunk: DocumentChunk, parent_key: Option<&str>) -> DocumentChunk {
    match parent_key {
        Some(key) => chunk.with_metadata("parent_key", key),
        None => chunk,
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn render(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn root_type(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
    }
}

fn json_title(value: &Value, source_file: Option<&str>) -> String {
    ["title", "name"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|title| !title.trim().is_empty())
        .map(str::to_string)
        .or_else(|| file_stem(source_file))
        .unwrap_or_else(|| "JSON Document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_object_chunks_per_key_in_order() {
        let doc = JsonChunker::new()
            .chunk(r#"{"name": "settings", "zeta": 1, "alpha": [1, 2]}"#, None)
            .unwrap();

        let keys: Vec<_> = doc
            .chunks
            .iter()
            .map(|c| c.metadata["json_key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["name", "zeta", "alpha"]);
        assert_eq!(doc.title, "settings");
        assert_eq!(doc.chunks[1].content, "zeta: 1");
    }

    #[test]
    fn test_large_entry_recurses_with_parent_key() {
        let value = json!({
            "small": true,
            "big": { "a": "x".repeat(1500), "b": "y".repeat(1500) }
        });
        let doc = JsonChunker::new().chunk_value(&value, Some("data.json"));

        assert_eq!(doc.chunks.len(), 3);
        assert_eq!(doc.chunks[1].metadata["parent_key"], "big");
        assert_eq!(doc.chunks[1].metadata["json_path"], "big.a");
        assert_eq!(doc.chunks[2].metadata["json_key"], "b");
        assert_eq!(doc.title, "data");
    }

    #[test]
    fn test_array_groups_respect_item_limit() {
        let value = Value::Array((0..25).map(|i| json!(i)).collect());
        let doc = JsonChunker::new().chunk_value(&value, None);

        let counts: Vec<_> = doc
            .chunks
            .iter()
            .map(|c| c.metadata["item_count"].as_u64().unwrap())
            .collect();
        assert_eq!(counts, vec![10, 10, 5]);
        assert_eq!(doc.chunks[2].metadata["array_start"], 20);
        assert_eq!(doc.chunks[2].metadata["array_end"], 24);
    }

    #[test]
    fn test_array_groups_respect_char_limit() {
        let value = Value::Array((0..6).map(|_| json!("z".repeat(300))).collect());
        let doc = JsonChunker::new().chunk_value(&value, None);

        assert_eq!(doc.chunks.len(), 2);
        assert!(doc.chunks.iter().all(|c| c.metadata["item_count"] == 3));
    }

    #[test]
    fn test_oversized_scalar_root_is_windowed() {
        let config = JsonChunkConfig::default();
        let value = json!("w".repeat(config.max_entry_chars * 2 + 10));
        let doc = JsonChunker::new().chunk_value(&value, None);

        assert_eq!(doc.chunks.len(), 3);
        assert!(doc.chunks.iter().all(|c| c.char_len() <= config.max_entry_chars));
        assert!(doc.chunks.iter().all(|c| c.metadata["chunk_type"] == "value_part"));
        assert_eq!(doc.chunks[2].metadata["json_path"], "$");
    }

    #[test]
    fn test_oversized_array_scalar_is_windowed() {
        let config = JsonChunkConfig::default();
        let value = json!([1, "s".repeat(config.max_group_chars + 50), 2]);
        let doc = JsonChunker::new().chunk_value(&value, None);

        let types: Vec<_> = doc
            .chunks
            .iter()
            .map(|c| c.metadata["chunk_type"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["array_group", "value_part", "value_part", "array_group"]);
        assert!(doc.chunks.iter().all(|c| c.char_len() <= config.max_group_chars));
        assert_eq!(doc.chunks[1].metadata["json_path"], "[1]");
        for (i, chunk) in doc.chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }

    #[test]
    fn test_empty_object_is_single_chunk() {
        let doc = JsonChunker::new().chunk("{}", None).unwrap();
        assert_eq!(doc.chunks.len(), 1);
        assert_eq!(doc.chunks[0].content, "{}");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = JsonChunker::new().chunk("{not json", None).unwrap_err();
        assert!(matches!(err, IngestError::InvalidJson { .. }));
    }
}
