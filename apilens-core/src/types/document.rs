//! The normalized record handed to vector stores.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key carried by API-specification records.
pub const SOURCE_KEY: &str = "source";

/// Metadata key carried by generic-document records.
pub const DOCUMENT_TYPE_KEY: &str = "document_type";

/// A `{content, metadata}` record, the only artifact a vector store consumes.
///
/// Every record produced by apilens has non-empty `content` and a metadata map
/// that contains either a `source` or a `document_type` discriminator.
///
/// # Examples
///
/// ```rust
/// use apilens_core::types::VectorDocument;
///
/// let doc = VectorDocument::builder()
///     .content("GET /users")
///     .metadata("source", "openapi")
///     .metadata("type", "endpoint")
///     .build();
///
/// assert_eq!(doc.discriminator(), Some("openapi"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorDocument {
    /// Text to embed.
    pub content: String,

    /// Record metadata, in insertion order.
    pub metadata: Map<String, Value>,
}

impl VectorDocument {
    /// Create a record with empty metadata.
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Create a builder for constructing records with fluent API.
    pub fn builder() -> VectorDocumentBuilder {
        VectorDocumentBuilder::default()
    }

    /// Add or update metadata for this record.
    #[must_use]
    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Get metadata value as a string.
    pub fn get_metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key)?.as_str()
    }

    /// The `source` or `document_type` tag that identifies the record kind.
    pub fn discriminator(&self) -> Option<&str> {
        self.get_metadata_str(SOURCE_KEY)
            .or_else(|| self.get_metadata_str(DOCUMENT_TYPE_KEY))
    }

    /// Whether the record satisfies the vector-store contract.
    pub fn is_well_formed(&self) -> bool {
        !self.content.trim().is_empty() && self.discriminator().is_some()
    }
}

/// Builder for [`VectorDocument`].
#[derive(Debug, Default)]
pub struct VectorDocumentBuilder {
    content: String,
    metadata: Map<String, Value>,
}

impl VectorDocumentBuilder {
    /// Set the record content.
    #[must_use]
    pub fn content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = content.into();
        self
    }

    /// Add metadata to the record.
    #[must_use]
    pub fn metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Add metadata only when a value is present.
    #[must_use]
    pub fn metadata_opt<K, V>(self, key: K, value: Option<V>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        match value {
            Some(value) => self.metadata(key, value),
            None => self,
        }
    }

    /// Build the record.
    pub fn build(self) -> VectorDocument {
        VectorDocument {
            content: self.content,
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_insertion_order() {
        let doc = VectorDocument::builder()
            .content("body")
            .metadata("source", "graphql")
            .metadata("type", "field")
            .metadata("name", "id")
            .build();

        let keys: Vec<&str> = doc.metadata.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["source", "type", "name"]);
    }

    #[test]
    fn test_discriminator_falls_back_to_document_type() {
        let doc = VectorDocument::new("chunk").with_metadata("document_type", "pdf");
        assert_eq!(doc.discriminator(), Some("pdf"));
        assert!(doc.is_well_formed());
    }

    #[test]
    fn test_blank_content_is_not_well_formed() {
        let doc = VectorDocument::new("   ").with_metadata("source", "postman");
        assert!(!doc.is_well_formed());

        let doc = VectorDocument::new("text");
        assert!(!doc.is_well_formed());
    }

    #[test]
    fn test_metadata_opt_skips_none() {
        let doc = VectorDocument::builder()
            .content("x")
            .metadata_opt("host", None::<String>)
            .metadata_opt("path", Some("/v1"))
            .build();
        assert!(!doc.metadata.contains_key("host"));
        assert_eq!(doc.get_metadata_str("path"), Some("/v1"));
    }
}
