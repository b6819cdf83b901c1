//! Parsing seams shared by the ingestion crate.

use std::fmt::Debug;

use crate::{
    Result,
    types::{DocumentType, ParsedGenericDocument, VectorDocument},
};

/// Splits one general document into a [`ParsedGenericDocument`].
///
/// Implementations are stateless between calls: everything a call
/// accumulates lives in the returned document.
pub trait DocumentChunker: Send + Sync + Debug {
    /// The document type this chunker produces.
    fn document_type(&self) -> DocumentType;

    /// Chunk raw document bytes.
    fn chunk_bytes(&self, bytes: &[u8], source_file: Option<&str>)
    -> Result<ParsedGenericDocument>;

    /// Get a human-readable name for this chunker.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Projects a parsed structure into vector-store records.
///
/// The projection is pure: calling it twice yields identical output, in
/// source declaration order.
pub trait ToDocuments {
    /// Build the records.
    fn to_documents(&self) -> Vec<VectorDocument>;
}

impl ToDocuments for ParsedGenericDocument {
    fn to_documents(&self) -> Vec<VectorDocument> {
        self.to_vector_documents()
    }
}
