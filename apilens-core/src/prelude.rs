//! Commonly used types and traits.

pub use crate::config::{ChunkingConfig, IngestConfig};
pub use crate::error::{ApiLensError, Result};
pub use crate::traits::{DocumentChunker, Loader, ToDocuments};
pub use crate::types::{
    ApiFormat, DocumentChunk, DocumentType, ParsedGenericDocument, VectorDocument,
};
