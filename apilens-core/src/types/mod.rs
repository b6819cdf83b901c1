//! Core data types.
//!
//! - [`VectorDocument`]: the normalized `{content, metadata}` record
//! - [`DocumentChunk`] / [`ParsedGenericDocument`]: chunked general documents
//! - [`DocumentType`] / [`ApiFormat`]: routing tags

pub mod chunk;
pub mod document;
pub mod format;

pub use chunk::{DocumentChunk, ParsedGenericDocument};
pub use document::{DOCUMENT_TYPE_KEY, SOURCE_KEY, VectorDocument, VectorDocumentBuilder};
pub use format::{ApiFormat, DocumentType};
