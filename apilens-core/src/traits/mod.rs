//! Core traits.
//!
//! - [`Loader`]: reads files and yields normalized records
//! - [`DocumentChunker`]: turns one general document into ordered chunks
//! - [`ToDocuments`]: projects a parsed API specification into records

pub mod loader;
pub mod parser;

pub use loader::Loader;
pub use parser::{DocumentChunker, ToDocuments};
