//! # apilens - API specification ingestion for retrieval pipelines
//!
//! apilens reads OpenAPI/Swagger documents, GraphQL schemas, Postman
//! collections and general documents (text, Markdown, JSON, PDF, DOCX, HTML,
//! CSV) and normalizes them into flat records ready for embedding.
//!
//! ## Quick Start
//!
//! ```rust
//! use apilens::prelude::*;
//!
//! let handler = UnifiedFormatHandler::new();
//! let result = handler
//!     .parse_document("# Title\n\nSome notes.\n\n- one\n- two\n", Some("notes.md"), None)
//!     .unwrap();
//!
//! assert_eq!(result.document_type, DocumentType::Markdown);
//! assert!(!result.documents.is_empty());
//! ```
//!
//! ## Architecture
//!
//! - **apilens-core**: record types, routing tags, traits, configuration, errors
//! - **apilens-ingest**: detection, API parsers, chunkers, unified handler, loaders

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export all public APIs from sub-crates
pub use apilens_core as core;
pub use apilens_ingest as ingest;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits
/// from all apilens crates.
pub mod prelude {
    pub use apilens_core::prelude::*;
    pub use apilens_ingest::prelude::*;
}

/// Version information for apilens.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
