//! Format detection, API specification parsing and document chunking.
//!
//! This crate turns raw files into retrieval records. It includes:
//!
//! - **Detection**: [`FormatDetector`] classifies content by extension, magic
//!   bytes and shape
//! - **API parsers**: OpenAPI/Swagger, GraphQL SDL and Postman collections
//! - **Chunkers**: text, Markdown, JSON, PDF, DOCX, HTML and CSV
//! - **Dispatch**: [`UnifiedFormatHandler`] routes content to the right parser
//! - **Loaders**: file and directory loaders implementing `apilens_core::Loader`
//!
//! # Quick Start
//!
//! ```rust
//! use apilens_ingest::UnifiedFormatHandler;
//!
//! let handler = UnifiedFormatHandler::new();
//! let result = handler
//!     .parse("type Query { users: [User!]! } type User { id: ID! }", None, None)
//!     .unwrap();
//!
//! assert_eq!(result.format.as_str(), "graphql");
//! // User type, its `id` field, and the `users` query
//! assert_eq!(result.documents.len(), 3);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chunking;
pub mod detector;
pub mod error;
pub mod graphql;
pub mod handler;
pub mod loaders;
pub mod openapi;
pub mod postman;

pub use detector::FormatDetector;
pub use error::{IngestError, Result};
pub use handler::{
    BatchError, BatchParseResult, DocumentData, DocumentParseResult, ParseResult, ParsedData,
    UnifiedFormatHandler,
};

/// Re-export commonly used types and traits.
pub mod prelude {
    pub use crate::error::{IngestError, Result as IngestResult};

    pub use crate::chunking::{
        CsvChunker, DocxChunker, HtmlChunker, JsonChunker, PdfChunker, TextChunker, TextMode,
    };
    pub use crate::detector::FormatDetector;
    pub use crate::graphql::{GraphQLParser, GraphQLSchema};
    pub use crate::handler::{
        BatchParseResult, DocumentData, DocumentParseResult, ParseResult, ParsedData,
        UnifiedFormatHandler,
    };
    pub use crate::loaders::{LoaderConfig, SpecDirectoryLoader, SpecFileLoader};
    pub use crate::openapi::{OpenApiParser, ParsedDocument};
    pub use crate::postman::{PostmanCollection, PostmanParser};

    pub use apilens_core::{
        ApiFormat, ApiLensError, DocumentChunker, DocumentType, Loader, ParsedGenericDocument,
        Result as CoreResult, ToDocuments, VectorDocument,
    };
}
