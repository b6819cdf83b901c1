//! # apilens core
//!
//! Shared building blocks for apilens:
//!
//! - **Data structures**: [`VectorDocument`], [`DocumentChunk`], [`ParsedGenericDocument`]
//! - **Routing tags**: [`DocumentType`] and [`ApiFormat`]
//! - **Traits**: [`Loader`], [`DocumentChunker`], [`ToDocuments`]
//! - **Configuration**: [`config::IngestConfig`] with chunk-size bands
//! - **Error handling**: [`ApiLensError`]
//!
//! ```rust
//! use apilens_core::prelude::*;
//!
//! let mut doc = ParsedGenericDocument::new("Notes", "hello world", DocumentType::Text);
//! doc.push_chunk(DocumentChunk::new("hello world"));
//!
//! let records = doc.to_documents();
//! assert_eq!(records[0].discriminator(), Some("text"));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude;

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{ApiLensError, Result};
pub use traits::*;
pub use types::{
    ApiFormat, DocumentChunk, DocumentType, ParsedGenericDocument, VectorDocument,
};

/// Version information for the apilens core library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the apilens core library.
pub const NAME: &str = env!("CARGO_PKG_NAME");
