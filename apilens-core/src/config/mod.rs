//! Configuration for the ingestion layer.
//!
//! Configurations are serializable, default to the documented chunk bands,
//! and can be loaded from TOML or JSON files.

pub mod chunking;

pub use chunking::{
    ChunkingConfig, CsvChunkConfig, JsonChunkConfig, PdfChunkConfig, TextChunkConfig,
};

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::{ApiLensError, Result};

/// Postman rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PostmanConfig {
    /// Raw request bodies longer than this are truncated in request documents.
    pub max_body_chars: usize,
}

impl Default for PostmanConfig {
    fn default() -> Self {
        Self { max_body_chars: 500 }
    }
}

/// GraphQL scanning settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GraphQlConfig {
    /// How many lines above a declaration are searched for its description.
    pub description_lookback_lines: usize,
}

impl Default for GraphQlConfig {
    fn default() -> Self {
        Self {
            description_lookback_lines: 20,
        }
    }
}

/// OpenAPI parsing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OpenApiConfig {
    /// Expand `$ref` pointers before extraction.
    pub resolve_refs: bool,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self { resolve_refs: true }
    }
}

/// Top-level configuration for apilens ingestion.
///
/// # Examples
///
/// ```rust
/// use apilens_core::config::IngestConfig;
///
/// let config: IngestConfig = toml::from_str(r#"
///     [chunking.text]
///     chunk_size = 800
///     chunk_overlap = 80
///
///     [postman]
///     max_body_chars = 300
/// "#).unwrap();
///
/// assert_eq!(config.chunking.text.chunk_size, 800);
/// assert_eq!(config.chunking.pdf.max_page_chars, 2000);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestConfig {
    /// General-document chunking.
    pub chunking: ChunkingConfig,
    /// Postman rendering.
    pub postman: PostmanConfig,
    /// GraphQL scanning.
    pub graphql: GraphQlConfig,
    /// OpenAPI parsing.
    pub openapi: OpenApiConfig,
}

impl IngestConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the chunking settings.
    #[must_use]
    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    /// Set whether OpenAPI `$ref` pointers are resolved.
    #[must_use]
    pub fn with_resolve_refs(mut self, resolve_refs: bool) -> Self {
        self.openapi.resolve_refs = resolve_refs;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;

        if self.postman.max_body_chars == 0 {
            return Err(ApiLensError::configuration(
                "Postman body limit must be greater than 0",
            ));
        }

        if self.graphql.description_lookback_lines == 0 {
            return Err(ApiLensError::configuration(
                "GraphQL description lookback must be at least one line",
            ));
        }

        Ok(())
    }

    /// Parse a configuration from a string, choosing the syntax by extension.
    pub fn from_str_with_extension(content: &str, extension: &str) -> Result<Self> {
        let config: Self = match extension.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content).map_err(|e| {
                ApiLensError::configuration(format!("Invalid TOML configuration: {e}"))
            })?,
            "json" => serde_json::from_str(content).map_err(|e| {
                ApiLensError::configuration(format!("Invalid JSON configuration: {e}"))
            })?,
            other => {
                return Err(ApiLensError::configuration(format!(
                    "Unsupported configuration file extension: {other}"
                )));
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load and validate a `.toml` or `.json` configuration file.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from {}", path.display());

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                ApiLensError::configuration(format!(
                    "Configuration file has no extension: {}",
                    path.display()
                ))
            })?;

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ApiLensError::configuration(format!(
                "Failed to read configuration file {}: {e}",
                path.display()
            ))
        })?;

        let config = Self::from_str_with_extension(&content, extension)?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }
}
