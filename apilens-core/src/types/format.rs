//! Format tags used by detection and routing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiLensError;

/// Every document kind the ingestion layer can route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// PDF document.
    Pdf,
    /// Word document.
    Docx,
    /// Markdown text.
    Markdown,
    /// Plain text.
    Text,
    /// Comma-separated values.
    Csv,
    /// HTML page.
    Html,
    /// Valid JSON that is not a recognized API specification.
    JsonGeneric,
    /// OpenAPI 3.x or Swagger 2.0 specification.
    #[serde(rename = "openapi")]
    OpenApi,
    /// GraphQL SDL.
    #[serde(rename = "graphql")]
    GraphQl,
    /// Postman collection.
    Postman,
    /// Nothing matched.
    Unknown,
}

impl DocumentType {
    /// All routable types, in detection-table order.
    pub const ALL: [DocumentType; 11] = [
        Self::Pdf,
        Self::Docx,
        Self::Markdown,
        Self::Text,
        Self::Csv,
        Self::Html,
        Self::JsonGeneric,
        Self::OpenApi,
        Self::GraphQl,
        Self::Postman,
        Self::Unknown,
    ];

    /// Stable string tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Markdown => "markdown",
            Self::Text => "text",
            Self::Csv => "csv",
            Self::Html => "html",
            Self::JsonGeneric => "json_generic",
            Self::OpenApi => "openapi",
            Self::GraphQl => "graphql",
            Self::Postman => "postman",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this type is one of the API specification formats.
    pub fn is_api_spec(self) -> bool {
        matches!(self, Self::OpenApi | Self::GraphQl | Self::Postman)
    }

    /// Whether the type is binary and must be read as bytes.
    pub fn is_binary(self) -> bool {
        matches!(self, Self::Pdf | Self::Docx)
    }

    /// The API format equivalent, if any.
    pub fn api_format(self) -> Option<ApiFormat> {
        match self {
            Self::OpenApi => Some(ApiFormat::OpenApi),
            Self::GraphQl => Some(ApiFormat::GraphQl),
            Self::Postman => Some(ApiFormat::Postman),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = ApiLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ApiLensError::validation(format!("Unknown document type: {s}")))
    }
}

/// The narrower set of API specification formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiFormat {
    /// OpenAPI 3.x or Swagger 2.0.
    #[serde(rename = "openapi")]
    OpenApi,
    /// GraphQL SDL.
    #[serde(rename = "graphql")]
    GraphQl,
    /// Postman collection.
    Postman,
    /// Not an API specification.
    Unknown,
}

impl ApiFormat {
    /// Formats a caller can ask for explicitly.
    pub const SUPPORTED: [ApiFormat; 3] = [Self::OpenApi, Self::GraphQl, Self::Postman];

    /// Stable string tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenApi => "openapi",
            Self::GraphQl => "graphql",
            Self::Postman => "postman",
            Self::Unknown => "unknown",
        }
    }

    /// The document type equivalent.
    pub fn document_type(self) -> DocumentType {
        match self {
            Self::OpenApi => DocumentType::OpenApi,
            Self::GraphQl => DocumentType::GraphQl,
            Self::Postman => DocumentType::Postman,
            Self::Unknown => DocumentType::Unknown,
        }
    }
}

impl fmt::Display for ApiFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiFormat {
    type Err = ApiLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openapi" | "swagger" => Ok(Self::OpenApi),
            "graphql" | "gql" => Ok(Self::GraphQl),
            "postman" => Ok(Self::Postman),
            "unknown" => Ok(Self::Unknown),
            other => Err(ApiLensError::validation(format!(
                "Unknown API format: {other}"
            ))),
        }
    }
}
