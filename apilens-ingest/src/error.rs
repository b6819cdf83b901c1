//! Error types for the ingestion crate.

use thiserror::Error;

/// Errors raised while detecting, parsing or chunking input.
#[derive(Error, Debug)]
pub enum IngestError {
    /// IO error occurred while reading files or managing temp files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Content that should be JSON is not.
    #[error("Invalid JSON: {message}")]
    InvalidJson {
        /// Decoder message.
        message: String,
    },

    /// Content is neither JSON nor a YAML mapping.
    #[error("Invalid YAML: {message}")]
    InvalidYaml {
        /// Decoder message.
        message: String,
    },

    /// A field the format cannot do without is absent.
    #[error("Invalid {format} document: missing '{field}' field")]
    MissingField {
        /// Format being parsed.
        format: String,
        /// Name of the missing field.
        field: String,
    },

    /// Detection found nothing a parser accepts.
    #[error("Unable to detect format. Supported formats: {}", attempted.join(", "))]
    UnsupportedFormat {
        /// Formats that were considered.
        attempted: Vec<String>,
    },

    /// Error extracting text from binary documents (PDF, Word, etc.).
    #[error("Text extraction error: {message}")]
    TextExtraction {
        /// Error message describing the extraction issue.
        message: String,
    },

    /// A `$ref` pointer could not be followed.
    #[error("Reference resolution error: {message}")]
    RefResolution {
        /// Error message describing the unresolved pointer.
        message: String,
    },

    /// Error parsing or processing document content.
    #[error("Document parsing error: {message}")]
    DocumentParsing {
        /// Error message describing the parsing issue.
        message: String,
    },

    /// File not found or inaccessible.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Core framework error.
    #[error("Core error: {0}")]
    Core(#[from] apilens_core::ApiLensError),
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    /// Create a new invalid JSON error.
    pub fn invalid_json<S: ToString>(message: S) -> Self {
        Self::InvalidJson {
            message: message.to_string(),
        }
    }

    /// Create a new invalid YAML error.
    pub fn invalid_yaml<S: ToString>(message: S) -> Self {
        Self::InvalidYaml {
            message: message.to_string(),
        }
    }

    /// Create a new missing field error.
    pub fn missing_field<F: Into<String>, S: Into<String>>(format: F, field: S) -> Self {
        Self::MissingField {
            format: format.into(),
            field: field.into(),
        }
    }

    /// Create a new unsupported format error.
    pub fn unsupported_format<I, S>(attempted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::UnsupportedFormat {
            attempted: attempted.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a new text extraction error.
    pub fn text_extraction<S: Into<String>>(message: S) -> Self {
        Self::TextExtraction {
            message: message.into(),
        }
    }

    /// Create a new reference resolution error.
    pub fn ref_resolution<S: Into<String>>(message: S) -> Self {
        Self::RefResolution {
            message: message.into(),
        }
    }

    /// Create a new document parsing error.
    pub fn document_parsing<S: Into<String>>(message: S) -> Self {
        Self::DocumentParsing {
            message: message.into(),
        }
    }

    /// Create a new file not found error.
    pub fn file_not_found<S: Into<String>>(path: S) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_json(err)
    }
}

// Convert to ApiLensError for trait compatibility
impl From<IngestError> for apilens_core::ApiLensError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Io(e) => Self::Io(e),
            IngestError::Core(e) => e,
            IngestError::UnsupportedFormat { .. } => Self::unsupported_format(err.to_string()),
            IngestError::FileNotFound { .. } => Self::validation(err.to_string()),
            _ => Self::parse(err.to_string()),
        }
    }
}
