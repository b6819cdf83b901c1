//! Error types for apilens.
//!
//! Parsers surface structural problems (corrupt JSON, unreadable PDFs, an
//! unrecognized format) as errors; missing optional fields never reach this
//! layer because parsers substitute defaults instead.

use thiserror::Error;

/// Core error type shared by every apilens crate.
#[derive(Error, Debug)]
pub enum ApiLensError {
    /// I/O related errors (file reading, temp-file handling).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Input that is recognized but structurally corrupt.
    #[error("Parse error: {message}")]
    Parse {
        /// Detailed error message
        message: String,
    },

    /// No parser accepts the input.
    #[error("Unsupported format: {message}")]
    UnsupportedFormat {
        /// Detailed error message
        message: String,
    },

    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Configuration {
        /// Detailed error message
        message: String,
    },

    /// Input validation errors
    #[error("Validation error: {message}")]
    Validation {
        /// Detailed error message
        message: String,
    },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Detailed error message
        message: String,
    },

    /// Generic errors from external dependencies
    #[error("External error: {source}")]
    External {
        /// The underlying error
        #[source]
        source: anyhow::Error,
    },
}

impl ApiLensError {
    /// Create a new parse error with a message.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new unsupported format error with a message.
    pub fn unsupported_format<S: Into<String>>(message: S) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    /// Create a new configuration error with a message.
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new validation error with a message.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new internal error with a message.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the caller supplied bad input, as opposed to an environment failure.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. }
                | Self::UnsupportedFormat { .. }
                | Self::Validation { .. }
                | Self::Serialization(_)
        )
    }
}

impl From<anyhow::Error> for ApiLensError {
    fn from(source: anyhow::Error) -> Self {
        Self::External { source }
    }
}

/// Result type alias for apilens operations.
pub type Result<T> = std::result::Result<T, ApiLensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiLensError::parse("bad input");
        assert_eq!(err.to_string(), "Parse error: bad input");

        let err = ApiLensError::unsupported_format("tried openapi, graphql");
        assert_eq!(
            err.to_string(),
            "Unsupported format: tried openapi, graphql"
        );
    }

    #[test]
    fn test_input_error_classification() {
        assert!(ApiLensError::parse("x").is_input_error());
        assert!(ApiLensError::unsupported_format("x").is_input_error());
        assert!(!ApiLensError::internal("x").is_input_error());
        assert!(
            !ApiLensError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
                .is_input_error()
        );
    }

    #[test]
    fn test_from_anyhow() {
        let err: ApiLensError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, ApiLensError::External { .. }));
    }
}
