//! Unified entry point over every parser and chunker.
//!
//! [`UnifiedFormatHandler`] detects what it was given, routes it to the
//! matching parser or chunker, and returns the structured result together
//! with its normalized records.

use apilens_core::{
    ApiFormat, DocumentChunker, DocumentType, ParsedGenericDocument, ToDocuments, VectorDocument,
    config::IngestConfig,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info};

use crate::chunking::{
    CsvChunker, DocxChunker, HtmlChunker, JsonChunker, PdfChunker, TextChunker, TextMode,
};
use crate::detector::FormatDetector;
use crate::error::{IngestError, Result};
use crate::graphql::{GraphQLParser, GraphQLSchema};
use crate::openapi::{OpenApiParser, ParsedDocument};
use crate::postman::{PostmanCollection, PostmanParser};

/// Structured output of an API specification parser.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "format", content = "data", rename_all = "lowercase")]
pub enum ParsedData {
    /// OpenAPI or Swagger document.
    OpenApi(ParsedDocument),
    /// GraphQL schema.
    GraphQl(GraphQLSchema),
    /// Postman collection.
    Postman(PostmanCollection),
}

impl ParsedData {
    /// The format this data was parsed from.
    pub fn format(&self) -> ApiFormat {
        match self {
            Self::OpenApi(_) => ApiFormat::OpenApi,
            Self::GraphQl(_) => ApiFormat::GraphQl,
            Self::Postman(_) => ApiFormat::Postman,
        }
    }
}

/// Result of [`UnifiedFormatHandler::parse`].
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    /// Detected or hinted format.
    pub format: ApiFormat,
    /// Parsed structure.
    pub data: ParsedData,
    /// Normalized records.
    pub documents: Vec<VectorDocument>,
}

/// Structured output of the general-document entry points.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DocumentData {
    /// An API specification.
    Api(ParsedData),
    /// A chunked general document.
    Generic(ParsedGenericDocument),
}

/// Result of [`UnifiedFormatHandler::parse_document`].
#[derive(Debug, Clone, Serialize)]
pub struct DocumentParseResult {
    /// Detected or hinted document type.
    pub document_type: DocumentType,
    /// Parsed structure.
    pub data: DocumentData,
    /// Normalized records.
    pub documents: Vec<VectorDocument>,
}

/// A file that failed inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchError {
    /// Path as given by the caller.
    pub file_path: String,
    /// Error message.
    pub error: String,
}

/// Result of [`UnifiedFormatHandler::parse_multiple`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchParseResult {
    /// Successfully parsed files, in input order.
    pub results: Vec<DocumentParseResult>,
    /// Failed files, in input order.
    pub errors: Vec<BatchError>,
}

impl BatchParseResult {
    /// Total number of records across all results.
    pub fn document_count(&self) -> usize {
        self.results.iter().map(|r| r.documents.len()).sum()
    }
}

/// Routes content to the right parser or chunker.
///
/// # Examples
///
/// ```rust
/// use apilens_core::ApiFormat;
/// use apilens_ingest::UnifiedFormatHandler;
///
/// let handler = UnifiedFormatHandler::new();
/// let result = handler
///     .parse("type User { id: ID! name: String } type Query { user(id: ID!): User }", None, None)
///     .unwrap();
///
/// assert_eq!(result.format, ApiFormat::GraphQl);
/// assert_eq!(result.documents.len(), 4);
/// ```
#[derive(Debug)]
pub struct UnifiedFormatHandler {
    config: IngestConfig,
    openapi: OpenApiParser,
    graphql: GraphQLParser,
    postman: PostmanParser,
    markdown: TextChunker,
    text: TextChunker,
    json: JsonChunker,
    pdf: PdfChunker,
    docx: DocxChunker,
    html: HtmlChunker,
    csv: CsvChunker,
}

impl Default for UnifiedFormatHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl UnifiedFormatHandler {
    /// Create a handler with default settings.
    pub fn new() -> Self {
        Self::with_config(IngestConfig::default())
    }

    /// Create a handler from a configuration.
    pub fn with_config(config: IngestConfig) -> Self {
        let text = TextChunker::with_config(config.chunking.text.clone());
        Self {
            openapi: OpenApiParser::with_config(config.openapi.clone()),
            graphql: GraphQLParser::with_config(config.graphql.clone()),
            postman: PostmanParser::new(),
            markdown: text.clone().with_mode(TextMode::Markdown),
            text: text.clone().with_mode(TextMode::Plain),
            json: JsonChunker::with_config(config.chunking.json.clone()),
            pdf: PdfChunker::with_config(config.chunking.pdf.clone()),
            docx: DocxChunker::with_text_chunker(text.clone()),
            html: HtmlChunker::with_text_chunker(text),
            csv: CsvChunker::with_config(config.chunking.csv.clone()),
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// API formats [`Self::parse`] accepts.
    pub fn supported_formats() -> &'static [ApiFormat] {
        &ApiFormat::SUPPORTED
    }

    /// Document types [`Self::parse_document`] accepts.
    pub fn supported_document_types() -> Vec<DocumentType> {
        DocumentType::ALL
            .into_iter()
            .filter(|t| *t != DocumentType::Unknown)
            .collect()
    }

    /// Parse an API specification.
    ///
    /// A hint other than [`ApiFormat::Unknown`] skips detection.
    pub fn parse(
        &self,
        content: &str,
        format_hint: Option<ApiFormat>,
        source_file: Option<&str>,
    ) -> Result<ParseResult> {
        let format = match format_hint {
            Some(hint) if hint != ApiFormat::Unknown => hint,
            _ => FormatDetector::detect_api_format(content, source_file),
        };
        debug!("Parsing as {format}");

        let (data, documents) = match format {
            ApiFormat::OpenApi => {
                let document = self.openapi.parse(content, source_file)?;
                let documents = document.to_documents();
                (ParsedData::OpenApi(document), documents)
            }
            ApiFormat::GraphQl => {
                let schema = self.graphql.parse(content);
                let documents = schema.to_documents();
                (ParsedData::GraphQl(schema), documents)
            }
            ApiFormat::Postman => {
                let collection = self.postman.parse(content)?;
                let documents = collection.to_documents_with(&self.config.postman);
                (ParsedData::Postman(collection), documents)
            }
            ApiFormat::Unknown => {
                return Err(IngestError::unsupported_format(
                    ApiFormat::SUPPORTED.iter().map(|f| f.as_str()),
                ));
            }
        };

        info!(
            "Parsed {} from {}: {} documents",
            format,
            source_file.unwrap_or("<memory>"),
            documents.len()
        );
        Ok(ParseResult {
            format,
            data,
            documents,
        })
    }

    /// Parse any text document: API specifications and general documents.
    pub fn parse_document(
        &self,
        content: &str,
        filename: Option<&str>,
        document_type_hint: Option<DocumentType>,
    ) -> Result<DocumentParseResult> {
        let document_type = resolve_type(document_type_hint, || {
            FormatDetector::detect_document_type(content, filename)
        });

        if let Some(format) = document_type.api_format() {
            let parsed = self.parse(content, Some(format), filename)?;
            return Ok(DocumentParseResult {
                document_type,
                data: DocumentData::Api(parsed.data),
                documents: parsed.documents,
            });
        }

        let document = match document_type {
            DocumentType::Pdf | DocumentType::Docx => {
                return self.parse_document_bytes(
                    content.as_bytes(),
                    filename,
                    Some(document_type),
                );
            }
            DocumentType::Markdown => self.markdown.chunk(content, filename),
            DocumentType::Text => self.text.chunk(content, filename),
            DocumentType::Html => self.html.chunk(content, filename),
            DocumentType::Csv => self.csv.chunk(content, filename)?,
            DocumentType::JsonGeneric => self.json.chunk(content, filename)?,
            _ => return Err(unsupported_document()),
        };
        Ok(generic_result(document_type, document))
    }

    /// Parse raw bytes. Binary formats are only reachable through here.
    pub fn parse_document_bytes(
        &self,
        bytes: &[u8],
        filename: Option<&str>,
        document_type_hint: Option<DocumentType>,
    ) -> Result<DocumentParseResult> {
        let document_type = resolve_type(document_type_hint, || {
            FormatDetector::detect_document_type(&String::from_utf8_lossy(bytes), filename)
        });

        if document_type == DocumentType::Unknown {
            return Err(unsupported_document());
        }

        let Some(chunker) = self.binary_chunker(document_type) else {
            let content = String::from_utf8_lossy(bytes);
            return self.parse_document(&content, filename, Some(document_type));
        };
        debug!("Chunking {} bytes with {}", bytes.len(), chunker.name());
        let document = chunker.chunk_bytes(bytes, filename)?;
        Ok(generic_result(document_type, document))
    }

    /// Chunker for a format that cannot be read as text.
    fn binary_chunker(&self, document_type: DocumentType) -> Option<&dyn DocumentChunker> {
        match document_type {
            DocumentType::Pdf => Some(&self.pdf),
            DocumentType::Docx => Some(&self.docx),
            _ => None,
        }
    }

    /// Read and parse one file. The path is recorded as the source file.
    pub async fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<DocumentParseResult> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IngestError::file_not_found(path.display().to_string())
            } else {
                IngestError::Io(e)
            }
        })?;

        let source = path.to_string_lossy();
        self.parse_document_bytes(&bytes, Some(&source), None)
    }

    /// Parse files one after another. A failing file is recorded in
    /// `errors` and never stops the batch.
    pub async fn parse_multiple<I, P>(&self, paths: I) -> BatchParseResult
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut batch = BatchParseResult::default();
        for path in paths {
            let path = path.as_ref();
            match self.parse_file(path).await {
                Ok(result) => batch.results.push(result),
                Err(e) => {
                    error!("Failed to parse {}: {}", path.display(), e);
                    batch.errors.push(BatchError {
                        file_path: path.display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Batch complete: {} parsed, {} failed",
            batch.results.len(),
            batch.errors.len()
        );
        batch
    }
}

fn resolve_type(
    hint: Option<DocumentType>,
    detect: impl FnOnce() -> DocumentType,
) -> DocumentType {
    match hint {
        Some(hint) if hint != DocumentType::Unknown => hint,
        _ => detect(),
    }
}

fn generic_result(
    document_type: DocumentType,
    document: ParsedGenericDocument,
) -> DocumentParseResult {
    DocumentParseResult {
        document_type,
        documents: document.to_vector_documents(),
        data: DocumentData::Generic(document),
    }
}

fn unsupported_document() -> IngestError {
    IngestError::unsupported_format(
        UnifiedFormatHandler::supported_document_types()
            .into_iter()
            .map(DocumentType::as_str),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const OPENAPI: &str = r#"{"openapi": "3.0.0", "info": {"title": "Pets", "version": "1"},
        "paths": {"/pets": {"get": {"summary": "List pets"}}}}"#;

    #[test]
    fn test_parse_detects_format() {
        let handler = UnifiedFormatHandler::new();
        let result = handler.parse(OPENAPI, None, None).unwrap();

        assert_eq!(result.format, ApiFormat::OpenApi);
        assert_eq!(result.data.format(), ApiFormat::OpenApi);
        assert_eq!(result.documents.len(), 2);
    }

    #[test]
    fn test_hint_skips_detection() {
        let handler = UnifiedFormatHandler::new();
        let result = handler
            .parse("type A { a: Int }", Some(ApiFormat::GraphQl), None)
            .unwrap();
        assert_eq!(result.format, ApiFormat::GraphQl);

        let err = handler.parse(OPENAPI, Some(ApiFormat::Postman), None).unwrap_err();
        assert!(matches!(err, IngestError::MissingField { .. }));
    }

    #[test]
    fn test_unknown_format_names_the_attempts() {
        let err = UnifiedFormatHandler::new()
            .parse("plain words only", None, None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to detect format. Supported formats: openapi, graphql, postman"
        );
    }

    #[test]
    fn test_parse_document_routes_generic_types() {
        let handler = UnifiedFormatHandler::new();

        let result = handler
            .parse_document("# Title\n\n## Part\n\n- item\n", Some("notes.md"), None)
            .unwrap();
        assert_eq!(result.document_type, DocumentType::Markdown);
        assert!(matches!(result.data, DocumentData::Generic(_)));
        assert!(
            result
                .documents
                .iter()
                .all(|d| d.get_metadata_str("document_type") == Some("markdown"))
        );

        let result = handler
            .parse_document("a,b\n1,2\n", Some("data.csv"), None)
            .unwrap();
        assert_eq!(result.document_type, DocumentType::Csv);

        let result = handler.parse_document(r#"[1, 2, 3]"#, None, None).unwrap();
        assert_eq!(result.document_type, DocumentType::JsonGeneric);

        let result = handler.parse_document(OPENAPI, None, None).unwrap();
        assert_eq!(result.document_type, DocumentType::OpenApi);
        assert!(matches!(result.data, DocumentData::Api(ParsedData::OpenApi(_))));
    }

    #[test]
    fn test_corrupt_pdf_bytes_fail() {
        let err = UnifiedFormatHandler::new()
            .parse_document_bytes(b"%PDF-1.4 garbage", Some("broken.pdf"), None)
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Core(apilens_core::ApiLensError::Parse { .. })
        ));
        assert!(err.to_string().contains("PDF parsing failed"));
    }

    #[test]
    fn test_binary_types_dispatch_through_chunkers() {
        let handler = UnifiedFormatHandler::new();

        for document_type in [DocumentType::Pdf, DocumentType::Docx] {
            let chunker = handler.binary_chunker(document_type).unwrap();
            assert_eq!(chunker.document_type(), document_type);
        }
        assert_eq!(
            handler.binary_chunker(DocumentType::Pdf).map(|c| c.name()),
            Some("PdfChunker")
        );
        assert!(handler.binary_chunker(DocumentType::Markdown).is_none());

        let result = handler
            .parse_document_bytes(b"plain notes", Some("notes.txt"), None)
            .unwrap();
        assert_eq!(result.document_type, DocumentType::Text);
    }

    #[test]
    fn test_supported_lists() {
        assert_eq!(UnifiedFormatHandler::supported_formats().len(), 3);
        let types = UnifiedFormatHandler::supported_document_types();
        assert_eq!(types.len(), 10);
        assert!(!types.contains(&DocumentType::Unknown));
    }
}
