//! Format detection.
//!
//! Decides which parser or chunker should handle a piece of content. The
//! decision is a pure function of `(content, filename)`, checked in this
//! order:
//!
//! 1. file extension table (short-circuits content sniffing)
//! 2. `%PDF` magic bytes
//! 3. strict JSON, classified by shape (OpenAPI, Postman, generic JSON)
//! 4. GraphQL SDL pattern density
//! 5. YAML mapping, classified by the same shape rules
//! 6. Markdown pattern density
//! 7. HTML markers in the first 1000 characters
//! 8. printable-ratio fallback (text or unknown)

use apilens_core::{ApiFormat, DocumentType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Number of leading characters inspected by the HTML and printable checks.
const SNIFF_CHARS: usize = 1000;

/// Minimum share of printable characters for the text fallback.
const PRINTABLE_RATIO: f64 = 0.9;

/// Distinct patterns that must match before content counts as GraphQL or Markdown.
const MIN_PATTERN_HITS: usize = 2;

static GRAPHQL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\btype\s+\w+\s*(?:implements\s+[^{]+)?\{",
        r"\binput\s+\w+\s*\{",
        r"\benum\s+\w+\s*\{",
        r"\binterface\s+\w+\s*\{",
        r"\bunion\s+\w+\s*=",
        r"\bscalar\s+\w+",
        r"\btype\s+Query\s*\{",
        r"\btype\s+Mutation\s*\{",
        r"\btype\s+Subscription\s*\{",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("graphql detection regex"))
    .collect()
});

static MARKDOWN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?m)^#{1,6}\s+\S",
        r"\[[^\]]+\]\([^)]+\)",
        r"(?m)^\s*[-*+]\s+\S",
        r"(?m)^\s*\d+\.\s+\S",
        r"```",
        r"(?m)^>\s?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("markdown detection regex"))
    .collect()
});

const HTML_MARKERS: [&str; 5] = ["<html", "<!doctype", "<head>", "<body>", "<div"];

/// Content-based format detector.
///
/// # Examples
///
/// ```rust
/// use apilens_ingest::FormatDetector;
/// use apilens_core::{ApiFormat, DocumentType};
///
/// let spec = r#"{"openapi": "3.0.0", "info": {"title": "Pets", "version": "1"}}"#;
/// assert_eq!(FormatDetector::detect_from_content(spec), ApiFormat::OpenApi);
///
/// // A recognized extension always wins over content sniffing.
/// assert_eq!(
///     FormatDetector::detect_document_type(spec, Some("spec.graphql")),
///     DocumentType::GraphQl
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatDetector;

impl FormatDetector {
    /// Classify content into any routable document type.
    pub fn detect_document_type(content: &str, filename: Option<&str>) -> DocumentType {
        if let Some(doc_type) = filename.and_then(Self::detect_from_extension) {
            debug!("Detected {} from extension", doc_type);
            return doc_type;
        }

        if content.starts_with("%PDF") {
            return DocumentType::Pdf;
        }

        if let Ok(value) = serde_json::from_str::<Value>(content) {
            return classify_json(&value);
        }

        if is_graphql(content) {
            return DocumentType::GraphQl;
        }

        if let Some(value) = parse_yaml_mapping(content) {
            let doc_type = classify_json(&value);
            if doc_type.is_api_spec() {
                return doc_type;
            }
        }

        if is_markdown(content) {
            return DocumentType::Markdown;
        }

        if is_html(content) {
            return DocumentType::Html;
        }

        if is_mostly_printable(content) {
            DocumentType::Text
        } else {
            DocumentType::Unknown
        }
    }

    /// Classify content into one of the API specification formats.
    pub fn detect_from_content(content: &str) -> ApiFormat {
        if let Ok(value) = serde_json::from_str::<Value>(content) {
            return classify_json(&value)
                .api_format()
                .unwrap_or(ApiFormat::Unknown);
        }

        if is_graphql(content) {
            return ApiFormat::GraphQl;
        }

        parse_yaml_mapping(content)
            .and_then(|value| classify_json(&value).api_format())
            .unwrap_or(ApiFormat::Unknown)
    }

    /// Like [`Self::detect_from_content`], but a `.graphql`/`.gql` file name
    /// decides GraphQL up front.
    pub fn detect_api_format(content: &str, filename: Option<&str>) -> ApiFormat {
        if filename.and_then(Self::detect_from_extension) == Some(DocumentType::GraphQl) {
            return ApiFormat::GraphQl;
        }
        Self::detect_from_content(content)
    }

    /// Map a file name's extension to a document type.
    pub fn detect_from_extension(filename: &str) -> Option<DocumentType> {
        let extension = Path::new(filename)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();

        match extension.as_str() {
            "pdf" => Some(DocumentType::Pdf),
            "docx" | "doc" => Some(DocumentType::Docx),
            "md" | "markdown" => Some(DocumentType::Markdown),
            "txt" | "text" => Some(DocumentType::Text),
            "csv" => Some(DocumentType::Csv),
            "html" | "htm" => Some(DocumentType::Html),
            "graphql" | "gql" => Some(DocumentType::GraphQl),
            _ => None,
        }
    }

    /// Read a file once and classify it.
    pub async fn detect_from_path<P: AsRef<Path>>(path: P) -> Result<DocumentType> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IngestError::file_not_found(path.display().to_string())
            } else {
                IngestError::Io(e)
            }
        })?;

        let content = String::from_utf8_lossy(&bytes);
        let filename = path.file_name().and_then(|n| n.to_str());
        Ok(Self::detect_document_type(&content, filename))
    }
}

/// Classify a parsed JSON/YAML value by the keys it carries.
pub(crate) fn classify_json(value: &Value) -> DocumentType {
    let Some(object) = value.as_object() else {
        return DocumentType::JsonGeneric;
    };

    if object.contains_key("openapi") || object.contains_key("swagger") {
        return DocumentType::OpenApi;
    }

    let postman_schema = object
        .get("info")
        .and_then(|info| info.get("schema"))
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase)
        .is_some_and(|schema| schema.contains("postman") || schema.contains("collection"));

    if postman_schema || object.contains_key("item") {
        return DocumentType::Postman;
    }

    DocumentType::JsonGeneric
}

/// Parse YAML and convert it to JSON when the top level is a mapping.
pub(crate) fn parse_yaml_mapping(content: &str) -> Option<Value> {
    let yaml: serde_yml::Value = serde_yml::from_str(content).ok()?;
    if !yaml.is_mapping() {
        return None;
    }
    serde_json::to_value(yaml).ok()
}

fn count_distinct_hits(patterns: &[Regex], content: &str) -> usize {
    patterns.iter().filter(|p| p.is_match(content)).count()
}

/// Whether the content matches at least two GraphQL declaration patterns.
pub(crate) fn is_graphql(content: &str) -> bool {
    count_distinct_hits(&GRAPHQL_PATTERNS, content) >= MIN_PATTERN_HITS
}

/// Whether the content matches at least two Markdown structure patterns.
pub(crate) fn is_markdown(content: &str) -> bool {
    count_distinct_hits(&MARKDOWN_PATTERNS, content) >= MIN_PATTERN_HITS
}

fn sniff_prefix(content: &str) -> &str {
    match content.char_indices().nth(SNIFF_CHARS) {
        Some((byte, _)) => &content[..byte],
        None => content,
    }
}

fn is_html(content: &str) -> bool {
    let prefix = sniff_prefix(content).to_ascii_lowercase();
    HTML_MARKERS.iter().any(|marker| prefix.contains(marker))
}

#[allow(clippy::cast_precision_loss)]
fn is_mostly_printable(content: &str) -> bool {
    let prefix = sniff_prefix(content);
    let total = prefix.chars().count();
    if total == 0 {
        return false;
    }

    let printable = prefix
        .chars()
        .filter(|c| c.is_whitespace() || !c.is_control())
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .count();

    printable as f64 / total as f64 >= PRINTABLE_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const OPENAPI_JSON: &str = r#"{"openapi": "3.0.0", "info": {"title": "T", "version": "1"}, "paths": {}}"#;

    #[test_case("guide.pdf", DocumentType::Pdf ; "pdf")]
    #[test_case("report.DOCX", DocumentType::Docx ; "docx uppercase")]
    #[test_case("legacy.doc", DocumentType::Docx ; "doc")]
    #[test_case("README.md", DocumentType::Markdown ; "md")]
    #[test_case("notes.markdown", DocumentType::Markdown ; "markdown")]
    #[test_case("notes.txt", DocumentType::Text ; "txt")]
    #[test_case("notes.text", DocumentType::Text ; "text")]
    #[test_case("data.csv", DocumentType::Csv ; "csv")]
    #[test_case("index.htm", DocumentType::Html ; "htm")]
    #[test_case("schema.graphql", DocumentType::GraphQl ; "graphql")]
    #[test_case("schema.gql", DocumentType::GraphQl ; "gql")]
    fn test_extension_table(filename: &str, expected: DocumentType) {
        assert_eq!(FormatDetector::detect_from_extension(filename), Some(expected));
    }

    #[test]
    fn test_json_and_yaml_extensions_are_sniffed() {
        assert_eq!(FormatDetector::detect_from_extension("spec.json"), None);
        assert_eq!(FormatDetector::detect_from_extension("spec.yaml"), None);
        assert_eq!(FormatDetector::detect_from_extension("Makefile"), None);
    }

    #[test]
    fn test_extension_wins_over_content() {
        assert_eq!(
            FormatDetector::detect_document_type(OPENAPI_JSON, Some("spec.graphql")),
            DocumentType::GraphQl
        );
        assert_eq!(
            FormatDetector::detect_document_type(OPENAPI_JSON, Some("")),
            DocumentType::OpenApi
        );
    }

    #[test]
    fn test_pdf_magic() {
        assert_eq!(
            FormatDetector::detect_document_type("%PDF-1.7\n%\u{e2}\u{e3}", None),
            DocumentType::Pdf
        );
    }

    #[test]
    fn test_json_shapes() {
        assert_eq!(
            FormatDetector::detect_document_type(r#"{"swagger": "2.0"}"#, None),
            DocumentType::OpenApi
        );
        assert_eq!(
            FormatDetector::detect_document_type(
                r#"{"info": {"schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"}}"#,
                None
            ),
            DocumentType::Postman
        );
        assert_eq!(
            FormatDetector::detect_document_type(r#"{"item": []}"#, None),
            DocumentType::Postman
        );
        assert_eq!(
            FormatDetector::detect_document_type(r#"{"users": [1, 2]}"#, None),
            DocumentType::JsonGeneric
        );
        assert_eq!(
            FormatDetector::detect_document_type("[1, 2, 3]", None),
            DocumentType::JsonGeneric
        );
    }

    #[test]
    fn test_generic_json_is_not_an_api_format() {
        assert_eq!(
            FormatDetector::detect_from_content(r#"{"name": "config"}"#),
            ApiFormat::Unknown
        );
    }

    #[test]
    fn test_graphql_needs_two_patterns() {
        let sdl = "type User { id: ID! name: String } type Query { user(id: ID!): User }";
        assert_eq!(FormatDetector::detect_from_content(sdl), ApiFormat::GraphQl);
        assert_eq!(
            FormatDetector::detect_document_type(sdl, None),
            DocumentType::GraphQl
        );

        assert_ne!(
            FormatDetector::detect_from_content("scalar DateTime"),
            ApiFormat::GraphQl
        );
    }

    #[test]
    fn test_yaml_openapi() {
        let yaml = "openapi: 3.0.1\ninfo:\n  title: Pets\n  version: '1.0'\npaths: {}\n";
        assert_eq!(FormatDetector::detect_from_content(yaml), ApiFormat::OpenApi);
        assert_eq!(
            FormatDetector::detect_document_type(yaml, Some("pets.yaml")),
            DocumentType::OpenApi
        );
    }

    #[test]
    fn test_yaml_prose_falls_through() {
        assert_eq!(
            FormatDetector::detect_document_type("Note: remember to rotate keys", None),
            DocumentType::Text
        );
    }

    #[test]
    fn test_markdown_density() {
        let md = "# Title\n\nSome text with a [link](https://example.com).\n\n- item\n";
        assert_eq!(
            FormatDetector::detect_document_type(md, None),
            DocumentType::Markdown
        );

        assert_ne!(
            FormatDetector::detect_document_type("# Only a heading line", None),
            DocumentType::Markdown
        );
    }

    #[test]
    fn test_html_markers() {
        let html = "<!DOCTYPE html>\n<html><body><p>Hello</p></body></html>";
        assert_eq!(
            FormatDetector::detect_document_type(html, None),
            DocumentType::Html
        );
    }

    #[test]
    fn test_printable_fallback() {
        assert_eq!(
            FormatDetector::detect_document_type("plain words, nothing else", None),
            DocumentType::Text
        );
        let binary: String = (0u8..32).map(char::from).cycle().take(200).collect();
        assert_eq!(
            FormatDetector::detect_document_type(&binary, None),
            DocumentType::Unknown
        );
        assert_eq!(
            FormatDetector::detect_document_type("", None),
            DocumentType::Unknown
        );
    }

    #[test]
    fn test_detection_is_idempotent() {
        let inputs = [OPENAPI_JSON, "type A { x: Int } enum B { C }", "# h\n- a\n", "text"];
        for input in inputs {
            let first = FormatDetector::detect_document_type(input, Some("x.json"));
            let second = FormatDetector::detect_document_type(input, Some("x.json"));
            assert_eq!(first, second);
        }
    }

    #[tokio::test]
    async fn test_detect_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.json");
        tokio::fs::write(&path, r#"{"info": {"name": "c"}, "item": []}"#)
            .await
            .unwrap();

        assert_eq!(
            FormatDetector::detect_from_path(&path).await.unwrap(),
            DocumentType::Postman
        );

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            FormatDetector::detect_from_path(&missing).await,
            Err(IngestError::FileNotFound { .. })
        ));
    }
}
