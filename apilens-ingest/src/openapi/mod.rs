//! OpenAPI 3.x and Swagger 2.0 parsing.
//!
//! Parsing runs in two stages. First the content is decoded and its `$ref`
//! pointers expanded by [`RefResolver`], which works on files: the content
//! is written to a scoped temp file next to the source so relative
//! references still resolve. If that stage fails for any reason the parser
//! falls back to a plain decode with `$ref` objects left literal. Second,
//! endpoints, schemas and security schemes are extracted from the decoded
//! tree.

mod documents;
mod extract;
pub mod model;
pub mod resolver;

pub use model::{
    ParameterLocation, ParsedDocument, ParsedEndpoint, ParsedParameter, ParsedResponse,
    RequestBody, SpecDialect,
};
pub use resolver::RefResolver;

use apilens_core::config::OpenApiConfig;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};

/// Parses OpenAPI and Swagger documents into a [`ParsedDocument`].
///
/// # Examples
///
/// ```rust
/// use apilens_ingest::openapi::OpenApiParser;
///
/// let parser = OpenApiParser::new();
/// let content = r#"{"openapi": "3.0.0", "info": {"title": "Pets", "version": "1"},
///                   "paths": {"/pets": {"get": {"summary": "List pets"}}}}"#;
///
/// assert!(parser.can_parse(content));
/// let doc = parser.parse(content, None).unwrap();
/// assert_eq!(doc.endpoints[0].method(), "GET");
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpenApiParser {
    config: OpenApiConfig,
    resolver: RefResolver,
}

impl OpenApiParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom settings.
    pub fn with_config(config: OpenApiConfig) -> Self {
        Self {
            config,
            resolver: RefResolver::new(),
        }
    }

    /// Whether the content decodes to a mapping with a top-level `openapi`
    /// or `swagger` key. Never fails.
    pub fn can_parse(&self, content: &str) -> bool {
        load_structured(content)
            .is_ok_and(|spec| spec.get("openapi").is_some() || spec.get("swagger").is_some())
    }

    /// Parse a document.
    ///
    /// `source_file` is recorded on the result and anchors relative `$ref`
    /// paths. Fails only when the content is neither JSON nor a YAML mapping.
    pub fn parse(&self, content: &str, source_file: Option<&str>) -> Result<ParsedDocument> {
        let spec = if self.config.resolve_refs {
            match self.resolve_with_temp_file(content, source_file) {
                Ok(spec) => spec,
                Err(e) => {
                    warn!("$ref resolution failed, falling back to basic parse: {e}");
                    load_structured(content)?
                }
            }
        } else {
            load_structured(content)?
        };

        let document = extract::build_document(&spec, source_file);
        info!(
            "Parsed {} document '{}' {}: {} endpoints, {} schemas",
            document.format_type,
            document.title,
            document.version,
            document.endpoints.len(),
            document.schemas.len()
        );
        Ok(document)
    }

    /// Write the content to a temp file and resolve it. The file is removed
    /// when the guard drops, whatever the resolver returns.
    fn resolve_with_temp_file(&self, content: &str, source_file: Option<&str>) -> Result<Value> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".apilens-").suffix(".spec");

        let mut file = match source_dir(source_file) {
            Some(dir) => builder.tempfile_in(dir).or_else(|_| builder.tempfile())?,
            None => builder.tempfile()?,
        };
        file.write_all(content.as_bytes())?;
        file.flush()?;

        debug!("Resolving references via {}", file.path().display());
        self.resolver.resolve_file(file.path())
    }
}

/// Existing directory holding the source file. A bare file name lives in the
/// working directory.
fn source_dir(source_file: Option<&str>) -> Option<&Path> {
    source_file
        .map(Path::new)
        .and_then(Path::parent)
        .map(|dir| if dir.as_os_str().is_empty() { Path::new(".") } else { dir })
        .filter(|dir| dir.is_dir())
}

/// Decode JSON, else a YAML mapping.
pub(crate) fn load_structured(content: &str) -> Result<Value> {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(content) {
        return Ok(value);
    }
    match serde_yml::from_str::<Value>(content) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(IngestError::invalid_yaml("document root is not a mapping")),
        Err(e) => Err(IngestError::invalid_yaml(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const WITH_EXTERNAL_REF: &str = r##"{
        "openapi": "3.0.0",
        "info": { "title": "Split", "version": "2" },
        "paths": { "/err": { "get": { "responses": {
            "500": { "description": "Boom", "content": { "application/json": {
                "schema": { "$ref": "common.json#/Error" }
            }}}
        }}}}
    }"##;

    fn temp_files_in(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".apilens-"))
            .count()
    }

    #[test]
    fn test_relative_refs_resolve_next_to_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("common.json"), r#"{"Error": {"type": "object"}}"#).unwrap();
        let source = dir.path().join("api.json");

        let doc = OpenApiParser::new()
            .parse(WITH_EXTERNAL_REF, source.to_str())
            .unwrap();

        let schema = doc.endpoints[0].responses[0].schema.as_ref().unwrap();
        assert_eq!(schema["type"], "object");
        assert_eq!(temp_files_in(dir.path()), 0);
    }

    #[test]
    fn test_source_dir_of_bare_file_name_is_working_dir() {
        assert_eq!(source_dir(Some("openapi.yaml")), Some(Path::new(".")));
        assert_eq!(source_dir(Some("./openapi.yaml")), Some(Path::new(".")));
        assert_eq!(source_dir(Some("/no/such/dir/openapi.yaml")), None);
        assert_eq!(source_dir(None), None);
    }

    #[test]
    fn test_resolver_failure_falls_back_to_basic_parse() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("api.json");

        let doc = OpenApiParser::new()
            .parse(WITH_EXTERNAL_REF, source.to_str())
            .unwrap();

        let schema = doc.endpoints[0].responses[0].schema.as_ref().unwrap();
        assert_eq!(schema["$ref"], "common.json#/Error");
        assert_eq!(temp_files_in(dir.path()), 0);
    }

    #[test]
    fn test_resolution_can_be_disabled() {
        let content = r##"{"openapi": "3.0.0", "components": {"schemas": {"A": {"type": "string"}}},
            "paths": {"/a": {"get": {"responses": {"200": {"description": "ok",
              "content": {"application/json": {"schema": {"$ref": "#/components/schemas/A"}}}}}}}}}"##;

        let resolved = OpenApiParser::new().parse(content, None).unwrap();
        assert_eq!(resolved.endpoints[0].responses[0].schema.as_ref().unwrap()["type"], "string");

        let literal = OpenApiParser::with_config(OpenApiConfig { resolve_refs: false })
            .parse(content, None)
            .unwrap();
        assert!(literal.endpoints[0].responses[0].schema.as_ref().unwrap()["$ref"].is_string());
    }

    #[test]
    fn test_can_parse_never_fails() {
        let parser = OpenApiParser::new();
        assert!(parser.can_parse("swagger: '2.0'\ninfo:\n  title: x\n"));
        assert!(!parser.can_parse("{\"info\": {}}"));
        assert!(!parser.can_parse("{{{{"));
        assert!(!parser.can_parse(""));
    }

    #[test]
    fn test_unparseable_content_is_an_error() {
        let err = OpenApiParser::new().parse("just a sentence", None).unwrap_err();
        assert!(matches!(err, IngestError::InvalidYaml { .. }));
    }
}
