//! OpenAPI / Swagger data model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    /// Templated path segment.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
    /// Swagger 2.0 body parameter.
    Body,
    /// Swagger 2.0 form field.
    FormData,
}

impl ParameterLocation {
    /// Parse the `in` value of a parameter object.
    pub fn from_in(value: &str) -> Option<Self> {
        match value {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            "body" => Some(Self::Body),
            "formData" => Some(Self::FormData),
            _ => None,
        }
    }

    /// The `in` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
            Self::FormData => "formData",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedParameter {
    /// Parameter name.
    pub name: String,
    /// Where the parameter is carried.
    pub location: ParameterLocation,
    /// Path parameters are always required.
    pub required: bool,
    /// Declared type, or the referenced schema name.
    #[serde(rename = "type")]
    pub param_type: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Default value.
    pub default: Option<Value>,
    /// Example value.
    pub example: Option<Value>,
}

/// One declared response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedResponse {
    /// Status code as declared, including `default` and ranges like `2XX`.
    pub status_code: String,
    /// Description.
    pub description: String,
    /// The chosen media type.
    pub content_type: Option<String>,
    /// Schema of the chosen media type.
    pub schema: Option<Value>,
    /// Example payload.
    pub example: Option<Value>,
}

/// The request body of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Description.
    pub description: Option<String>,
    /// Whether the body is required.
    pub required: bool,
    /// The chosen media type.
    pub content_type: Option<String>,
    /// Schema of the chosen media type.
    pub schema: Option<Value>,
}

/// One path × method operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedEndpoint {
    /// Path template, verbatim.
    pub path: String,
    method: String,
    /// Short summary.
    pub summary: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// `operationId`.
    pub operation_id: Option<String>,
    /// Tags in declaration order.
    pub tags: Vec<String>,
    /// Path-level and operation-level parameters, merged.
    pub parameters: Vec<ParsedParameter>,
    /// Request body, if any.
    pub request_body: Option<RequestBody>,
    /// Responses in declaration order.
    pub responses: Vec<ParsedResponse>,
    /// Security requirements: scheme name to scopes.
    pub security: Vec<IndexMap<String, Vec<String>>>,
    /// Deprecated flag.
    pub deprecated: bool,
    /// File the document came from.
    pub source_file: Option<String>,
    /// Title of the enclosing API.
    pub api_title: String,
    /// Version of the enclosing API.
    pub api_version: String,
}

impl ParsedEndpoint {
    /// Create an endpoint. The method is upper-cased; the path is kept as is.
    pub fn new<P: Into<String>>(path: P, method: &str) -> Self {
        Self {
            path: path.into(),
            method: method.to_uppercase(),
            summary: None,
            description: None,
            operation_id: None,
            tags: Vec::new(),
            parameters: Vec::new(),
            request_body: None,
            responses: Vec::new(),
            security: Vec::new(),
            deprecated: false,
            source_file: None,
            api_title: String::new(),
            api_version: String::new(),
        }
    }

    /// The upper-cased HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Parameters carried in the given location.
    pub fn parameters_in(
        &self,
        location: ParameterLocation,
    ) -> impl Iterator<Item = &ParsedParameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }
}

/// Which specification family a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecDialect {
    /// Swagger 2.0.
    Swagger,
    /// OpenAPI 3.x.
    OpenApi,
}

impl SpecDialect {
    /// Get the dialect name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Swagger => "swagger",
            Self::OpenApi => "openapi",
        }
    }
}

impl fmt::Display for SpecDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed OpenAPI or Swagger document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// `info.title`.
    pub title: String,
    /// `info.version`.
    pub version: String,
    /// `info.description`.
    pub description: Option<String>,
    /// First server URL, or `host` + `basePath` for Swagger.
    pub base_url: Option<String>,
    /// Endpoints in path then method declaration order.
    pub endpoints: Vec<ParsedEndpoint>,
    /// Named schemas.
    pub schemas: Map<String, Value>,
    /// Named security schemes.
    pub security_schemes: Map<String, Value>,
    /// File the document came from.
    pub source_file: Option<String>,
    /// Specification family.
    pub format_type: SpecDialect,
    /// Value of the top-level `swagger` or `openapi` key.
    pub spec_version: String,
}

impl ParsedDocument {
    /// Whether this is a Swagger 2.0 document.
    pub fn is_v2(&self) -> bool {
        self.format_type == SpecDialect::Swagger
    }

    /// Endpoints carrying the given tag.
    pub fn endpoints_by_tag(&self, tag: &str) -> Vec<&ParsedEndpoint> {
        self.endpoints
            .iter()
            .filter(|e| e.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// The endpoint for a path and method, compared case-insensitively on
    /// the method.
    pub fn endpoint(&self, path: &str, method: &str) -> Option<&ParsedEndpoint> {
        self.endpoints
            .iter()
            .find(|e| e.path == path && e.method.eq_ignore_ascii_case(method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_method_is_upper_cased() {
        let endpoint = ParsedEndpoint::new("/users/", "get");
        assert_eq!(endpoint.method(), "GET");
        assert_eq!(endpoint.path, "/users/");
    }

    #[test]
    fn test_parameter_location_from_in() {
        assert_eq!(
            ParameterLocation::from_in("formData"),
            Some(ParameterLocation::FormData)
        );
        assert_eq!(ParameterLocation::from_in("matrix"), None);
    }
}
