//! Extraction from a decoded specification.
//!
//! Swagger 2.0 and OpenAPI 3.x keep equivalent data at different paths; the
//! `is_v2` flag picks the path at every step. Everything is optional here:
//! a missing field yields a default, never an error.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use super::model::{
    ParameterLocation, ParsedDocument, ParsedEndpoint, ParsedParameter, ParsedResponse,
    RequestBody, SpecDialect,
};

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

const PREFERRED_MEDIA_TYPE: &str = "application/json";

static NULL: Value = Value::Null;

/// Build a [`ParsedDocument`] from a decoded specification.
pub(crate) fn build_document(spec: &Value, source_file: Option<&str>) -> ParsedDocument {
    let is_v2 = spec.get("swagger").is_some();
    let info = spec.get("info").unwrap_or(&NULL);

    let title = str_at(info, "title").unwrap_or_else(|| "Untitled API".to_string());
    let version = info
        .get("version")
        .map(scalar_text)
        .unwrap_or_else(|| "unknown".to_string());

    let (schemas, security_schemes) = if is_v2 {
        (
            object_at(spec.pointer("/definitions")),
            object_at(spec.pointer("/securityDefinitions")),
        )
    } else {
        (
            object_at(spec.pointer("/components/schemas")),
            object_at(spec.pointer("/components/securitySchemes")),
        )
    };

    let context = OperationContext {
        is_v2,
        default_security: spec.get("security"),
        consumes: first_str(spec.get("consumes")),
        produces: first_str(spec.get("produces")),
        source_file,
        title: &title,
        version: &version,
    };

    let mut endpoints = Vec::new();
    if let Some(paths) = spec.get("paths").and_then(Value::as_object) {
        for (path, item) in paths {
            let common = item.get("parameters").and_then(Value::as_array);
            let Some(operations) = item.as_object() else {
                continue;
            };
            for (method, operation) in operations {
                if !HTTP_METHODS.contains(&method.to_ascii_lowercase().as_str()) {
                    continue;
                }
                endpoints.push(context.endpoint(path, method, operation, common));
            }
        }
    }
    debug!("Extracted {} endpoints (v2: {is_v2})", endpoints.len());

    ParsedDocument {
        description: str_at(info, "description"),
        base_url: if is_v2 {
            swagger_base_url(spec)
        } else {
            spec.pointer("/servers/0/url")
                .and_then(Value::as_str)
                .map(str::to_string)
        },
        endpoints,
        schemas,
        security_schemes,
        source_file: source_file.map(str::to_string),
        format_type: if is_v2 {
            SpecDialect::Swagger
        } else {
            SpecDialect::OpenApi
        },
        spec_version: spec
            .get("swagger")
            .or_else(|| spec.get("openapi"))
            .map(scalar_text)
            .unwrap_or_default(),
        title,
        version,
    }
}

/// Document-wide settings every operation inherits.
struct OperationContext<'a> {
    is_v2: bool,
    default_security: Option<&'a Value>,
    consumes: Option<String>,
    produces: Option<String>,
    source_file: Option<&'a str>,
    title: &'a str,
    version: &'a str,
}

impl OperationContext<'_> {
    fn endpoint(
        &self,
        path: &str,
        method: &str,
        operation: &Value,
        common: Option<&Vec<Value>>,
    ) -> ParsedEndpoint {
        let mut endpoint = ParsedEndpoint::new(path, method);
        endpoint.summary = str_at(operation, "summary");
        endpoint.description = str_at(operation, "description");
        endpoint.operation_id = str_at(operation, "operationId");
        endpoint.tags = operation
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        endpoint.deprecated = operation
            .get("deprecated")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let raw_parameters = merge_parameters(common, operation.get("parameters"));
        endpoint.parameters = raw_parameters
            .iter()
            .filter_map(|p| self.parameter(p))
            .collect();

        endpoint.request_body = if self.is_v2 {
            let consumes =
                first_str(operation.get("consumes")).or_else(|| self.consumes.clone());
            raw_parameters
                .iter()
                .find(|p| p.get("in").and_then(Value::as_str) == Some("body"))
                .map(|p| RequestBody {
                    description: str_at(p, "description"),
                    required: p.get("required").and_then(Value::as_bool).unwrap_or(false),
                    content_type: Some(
                        consumes.unwrap_or_else(|| PREFERRED_MEDIA_TYPE.to_string()),
                    ),
                    schema: p.get("schema").cloned(),
                })
        } else {
            operation.get("requestBody").map(|body| {
                let (content_type, media) = pick_media(body.get("content"));
                RequestBody {
                    description: str_at(body, "description"),
                    required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
                    content_type,
                    schema: media.and_then(|m| m.get("schema")).cloned(),
                }
            })
        };

        if let Some(responses) = operation.get("responses").and_then(Value::as_object) {
            let produces =
                first_str(operation.get("produces")).or_else(|| self.produces.clone());
            endpoint.responses = responses
                .iter()
                .map(|(code, response)| self.response(code, response, produces.as_deref()))
                .collect();
        }

        // An explicit empty list on the operation disables the default.
        endpoint.security = operation
            .get("security")
            .or(self.default_security)
            .map(security_requirements)
            .unwrap_or_default();

        endpoint.source_file = self.source_file.map(str::to_string);
        endpoint.api_title = self.title.to_string();
        endpoint.api_version = self.version.to_string();
        endpoint
    }

    fn parameter(&self, raw: &Value) -> Option<ParsedParameter> {
        let name = str_at(raw, "name")?;
        let location = raw
            .get("in")
            .and_then(Value::as_str)
            .and_then(ParameterLocation::from_in)?;
        let schema = raw.get("schema");

        let param_type = if self.is_v2 && location != ParameterLocation::Body {
            str_at(raw, "type")
        } else {
            schema.and_then(schema_type_name)
        };
        let (default, example) = if self.is_v2 {
            (
                raw.get("default").cloned(),
                raw.get("x-example").or_else(|| raw.get("example")).cloned(),
            )
        } else {
            (
                schema.and_then(|s| s.get("default")).cloned(),
                raw.get("example")
                    .or_else(|| schema.and_then(|s| s.get("example")))
                    .cloned(),
            )
        };

        Some(ParsedParameter {
            required: location == ParameterLocation::Path
                || raw.get("required").and_then(Value::as_bool).unwrap_or(false),
            param_type,
            description: str_at(raw, "description"),
            default,
            example,
            name,
            location,
        })
    }

    fn response(&self, code: &str, response: &Value, produces: Option<&str>) -> ParsedResponse {
        let description = str_at(response, "description").unwrap_or_default();

        if self.is_v2 {
            let examples = response.get("examples").and_then(Value::as_object);
            let example = examples.and_then(|ex| {
                produces
                    .and_then(|ct| ex.get(ct))
                    .or_else(|| ex.values().next())
                    .cloned()
            });
            let schema = response.get("schema").cloned();
            return ParsedResponse {
                status_code: code.to_string(),
                description,
                content_type: schema.as_ref().map(|_| {
                    produces.unwrap_or(PREFERRED_MEDIA_TYPE).to_string()
                }),
                schema,
                example,
            };
        }

        let (content_type, media) = pick_media(response.get("content"));
        ParsedResponse {
            status_code: code.to_string(),
            description,
            content_type,
            schema: media.and_then(|m| m.get("schema")).cloned(),
            example: media.and_then(media_example),
        }
    }
}

/// Path-level parameters first; an operation parameter with the same name
/// and location replaces the path-level one in place.
fn merge_parameters<'a>(
    common: Option<&'a Vec<Value>>,
    own: Option<&'a Value>,
) -> Vec<&'a Value> {
    let mut merged: Vec<&Value> = common.map(|c| c.iter().collect()).unwrap_or_default();
    for parameter in own.and_then(Value::as_array).into_iter().flatten() {
        let identity = (parameter.get("name"), parameter.get("in"));
        match merged
            .iter_mut()
            .find(|existing| (existing.get("name"), existing.get("in")) == identity)
        {
            Some(slot) => *slot = parameter,
            None => merged.push(parameter),
        }
    }
    merged
}

/// Prefer `application/json`, else the first declared media type.
fn pick_media(content: Option<&Value>) -> (Option<String>, Option<&Value>) {
    let Some(content) = content.and_then(Value::as_object) else {
        return (None, None);
    };
    match content.get(PREFERRED_MEDIA_TYPE) {
        Some(media) => (Some(PREFERRED_MEDIA_TYPE.to_string()), Some(media)),
        None => content
            .iter()
            .next()
            .map_or((None, None), |(ct, media)| (Some(ct.clone()), Some(media))),
    }
}

fn media_example(media: &Value) -> Option<Value> {
    media.get("example").cloned().or_else(|| {
        media
            .get("examples")
            .and_then(Value::as_object)
            .and_then(|ex| ex.values().next())
            .map(|ex| ex.get("value").unwrap_or(ex).clone())
    })
}

/// A short type label for a schema: its `type`, `array[item]`, or the name
/// of an unresolved `$ref`.
pub(crate) fn schema_type_name(schema: &Value) -> Option<String> {
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        return reference.rsplit('/').next().map(str::to_string);
    }
    match schema.get("type").and_then(Value::as_str) {
        Some("array") => {
            let item = schema
                .get("items")
                .and_then(schema_type_name)
                .unwrap_or_else(|| "any".to_string());
            Some(format!("array[{item}]"))
        }
        Some(other) => Some(other.to_string()),
        None if schema.get("properties").is_some() => Some("object".to_string()),
        None => ["allOf", "oneOf", "anyOf"]
            .into_iter()
            .find(|k| schema.get(*k).is_some())
            .map(str::to_string),
    }
}

fn security_requirements(value: &Value) -> Vec<IndexMap<String, Vec<String>>> {
    value
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(Value::as_object)
                .map(|requirement| {
                    requirement
                        .iter()
                        .map(|(scheme, scopes)| {
                            let scopes = scopes
                                .as_array()
                                .map(|s| {
                                    s.iter()
                                        .filter_map(Value::as_str)
                                        .map(str::to_string)
                                        .collect()
                                })
                                .unwrap_or_default();
                            (scheme.clone(), scopes)
                        })
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default()
}

fn swagger_base_url(spec: &Value) -> Option<String> {
    let base_path = spec.get("basePath").and_then(Value::as_str).unwrap_or_default();
    match spec.get("host").and_then(Value::as_str) {
        Some(host) => {
            let scheme = first_str(spec.get("schemes")).unwrap_or_else(|| "https".to_string());
            Some(format!("{scheme}://{host}{base_path}"))
        }
        None => (!base_path.is_empty()).then(|| base_path.to_string()),
    }
}

fn object_at(value: Option<&Value>) -> Map<String, Value> {
    value.and_then(Value::as_object).cloned().unwrap_or_default()
}

fn first_str(value: Option<&Value>) -> Option<String> {
    value?.as_array()?.first()?.as_str().map(str::to_string)
}

fn str_at(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// YAML happily decodes `version: 1.0` as a number.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parameter_types_follow_the_version() {
        let v2 = json!({
            "swagger": "2.0",
            "info": { "title": "Pets", "version": "1.0" },
            "paths": { "/pets": { "get": { "parameters": [
                { "name": "limit", "in": "query", "type": "integer", "schema": { "type": "string" } }
            ]}}}
        });
        let v3 = json!({
            "openapi": "3.0.0",
            "info": { "title": "Pets", "version": "1.0" },
            "paths": { "/pets": { "get": { "parameters": [
                { "name": "limit", "in": "query", "type": "string", "schema": { "type": "integer" } }
            ]}}}
        });

        let doc = build_document(&v2, None);
        assert!(doc.is_v2());
        assert_eq!(doc.endpoints[0].parameters[0].param_type.as_deref(), Some("integer"));

        let doc = build_document(&v3, None);
        assert!(!doc.is_v2());
        assert_eq!(doc.endpoints[0].parameters[0].param_type.as_deref(), Some("integer"));
    }

    #[test]
    fn test_parameter_merge() {
        let spec = json!({
            "openapi": "3.0.0",
            "paths": { "/pets/{id}": {
                "parameters": [
                    { "name": "id", "in": "path", "schema": { "type": "string" } },
                    { "name": "trace", "in": "header", "schema": { "type": "string" } }
                ],
                "get": { "parameters": [
                    { "name": "id", "in": "path", "description": "Pet id", "schema": { "type": "integer" } },
                    { "name": "fields", "in": "query", "schema": { "type": "array", "items": { "type": "string" } } }
                ]},
                "summary": "not an operation"
            }}
        });

        let doc = build_document(&spec, None);
        assert_eq!(doc.endpoints.len(), 1);
        let params = &doc.endpoints[0].parameters;
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "trace", "fields"]);
        assert_eq!(params[0].description.as_deref(), Some("Pet id"));
        assert!(params[0].required);
        assert_eq!(params[2].param_type.as_deref(), Some("array[string]"));
    }

    #[test]
    fn test_request_body_and_responses_v3() {
        let spec = json!({
            "openapi": "3.0.0",
            "servers": [{ "url": "https://api.example.com/v1" }],
            "paths": { "/pets": { "post": {
                "requestBody": { "required": true, "content": {
                    "application/xml": { "schema": { "type": "string" } },
                    "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } }
                }},
                "responses": {
                    "201": { "description": "Created", "content": {
                        "text/plain": { "example": "ok" }
                    }},
                    "default": { "description": "Error" }
                }
            }}}
        });

        let doc = build_document(&spec, None);
        assert_eq!(doc.base_url.as_deref(), Some("https://api.example.com/v1"));
        let endpoint = &doc.endpoints[0];
        assert_eq!(endpoint.method(), "POST");

        let body = endpoint.request_body.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(body.content_type.as_deref(), Some("application/json"));

        assert_eq!(endpoint.responses[0].status_code, "201");
        assert_eq!(endpoint.responses[0].content_type.as_deref(), Some("text/plain"));
        assert_eq!(endpoint.responses[0].example, Some(json!("ok")));
        assert_eq!(endpoint.responses[1].status_code, "default");
        assert_eq!(endpoint.responses[1].content_type, None);
    }

    #[test]
    fn test_body_parameter_v2() {
        let spec = json!({
            "swagger": "2.0",
            "host": "api.example.com",
            "basePath": "/v2",
            "schemes": ["http"],
            "consumes": ["application/xml"],
            "definitions": { "Pet": { "type": "object" } },
            "paths": { "/pets": { "post": {
                "parameters": [{ "name": "pet", "in": "body", "required": true,
                                 "schema": { "$ref": "#/definitions/Pet" } }],
                "responses": { "200": { "description": "OK", "schema": { "type": "object" } } }
            }}}
        });

        let doc = build_document(&spec, None);
        assert_eq!(doc.base_url.as_deref(), Some("http://api.example.com/v2"));
        assert!(doc.schemas.contains_key("Pet"));

        let endpoint = &doc.endpoints[0];
        let body = endpoint.request_body.as_ref().unwrap();
        assert_eq!(body.content_type.as_deref(), Some("application/xml"));
        assert_eq!(endpoint.parameters[0].location, ParameterLocation::Body);
        assert_eq!(endpoint.parameters[0].param_type.as_deref(), Some("Pet"));
        assert_eq!(endpoint.responses[0].content_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_security_falls_back_to_document_default() {
        let spec = json!({
            "openapi": "3.0.0",
            "security": [{ "apiKey": [] }],
            "paths": { "/a": {
                "get": {},
                "post": { "security": [{ "oauth": ["write", "read"] }] },
                "delete": { "security": [] }
            }}
        });

        let doc = build_document(&spec, None);
        assert_eq!(doc.endpoints[0].security[0].get("apiKey"), Some(&vec![]));
        assert_eq!(
            doc.endpoints[1].security[0].get("oauth"),
            Some(&vec!["write".to_string(), "read".to_string()])
        );
        assert!(doc.endpoints[2].security.is_empty());
    }

    #[test]
    fn test_missing_everything_uses_defaults() {
        let doc = build_document(&json!({ "openapi": "3.1.0" }), Some("api.yaml"));
        assert_eq!(doc.title, "Untitled API");
        assert_eq!(doc.version, "unknown");
        assert_eq!(doc.spec_version, "3.1.0");
        assert!(doc.endpoints.is_empty());
        assert_eq!(doc.source_file.as_deref(), Some("api.yaml"));
    }
}
