//! Postman collection parsing.
//!
//! Accepts collection format v2.0 and v2.1. Only the top-level `info` block
//! is mandatory; everything below it falls back to defaults so that one
//! sloppy item cannot sink a large collection.

mod documents;
pub mod model;

pub use model::{
    CollectionVersion, PostmanAuth, PostmanBody, PostmanCollection, PostmanFormField,
    PostmanHeader, PostmanRequest, PostmanVariable,
};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{IngestError, Result};

const FORMAT_NAME: &str = "Postman collection";
const UNNAMED_REQUEST: &str = "Unnamed Request";
const UNNAMED_FOLDER: &str = "Unnamed Folder";
const DEFAULT_METHOD: &str = "GET";

/// Parses Postman collection JSON into a [`PostmanCollection`].
///
/// The parser is stateless; the folder path and request list are locals of
/// each call.
///
/// # Examples
///
/// ```rust
/// use apilens_ingest::postman::PostmanParser;
///
/// let collection = PostmanParser::new().parse(r#"{
///     "info": {
///         "name": "Pets",
///         "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
///     },
///     "item": [{ "name": "List pets", "request": { "method": "GET", "url": "https://api.example.com/pets" } }]
/// }"#).unwrap();
///
/// assert_eq!(collection.version.as_str(), "2.1.0");
/// assert_eq!(collection.requests[0].url, "https://api.example.com/pets");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PostmanParser;

impl PostmanParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse collection JSON text.
    pub fn parse(&self, content: &str) -> Result<PostmanCollection> {
        let value: Value = serde_json::from_str(content)?;
        self.parse_value(&value)
    }

    /// Parse an already decoded collection.
    pub fn parse_value(&self, value: &Value) -> Result<PostmanCollection> {
        let info = value
            .get("info")
            .ok_or_else(|| IngestError::missing_field(FORMAT_NAME, "info"))?;

        let mut requests = Vec::new();
        if let Some(items) = value.get("item").and_then(Value::as_array) {
            walk_items(items, &mut Vec::new(), &mut requests);
        }

        let collection = PostmanCollection {
            name: str_field(info, "name").unwrap_or_else(|| "Unnamed Collection".to_string()),
            description: description_of(info.get("description")),
            version: CollectionVersion::from_schema_url(
                info.get("schema").and_then(Value::as_str).unwrap_or_default(),
            ),
            requests,
            variables: value
                .get("variable")
                .and_then(Value::as_array)
                .map(|vars| vars.iter().filter_map(parse_variable).collect())
                .unwrap_or_default(),
            auth: value.get("auth").and_then(parse_auth),
        };

        info!(
            "Parsed Postman collection '{}' ({}): {} requests",
            collection.name,
            collection.version,
            collection.requests.len()
        );
        Ok(collection)
    }
}

/// Depth-first walk of the item tree. Items with a `request` are leaves;
/// items with only an `item` array are folders.
fn walk_items(items: &[Value], folder_path: &mut Vec<String>, out: &mut Vec<PostmanRequest>) {
    for item in items {
        if let Some(request) = item.get("request") {
            out.push(parse_request(item, request, folder_path));
        } else if let Some(children) = item.get("item").and_then(Value::as_array) {
            let name = str_field(item, "name").unwrap_or_else(|| UNNAMED_FOLDER.to_string());
            debug!("Entering folder '{}' at depth {}", name, folder_path.len());
            folder_path.push(name);
            walk_items(children, folder_path, out);
            folder_path.pop();
        }
    }
}

fn parse_request(item: &Value, request: &Value, folder_path: &[String]) -> PostmanRequest {
    let name = str_field(item, "name").unwrap_or_else(|| UNNAMED_REQUEST.to_string());

    // v2.0 allows the request to be a bare URL string.
    if let Some(url) = request.as_str() {
        return PostmanRequest {
            name,
            method: DEFAULT_METHOD.to_string(),
            url: url.to_string(),
            description: description_of(item.get("description")),
            headers: Vec::new(),
            body: None,
            auth: None,
            folder_path: folder_path.to_vec(),
        };
    }

    PostmanRequest {
        name,
        method: str_field(request, "method")
            .map_or_else(|| DEFAULT_METHOD.to_string(), |m| m.to_uppercase()),
        url: parse_url(request.get("url")),
        description: description_of(request.get("description"))
            .or_else(|| description_of(item.get("description"))),
        headers: parse_headers(request.get("header")),
        body: request.get("body").and_then(parse_body),
        auth: request.get("auth").and_then(parse_auth),
        folder_path: folder_path.to_vec(),
    }
}

/// Reassemble a URL. Strings and `raw` are used verbatim; parts are joined
/// without percent-encoding.
fn parse_url(url: Option<&Value>) -> String {
    let Some(url) = url else {
        return String::new();
    };
    if let Some(raw) = url.as_str() {
        return raw.to_string();
    }
    if let Some(raw) = url.get("raw").and_then(Value::as_str) {
        return raw.to_string();
    }

    let mut assembled = String::new();
    if let Some(protocol) = url.get("protocol").and_then(Value::as_str) {
        assembled.push_str(protocol);
        assembled.push_str("://");
    }
    assembled.push_str(&join_segments(url.get("host"), "."));
    if let Some(port) = url.get("port").map(text_of).filter(|p| !p.is_empty()) {
        assembled.push(':');
        assembled.push_str(&port);
    }

    let path = join_segments(url.get("path"), "/");
    if !path.is_empty() {
        if !path.starts_with('/') {
            assembled.push('/');
        }
        assembled.push_str(&path);
    }

    let query: Vec<String> = url
        .get("query")
        .and_then(Value::as_array)
        .map(|pairs| {
            pairs
                .iter()
                .filter_map(|pair| {
                    let key = str_field(pair, "key")?;
                    let value = pair.get("value").map(text_of).unwrap_or_default();
                    Some(format!("{key}={value}"))
                })
                .collect()
        })
        .unwrap_or_default();
    if !query.is_empty() {
        assembled.push('?');
        assembled.push_str(&query.join("&"));
    }

    assembled
}

/// Host and path come as a string or a list of segments; v2.0 path
/// segments may also be `{ value }` objects.
fn join_segments(segments: Option<&Value>, separator: &str) -> String {
    match segments {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .map(|part| match part {
                Value::Object(_) => part.get("value").map(text_of).unwrap_or_default(),
                other => text_of(other),
            })
            .collect::<Vec<_>>()
            .join(separator),
        _ => String::new(),
    }
}

fn parse_headers(headers: Option<&Value>) -> Vec<PostmanHeader> {
    match headers {
        Some(Value::Array(list)) => list
            .iter()
            .filter_map(|header| {
                Some(PostmanHeader {
                    key: str_field(header, "key")?,
                    value: header.get("value").map(text_of).unwrap_or_default(),
                    description: description_of(header.get("description")),
                    disabled: header
                        .get("disabled")
                        .and_then(Value::as_bool)
                        .unwrap_or(false),
                })
            })
            .collect(),
        // v2.0 also accepts a newline-separated "Key: Value" block.
        Some(Value::String(block)) => block
            .lines()
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                let key = key.trim();
                (!key.is_empty()).then(|| PostmanHeader {
                    key: key.to_string(),
                    value: value.trim().to_string(),
                    description: None,
                    disabled: false,
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_body(body: &Value) -> Option<PostmanBody> {
    let mode = body.get("mode").and_then(Value::as_str)?;
    let parsed = match mode {
        "raw" => PostmanBody::Raw {
            content: str_field(body, "raw").unwrap_or_default(),
            language: body
                .pointer("/options/raw/language")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        "formdata" => PostmanBody::FormData(parse_form_fields(body.get("formdata"))),
        "urlencoded" => PostmanBody::UrlEncoded(parse_form_fields(body.get("urlencoded"))),
        "file" => PostmanBody::File {
            src: body
                .pointer("/file/src")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        "graphql" => PostmanBody::GraphQl {
            query: body
                .pointer("/graphql/query")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            variables: body
                .pointer("/graphql/variables")
                .map(text_of)
                .filter(|v| !v.is_empty()),
        },
        other => PostmanBody::Other {
            mode: other.to_string(),
        },
    };
    Some(parsed)
}

fn parse_form_fields(fields: Option<&Value>) -> Vec<PostmanFormField> {
    fields
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|field| {
                    Some(PostmanFormField {
                        key: str_field(field, "key")?,
                        value: field
                            .get("value")
                            .or_else(|| field.get("src"))
                            .map(text_of)
                            .unwrap_or_default(),
                        field_type: str_field(field, "type"),
                        description: description_of(field.get("description")),
                        disabled: field
                            .get("disabled")
                            .and_then(Value::as_bool)
                            .unwrap_or(false),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Auth settings come as a list of `{key, value}` (v2.1) or a flat object
/// (v2.0) under the key named by `type`.
fn parse_auth(auth: &Value) -> Option<PostmanAuth> {
    let auth_type = auth.get("type").and_then(Value::as_str)?;

    let details: IndexMap<String, String> = match auth.get(auth_type) {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| {
                let key = str_field(entry, "key")?;
                Some((key, entry.get("value").map(text_of).unwrap_or_default()))
            })
            .collect(),
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), text_of(v))).collect(),
        _ => IndexMap::new(),
    };

    Some(PostmanAuth::from_details(auth_type, details))
}

fn parse_variable(variable: &Value) -> Option<PostmanVariable> {
    Some(PostmanVariable {
        key: str_field(variable, "key").or_else(|| str_field(variable, "id"))?,
        value: variable.get("value").map(text_of).unwrap_or_default(),
        variable_type: str_field(variable, "type"),
        description: description_of(variable.get("description")),
    })
}

/// Descriptions are a string or, in v2.1, a `{content, type}` object.
fn description_of(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.as_str(),
        other => other.get("content").and_then(Value::as_str)?,
    };
    (!text.trim().is_empty()).then(|| text.to_string())
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Scalar values as text; composites as compact JSON.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn collection(items: Value) -> Value {
        json!({
            "info": {
                "name": "Store",
                "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
            },
            "item": items
        })
    }

    #[test]
    fn test_scenario_b() {
        let parsed = PostmanParser::new()
            .parse_value(&collection(json!([
                { "name": "Health", "request": { "method": "GET", "url": "https://api.example.com/health" } }
            ])))
            .unwrap();

        assert_eq!(parsed.version, CollectionVersion::V2_1);
        assert_eq!(parsed.requests.len(), 1);
        assert!(parsed.requests[0].folder_path.is_empty());
    }

    #[test]
    fn test_folder_flattening() {
        let parsed = PostmanParser::new()
            .parse_value(&collection(json!([
                { "name": "a", "item": [
                    { "name": "b", "item": [
                        { "name": "c", "item": [
                            { "name": "Deep", "request": { "url": "x" } }
                        ]}
                    ]},
                    { "name": "Shallow", "request": { "url": "y" } }
                ]},
                { "name": "Top", "request": { "url": "z" } }
            ])))
            .unwrap();

        let deep = parsed.request_by_name("Deep").unwrap();
        assert_eq!(deep.folder_path, vec!["a", "b", "c"]);
        assert_eq!(parsed.request_by_name("Shallow").unwrap().folder_path, vec!["a"]);
        assert!(parsed.request_by_name("Top").unwrap().folder_path.is_empty());
        assert_eq!(parsed.requests_by_folder("b").len(), 1);
        assert_eq!(parsed.requests_by_folder("a").len(), 2);
    }

    #[test]
    fn test_url_shapes() {
        assert_eq!(parse_url(Some(&json!("https://a.io/x"))), "https://a.io/x");
        assert_eq!(
            parse_url(Some(&json!({ "raw": "{{base}}/users", "host": ["ignored"] }))),
            "{{base}}/users"
        );
        assert_eq!(
            parse_url(Some(&json!({
                "protocol": "https",
                "host": ["api", "example", "com"],
                "path": ["v1", "users"],
                "query": [{ "key": "q", "value": "a b" }, { "key": "limit", "value": "10" }]
            }))),
            "https://api.example.com/v1/users?q=a b&limit=10"
        );
        assert_eq!(parse_url(None), "");
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let parsed = PostmanParser::new()
            .parse_value(&collection(json!([{ "request": {} }])))
            .unwrap();

        let request = &parsed.requests[0];
        assert_eq!(request.name, "Unnamed Request");
        assert_eq!(request.method, "GET");
        assert_eq!(request.url, "");
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
    }

    #[test]
    fn test_auth_wire_shapes() {
        let v21 = json!({ "type": "bearer", "bearer": [{ "key": "token", "value": "{{tok}}" }] });
        let v20 = json!({ "type": "basic", "basic": { "username": "u", "password": "p" } });

        assert_eq!(
            parse_auth(&v21),
            Some(PostmanAuth::Bearer {
                token: Some("{{tok}}".to_string())
            })
        );
        assert_eq!(
            parse_auth(&v20),
            Some(PostmanAuth::Basic {
                username: Some("u".to_string()),
                password: Some("p".to_string()),
            })
        );
        assert_eq!(parse_auth(&json!({})), None);
    }

    #[test]
    fn test_request_auth_overrides_collection_auth() {
        let mut value = collection(json!([
            { "name": "Open", "request": { "url": "x", "auth": { "type": "noauth" } } },
            { "name": "Inherit", "request": { "url": "y" } }
        ]));
        value["auth"] = json!({ "type": "apikey", "apikey": [{ "key": "in", "value": "header" }] });

        let parsed = PostmanParser::new().parse_value(&value).unwrap();
        let open = parsed.request_by_name("Open").unwrap();
        let inherit = parsed.request_by_name("Inherit").unwrap();

        assert_eq!(open.effective_auth(&parsed), Some(&PostmanAuth::NoAuth));
        assert_eq!(
            inherit.effective_auth(&parsed).map(PostmanAuth::auth_type),
            Some("apikey")
        );
    }

    #[test]
    fn test_bodies_and_headers() {
        let parsed = PostmanParser::new()
            .parse_value(&collection(json!([{
                "name": "Create",
                "request": {
                    "method": "post",
                    "url": "x",
                    "header": [
                        { "key": "Content-Type", "value": "application/json" },
                        { "key": "X-Debug", "value": "1", "disabled": true }
                    ],
                    "body": {
                        "mode": "raw",
                        "raw": "{\"a\":1}",
                        "options": { "raw": { "language": "json" } }
                    }
                }
            }, {
                "name": "Form",
                "request": {
                    "url": "y",
                    "header": "Accept: text/plain\nX-Trace: on",
                    "body": { "mode": "urlencoded", "urlencoded": [{ "key": "a", "value": "1" }] }
                }
            }])))
            .unwrap();

        let create = &parsed.requests[0];
        assert_eq!(create.method, "POST");
        assert!(create.headers[1].disabled);
        assert_eq!(
            create.body,
            Some(PostmanBody::Raw {
                content: "{\"a\":1}".to_string(),
                language: Some("json".to_string()),
            })
        );

        let form = &parsed.requests[1];
        assert_eq!(form.headers.len(), 2);
        assert_eq!(form.headers[1].key, "X-Trace");
        assert_eq!(form.body.as_ref().map(PostmanBody::mode), Some("urlencoded"));
        assert_eq!(parsed.requests_by_method("post").len(), 1);
    }

    #[test]
    fn test_description_object_and_variables() {
        let mut value = collection(json!([]));
        value["info"]["description"] = json!({ "content": "All the things", "type": "text/markdown" });
        value["variable"] = json!([{ "key": "base", "value": "https://api.example.com" }, { "value": "orphan" }]);

        let parsed = PostmanParser::new().parse_value(&value).unwrap();
        assert_eq!(parsed.description.as_deref(), Some("All the things"));
        assert_eq!(parsed.variables.len(), 1);
        assert_eq!(parsed.variables[0].key, "base");
    }

    #[test]
    fn test_errors() {
        let parser = PostmanParser::new();
        let err = parser.parse("{ not json").unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON: "));

        let err = parser.parse(r#"{"item": []}"#).unwrap_err();
        assert!(matches!(err, IngestError::MissingField { .. }));
    }

    #[test]
    fn test_unknown_version() {
        let parsed = PostmanParser::new()
            .parse(r#"{"info": {"name": "Old"}}"#)
            .unwrap();
        assert_eq!(parsed.version, CollectionVersion::Unknown);
        assert!(parsed.requests.is_empty());
    }
}
