//! Postman collection data model.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Collection format version, inferred from `info.schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CollectionVersion {
    /// Collection format v2.1.0.
    #[serde(rename = "2.1.0")]
    V2_1,
    /// Collection format v2.0.0.
    #[serde(rename = "2.0.0")]
    V2_0,
    /// Schema URL missing or unrecognized.
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl CollectionVersion {
    /// Infer the version from the `info.schema` URL.
    pub fn from_schema_url(schema: &str) -> Self {
        if schema.contains("v2.1.0") {
            Self::V2_1
        } else if schema.contains("v2.0.0") {
            Self::V2_0
        } else {
            Self::Unknown
        }
    }

    /// Get the version string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V2_1 => "2.1.0",
            Self::V2_0 => "2.0.0",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CollectionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A collection-level variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostmanVariable {
    /// Variable name.
    pub key: String,
    /// Value rendered as text.
    pub value: String,
    /// Declared type tag (`string`, `secret`, ...).
    #[serde(rename = "type")]
    pub variable_type: Option<String>,
    /// Optional description.
    pub description: Option<String>,
}

/// A request header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostmanHeader {
    /// Header name.
    pub key: String,
    /// Header value.
    pub value: String,
    /// Optional description.
    pub description: Option<String>,
    /// Disabled headers are kept but not sent by Postman.
    pub disabled: bool,
}

/// Authentication settings, keyed by Postman's `type` string.
///
/// Well-known types get their own variant; anything else lands in
/// [`PostmanAuth::Other`] with the raw key/value details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PostmanAuth {
    /// Explicitly no authentication.
    NoAuth,
    /// Bearer token.
    Bearer {
        /// The token, often a `{{variable}}`.
        token: Option<String>,
    },
    /// HTTP basic authentication.
    Basic {
        /// User name.
        username: Option<String>,
        /// Password.
        password: Option<String>,
    },
    /// API key sent in a header or query parameter.
    ApiKey {
        /// Header or parameter name.
        key: Option<String>,
        /// Key value.
        value: Option<String>,
        /// `header` or `query`.
        location: Option<String>,
    },
    /// OAuth 2.0 settings.
    OAuth2 {
        /// Grant settings as declared.
        details: IndexMap<String, String>,
    },
    /// Any other auth type.
    Other {
        /// The declared type string.
        auth_type: String,
        /// Settings as declared.
        details: IndexMap<String, String>,
    },
}

impl PostmanAuth {
    /// Build from the declared type and its settings.
    pub fn from_details(auth_type: &str, mut details: IndexMap<String, String>) -> Self {
        match auth_type {
            "noauth" => Self::NoAuth,
            "bearer" => Self::Bearer {
                token: details.shift_remove("token"),
            },
            "basic" => Self::Basic {
                username: details.shift_remove("username"),
                password: details.shift_remove("password"),
            },
            "apikey" => Self::ApiKey {
                key: details.shift_remove("key"),
                value: details.shift_remove("value"),
                location: details.shift_remove("in"),
            },
            "oauth2" => Self::OAuth2 { details },
            other => Self::Other {
                auth_type: other.to_string(),
                details,
            },
        }
    }

    /// The Postman type string.
    pub fn auth_type(&self) -> &str {
        match self {
            Self::NoAuth => "noauth",
            Self::Bearer { .. } => "bearer",
            Self::Basic { .. } => "basic",
            Self::ApiKey { .. } => "apikey",
            Self::OAuth2 { .. } => "oauth2",
            Self::Other { auth_type, .. } => auth_type,
        }
    }
}

/// One `formdata` or `urlencoded` body entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostmanFormField {
    /// Field name.
    pub key: String,
    /// Field value, or the file path for file fields.
    pub value: String,
    /// `text` or `file` for form data.
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    /// Optional description.
    pub description: Option<String>,
    /// Disabled fields are kept but not sent.
    pub disabled: bool,
}

/// A request body, keyed by Postman's `mode` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "payload", rename_all = "lowercase")]
pub enum PostmanBody {
    /// Raw text body.
    Raw {
        /// Body text.
        content: String,
        /// Editor language hint (`json`, `xml`, ...).
        language: Option<String>,
    },
    /// Multipart form data.
    FormData(Vec<PostmanFormField>),
    /// URL-encoded form.
    UrlEncoded(Vec<PostmanFormField>),
    /// Binary file upload.
    File {
        /// File path as recorded by Postman.
        src: Option<String>,
    },
    /// GraphQL query body.
    GraphQl {
        /// Query text.
        query: String,
        /// Variables as JSON text.
        variables: Option<String>,
    },
    /// Any other mode.
    Other {
        /// The declared mode string.
        mode: String,
    },
}

impl PostmanBody {
    /// The Postman mode string.
    pub fn mode(&self) -> &str {
        match self {
            Self::Raw { .. } => "raw",
            Self::FormData(_) => "formdata",
            Self::UrlEncoded(_) => "urlencoded",
            Self::File { .. } => "file",
            Self::GraphQl { .. } => "graphql",
            Self::Other { mode } => mode,
        }
    }
}

/// A request, flattened out of the folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostmanRequest {
    /// Request name.
    pub name: String,
    /// Upper-cased HTTP method.
    pub method: String,
    /// URL as declared or reassembled from parts.
    pub url: String,
    /// Optional description.
    pub description: Option<String>,
    /// Headers in declaration order.
    pub headers: Vec<PostmanHeader>,
    /// Optional body.
    pub body: Option<PostmanBody>,
    /// Request-level auth. When present it overrides the collection auth;
    /// the parser keeps both and leaves precedence to the caller.
    pub auth: Option<PostmanAuth>,
    /// Names of the enclosing folders, outermost first.
    pub folder_path: Vec<String>,
}

impl PostmanRequest {
    /// The auth that applies to this request, given the collection default.
    pub fn effective_auth<'a>(
        &'a self,
        collection: &'a PostmanCollection,
    ) -> Option<&'a PostmanAuth> {
        self.auth.as_ref().or(collection.auth.as_ref())
    }
}

/// A parsed collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PostmanCollection {
    /// Collection name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Collection format version.
    pub version: CollectionVersion,
    /// All requests, in declaration order.
    pub requests: Vec<PostmanRequest>,
    /// Collection variables.
    pub variables: Vec<PostmanVariable>,
    /// Collection-level auth.
    pub auth: Option<PostmanAuth>,
}

impl PostmanCollection {
    /// First request with the given name.
    pub fn request_by_name(&self, name: &str) -> Option<&PostmanRequest> {
        self.requests.iter().find(|r| r.name == name)
    }

    /// Requests using the given method, compared case-insensitively.
    pub fn requests_by_method(&self, method: &str) -> Vec<&PostmanRequest> {
        self.requests
            .iter()
            .filter(|r| r.method.eq_ignore_ascii_case(method))
            .collect()
    }

    /// Requests inside the named folder at any depth.
    pub fn requests_by_folder(&self, folder: &str) -> Vec<&PostmanRequest> {
        self.requests
            .iter()
            .filter(|r| r.folder_path.iter().any(|f| f == folder))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_from_schema_url() {
        assert_eq!(
            CollectionVersion::from_schema_url(
                "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
            ),
            CollectionVersion::V2_1
        );
        assert_eq!(
            CollectionVersion::from_schema_url(
                "https://schema.getpostman.com/json/collection/v2.0.0/"
            ),
            CollectionVersion::V2_0
        );
        assert_eq!(CollectionVersion::from_schema_url(""), CollectionVersion::Unknown);
    }

    #[test]
    fn test_auth_from_details() {
        let details: IndexMap<String, String> = [("key", "X-Api-Key"), ("in", "header")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let auth = PostmanAuth::from_details("apikey", details);
        assert_eq!(
            auth,
            PostmanAuth::ApiKey {
                key: Some("X-Api-Key".to_string()),
                value: None,
                location: Some("header".to_string()),
            }
        );
        assert_eq!(auth.auth_type(), "apikey");

        let auth = PostmanAuth::from_details("hawk", IndexMap::new());
        assert_eq!(auth.auth_type(), "hawk");
    }
}
