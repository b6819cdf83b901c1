use apilens_core::{ToDocuments, VectorDocument, config::PostmanConfig, types::SOURCE_KEY};
use url::Url;

use super::model::{PostmanAuth, PostmanBody, PostmanCollection, PostmanRequest};

const SOURCE: &str = "postman";

impl PostmanCollection {
    /// Build records, truncating raw bodies to `config.max_body_chars`.
    pub fn to_documents_with(&self, config: &PostmanConfig) -> Vec<VectorDocument> {
        let mut documents = Vec::with_capacity(self.requests.len() + 1);

        documents.push(
            VectorDocument::builder()
                .content(self.render_info())
                .metadata(SOURCE_KEY, SOURCE)
                .metadata("type", "collection_info")
                .metadata("name", self.name.as_str())
                .metadata("version", self.version.as_str())
                .metadata("request_count", self.requests.len())
                .build(),
        );

        for request in &self.requests {
            let parsed_url = Url::parse(&request.url).ok();
            documents.push(
                VectorDocument::builder()
                    .content(render_request(request, config.max_body_chars))
                    .metadata(SOURCE_KEY, SOURCE)
                    .metadata("type", "request")
                    .metadata("name", request.name.as_str())
                    .metadata("method", request.method.as_str())
                    .metadata("collection_name", self.name.as_str())
                    .metadata("folder_path", request.folder_path.clone())
                    .metadata_opt(
                        "host",
                        parsed_url
                            .as_ref()
                            .and_then(Url::host_str)
                            .map(str::to_string),
                    )
                    .metadata_opt("path", parsed_url.as_ref().map(|u| u.path().to_string()))
                    .build(),
            );
        }

        documents
    }

    fn render_info(&self) -> String {
        let mut out = format!("Postman Collection: {}\n", self.name);
        if let Some(description) = &self.description {
            out.push_str(&format!("Description: {description}\n"));
        }
        out.push_str(&format!("Version: {}\n", self.version));
        out.push_str(&format!("Total Requests: {}\n", self.requests.len()));

        if !self.variables.is_empty() {
            out.push_str("\nVariables:\n");
            for variable in &self.variables {
                out.push_str(&format!("  - {}: {}\n", variable.key, variable.value));
            }
        }
        if let Some(auth) = &self.auth {
            out.push_str(&format!("\nAuthentication: {}\n", auth.auth_type()));
        }

        out.trim_end().to_string()
    }
}

impl ToDocuments for PostmanCollection {
    fn to_documents(&self) -> Vec<VectorDocument> {
        self.to_documents_with(&PostmanConfig::default())
    }
}

fn render_request(request: &PostmanRequest, max_body_chars: usize) -> String {
    let mut out = format!(
        "Request: {}\nMethod: {}\nURL: {}\n",
        request.name, request.method, request.url
    );
    if !request.folder_path.is_empty() {
        out.push_str(&format!("Folder: {}\n", request.folder_path.join(" / ")));
    }
    if let Some(description) = &request.description {
        out.push_str(&format!("Description: {description}\n"));
    }

    if !request.headers.is_empty() {
        out.push_str("\nHeaders:\n");
        for header in &request.headers {
            out.push_str(&format!("  - {}: {}", header.key, header.value));
            if header.disabled {
                out.push_str(" (disabled)");
            }
            out.push('\n');
        }
    }

    if let Some(auth) = &request.auth {
        out.push_str(&format!("\nAuthentication: {}\n", render_auth(auth)));
    }

    if let Some(body) = &request.body {
        out.push_str(&format!("\nBody ({}):\n", body.mode()));
        render_body(&mut out, body, max_body_chars);
    }

    out.trim_end().to_string()
}

/// Auth summary without secrets.
fn render_auth(auth: &PostmanAuth) -> String {
    match auth {
        PostmanAuth::ApiKey {
            key: Some(key),
            location,
            ..
        } => format!(
            "apikey ({key} in {})",
            location.as_deref().unwrap_or("header")
        ),
        other => other.auth_type().to_string(),
    }
}

fn render_body(out: &mut String, body: &PostmanBody, max_chars: usize) {
    match body {
        PostmanBody::Raw { content, .. } => {
            out.push_str(&format!("{}\n", truncate_with_ellipsis(content, max_chars)));
        }
        PostmanBody::FormData(fields) | PostmanBody::UrlEncoded(fields) => {
            for field in fields {
                out.push_str(&format!("  - {}: {}", field.key, field.value));
                if field.disabled {
                    out.push_str(" (disabled)");
                }
                out.push('\n');
            }
        }
        PostmanBody::File { src } => {
            out.push_str(&format!("File: {}\n", src.as_deref().unwrap_or("(none)")));
        }
        PostmanBody::GraphQl { query, variables } => {
            out.push_str(&format!("{}\n", truncate_with_ellipsis(query, max_chars)));
            if let Some(variables) = variables {
                out.push_str(&format!(
                    "Variables: {}\n",
                    truncate_with_ellipsis(variables, max_chars)
                ));
            }
        }
        PostmanBody::Other { .. } => {}
    }
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut truncated = crate::chunking::truncate_chars(text, max_chars);
        truncated.push_str("...");
        truncated
    } else {
        text.to_string()
    }
}
