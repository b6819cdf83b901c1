use apilens_core::{ToDocuments, VectorDocument, types::SOURCE_KEY};
use serde_json::Value;

use super::extract::schema_type_name;
use super::model::{ParsedDocument, ParsedEndpoint};

const SOURCE: &str = "openapi";

impl ToDocuments for ParsedDocument {
    /// One `api_overview` record, one `endpoint` record per endpoint and one
    /// `schema` record per named schema.
    fn to_documents(&self) -> Vec<VectorDocument> {
        let mut documents = Vec::with_capacity(1 + self.endpoints.len() + self.schemas.len());

        documents.push(
            VectorDocument::builder()
                .content(self.render_overview())
                .metadata(SOURCE_KEY, SOURCE)
                .metadata("type", "api_overview")
                .metadata("title", self.title.as_str())
                .metadata("version", self.version.as_str())
                .metadata("format", self.format_type.as_str())
                .metadata("endpoint_count", self.endpoints.len())
                .metadata_opt("source_file", self.source_file.as_deref())
                .build(),
        );

        for endpoint in &self.endpoints {
            documents.push(
                VectorDocument::builder()
                    .content(render_endpoint(endpoint))
                    .metadata(SOURCE_KEY, SOURCE)
                    .metadata("type", "endpoint")
                    .metadata("path", endpoint.path.as_str())
                    .metadata("method", endpoint.method())
                    .metadata_opt("operation_id", endpoint.operation_id.as_deref())
                    .metadata("tags", endpoint.tags.clone())
                    .metadata("deprecated", endpoint.deprecated)
                    .metadata("api_title", self.title.as_str())
                    .build(),
            );
        }

        for (name, schema) in &self.schemas {
            documents.push(
                VectorDocument::builder()
                    .content(render_schema(name, schema))
                    .metadata(SOURCE_KEY, SOURCE)
                    .metadata("type", "schema")
                    .metadata("name", name.as_str())
                    .metadata("api_title", self.title.as_str())
                    .build(),
            );
        }

        documents
    }
}

impl ParsedDocument {
    fn render_overview(&self) -> String {
        let mut out = format!("API: {}\nVersion: {}\n", self.title, self.version);
        out.push_str(&format!("Specification: {} {}\n", self.format_type, self.spec_version));
        if let Some(description) = &self.description {
            out.push_str(&format!("Description: {description}\n"));
        }
        if let Some(base_url) = &self.base_url {
            out.push_str(&format!("Base URL: {base_url}\n"));
        }
        out.push_str(&format!("Endpoints: {}\n", self.endpoints.len()));
        if !self.schemas.is_empty() {
            let names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
            out.push_str(&format!("Schemas: {}\n", names.join(", ")));
        }
        if !self.security_schemes.is_empty() {
            let names: Vec<&str> = self.security_schemes.keys().map(String::as_str).collect();
            out.push_str(&format!("Security schemes: {}\n", names.join(", ")));
        }
        out.trim_end().to_string()
    }
}

fn render_endpoint(endpoint: &ParsedEndpoint) -> String {
    let mut out = format!("Endpoint: {} {}\n", endpoint.method(), endpoint.path);
    if let Some(summary) = &endpoint.summary {
        out.push_str(&format!("Summary: {summary}\n"));
    }
    if let Some(description) = &endpoint.description {
        out.push_str(&format!("Description: {description}\n"));
    }
    if let Some(operation_id) = &endpoint.operation_id {
        out.push_str(&format!("Operation ID: {operation_id}\n"));
    }
    if !endpoint.tags.is_empty() {
        out.push_str(&format!("Tags: {}\n", endpoint.tags.join(", ")));
    }
    if endpoint.deprecated {
        out.push_str("Deprecated: yes\n");
    }

    if !endpoint.parameters.is_empty() {
        out.push_str("\nParameters:\n");
        for param in &endpoint.parameters {
            out.push_str(&format!(
                "  - {} ({}, {}",
                param.name,
                param.location,
                param.param_type.as_deref().unwrap_or("any")
            ));
            if param.required {
                out.push_str(", required");
            }
            out.push(')');
            if let Some(description) = &param.description {
                out.push_str(&format!(": {description}"));
            }
            out.push('\n');
        }
    }

    if let Some(body) = &endpoint.request_body {
        out.push_str(&format!(
            "\nRequest Body ({})",
            body.content_type.as_deref().unwrap_or("unspecified")
        ));
        if body.required {
            out.push_str(" required");
        }
        out.push('\n');
        if let Some(description) = &body.description {
            out.push_str(&format!("  {description}\n"));
        }
        if let Some(ty) = body.schema.as_ref().and_then(schema_type_name) {
            out.push_str(&format!("  Schema: {ty}\n"));
        }
    }

    if !endpoint.responses.is_empty() {
        out.push_str("\nResponses:\n");
        for response in &endpoint.responses {
            out.push_str(&format!("  - {}: {}", response.status_code, response.description));
            if let Some(ty) = response.schema.as_ref().and_then(schema_type_name) {
                out.push_str(&format!(" [{ty}]"));
            }
            out.push('\n');
        }
    }

    if !endpoint.security.is_empty() {
        let schemes: Vec<String> = endpoint
            .security
            .iter()
            .map(|requirement| {
                requirement
                    .iter()
                    .map(|(scheme, scopes)| {
                        if scopes.is_empty() {
                            scheme.clone()
                        } else {
                            format!("{scheme} ({})", scopes.join(", "))
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" + ")
            })
            .collect();
        out.push_str(&format!("\nSecurity: {}\n", schemes.join(" or ")));
    }

    out.trim_end().to_string()
}

fn render_schema(name: &str, schema: &Value) -> String {
    let mut out = format!("Schema: {name}\n");
    if let Some(ty) = schema_type_name(schema) {
        out.push_str(&format!("Type: {ty}\n"));
    }
    if let Some(description) = schema.get("description").and_then(Value::as_str) {
        out.push_str(&format!("Description: {description}\n"));
    }

    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        out.push_str("\nProperties:\n");
        for (property, definition) in properties {
            let ty = schema_type_name(definition).unwrap_or_else(|| "any".to_string());
            out.push_str(&format!("  - {property}: {ty}"));
            if required.contains(&property.as_str()) {
                out.push_str(" (required)");
            }
            if let Some(description) = definition.get("description").and_then(Value::as_str) {
                out.push_str(&format!(" - {description}"));
            }
            out.push('\n');
        }
    }

    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        let values: Vec<String> = values
            .iter()
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect();
        out.push_str(&format!("Values: {}\n", values.join(", ")));
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use crate::openapi::OpenApiParser;
    use apilens_core::ToDocuments;

    const SPEC: &str = r##"
openapi: 3.0.0
info:
  title: Pet Store
  version: 1.0.0
paths:
  /pets:
    get:
      summary: List pets
      tags: [pets]
      parameters:
        - name: limit
          in: query
          schema:
            type: integer
      responses:
        '200':
          description: A list of pets
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: '#/components/schemas/Pet'
components:
  schemas:
    Pet:
      type: object
      required: [id]
      properties:
        id:
          type: integer
        status:
          type: string
          enum: [available, sold]
"##;

    #[test]
    fn test_documents() {
        let doc = OpenApiParser::new().parse(SPEC, None).unwrap();
        let docs = doc.to_documents();

        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(|d| d.get_metadata_str("source") == Some("openapi")));

        assert_eq!(docs[0].get_metadata_str("type"), Some("api_overview"));
        assert!(docs[0].content.contains("API: Pet Store"));

        assert_eq!(docs[1].get_metadata_str("type"), Some("endpoint"));
        assert_eq!(docs[1].get_metadata_str("method"), Some("GET"));
        assert!(docs[1].content.contains("  - limit (query, integer)"));
        assert!(docs[1].content.contains("  - 200: A list of pets [array[object]]"));

        assert_eq!(docs[2].get_metadata_str("name"), Some("Pet"));
        assert!(docs[2].content.contains("  - id: integer (required)"));
    }

    #[test]
    fn test_overview_layout() {
        let docs = OpenApiParser::new().parse(SPEC, None).unwrap().to_documents();
        assert_eq!(
            docs[0].content,
            "API: Pet Store\nVersion: 1.0.0\nSpecification: openapi 3.0.0\nEndpoints: 1\nSchemas: Pet"
        );
    }

    #[test]
    fn test_documents_are_deterministic() {
        let parser = OpenApiParser::new();
        assert_eq!(
            parser.parse(SPEC, None).unwrap().to_documents(),
            parser.parse(SPEC, None).unwrap().to_documents()
        );
    }
}
