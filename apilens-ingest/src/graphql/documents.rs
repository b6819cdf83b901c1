use apilens_core::{ToDocuments, VectorDocument, types::SOURCE_KEY};

use super::model::{
    GraphQLArgument, GraphQLDirective, GraphQLField, GraphQLOperation, GraphQLSchema,
    GraphQLType, OperationType,
};

const SOURCE: &str = "graphql";

impl ToDocuments for GraphQLSchema {
    /// Type documents, then one document per field of every object-like
    /// type, then query, mutation and subscription documents, then
    /// directive documents.
    fn to_documents(&self) -> Vec<VectorDocument> {
        let mut documents = Vec::new();

        for ty in &self.types {
            documents.push(
                VectorDocument::builder()
                    .content(render_type(ty))
                    .metadata(SOURCE_KEY, SOURCE)
                    .metadata("type", "type_definition")
                    .metadata("name", ty.name.as_str())
                    .metadata("kind", ty.kind().as_str())
                    .build(),
            );
        }

        for ty in self.types.iter().filter(|t| t.kind().has_fields()) {
            for field in ty.fields() {
                documents.push(
                    VectorDocument::builder()
                        .content(render_field(ty, field))
                        .metadata(SOURCE_KEY, SOURCE)
                        .metadata("type", "field")
                        .metadata("parent_type", ty.name.as_str())
                        .metadata("field_name", field.name.as_str())
                        .metadata("field_type", field.field_type.as_str())
                        .build(),
                );
            }
        }

        for operation in self
            .queries
            .iter()
            .chain(&self.mutations)
            .chain(&self.subscriptions)
        {
            documents.push(
                VectorDocument::builder()
                    .content(render_operation(operation))
                    .metadata(SOURCE_KEY, SOURCE)
                    .metadata("type", operation.operation_type.as_str())
                    .metadata("name", operation.name.as_str())
                    .metadata("return_type", operation.return_type.as_str())
                    .build(),
            );
        }

        for directive in &self.directives {
            documents.push(
                VectorDocument::builder()
                    .content(render_directive(directive))
                    .metadata(SOURCE_KEY, SOURCE)
                    .metadata("type", "directive")
                    .metadata("name", directive.name.as_str())
                    .build(),
            );
        }

        documents
    }
}

fn render_arguments(arguments: &[GraphQLArgument]) -> String {
    arguments
        .iter()
        .map(|arg| match &arg.default_value {
            Some(default) => format!("{}: {} = {default}", arg.name, arg.arg_type),
            None => format!("{}: {}", arg.name, arg.arg_type),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn field_signature(field: &GraphQLField) -> String {
    if field.arguments.is_empty() {
        format!("{}: {}", field.name, field.type_annotation)
    } else {
        format!(
            "{}({}): {}",
            field.name,
            render_arguments(&field.arguments),
            field.type_annotation
        )
    }
}

fn render_type(ty: &GraphQLType) -> String {
    let mut out = format!("GraphQL Type: {}\nKind: {}\n", ty.name, ty.kind());
    if let Some(description) = &ty.description {
        out.push_str(&format!("Description: {description}\n"));
    }
    if !ty.interfaces().is_empty() {
        out.push_str(&format!("Implements: {}\n", ty.interfaces().join(", ")));
    }

    if !ty.fields().is_empty() {
        out.push_str("\nFields:\n");
        for field in ty.fields() {
            out.push_str(&format!("  - {}", field_signature(field)));
            if let Some(description) = &field.description {
                out.push_str(&format!(" - {description}"));
            }
            if field.is_deprecated {
                match &field.deprecation_reason {
                    Some(reason) => {
                        out.push_str(&format!(" [DEPRECATED: {reason}]"));
                    }
                    None => out.push_str(" [DEPRECATED]"),
                }
            }
            out.push('\n');
        }
    }

    if !ty.enum_values().is_empty() {
        out.push_str(&format!("\nValues: {}\n", ty.enum_values().join(", ")));
    }
    if !ty.union_types().is_empty() {
        out.push_str(&format!("\nPossible types: {}\n", ty.union_types().join(" | ")));
    }

    out.trim_end().to_string()
}

fn render_field(parent: &GraphQLType, field: &GraphQLField) -> String {
    let mut out = format!(
        "Field: {}.{}\nType: {}\nRequired: {}\nList: {}\n",
        parent.name,
        field.name,
        field.type_annotation,
        if field.is_required { "yes" } else { "no" },
        if field.is_list { "yes" } else { "no" },
    );
    if let Some(description) = &field.description {
        out.push_str(&format!("Description: {description}\n"));
    }
    if !field.arguments.is_empty() {
        out.push_str(&format!("Arguments: {}\n", render_arguments(&field.arguments)));
    }
    if field.is_deprecated {
        out.push_str(&format!(
            "Deprecated: {}\n",
            field.deprecation_reason.as_deref().unwrap_or("yes")
        ));
    }
    out.trim_end().to_string()
}

fn render_operation(operation: &GraphQLOperation) -> String {
    let label = match operation.operation_type {
        OperationType::Query => "Query",
        OperationType::Mutation => "Mutation",
        OperationType::Subscription => "Subscription",
    };
    let mut out = format!(
        "GraphQL {label}: {}\nReturns: {}\n",
        operation.name, operation.return_type
    );
    if let Some(description) = &operation.description {
        out.push_str(&format!("Description: {description}\n"));
    }
    if !operation.arguments.is_empty() {
        out.push_str("Arguments:\n");
        for arg in &operation.arguments {
            out.push_str(&format!("  - {}: {}", arg.name, arg.arg_type));
            if let Some(default) = &arg.default_value {
                out.push_str(&format!(" = {default}"));
            }
            out.push('\n');
        }
    }
    if operation.is_deprecated {
        out.push_str(&format!(
            "Deprecated: {}\n",
            operation.deprecation_reason.as_deref().unwrap_or("yes")
        ));
    }
    out.trim_end().to_string()
}

fn render_directive(directive: &GraphQLDirective) -> String {
    let mut out = format!("GraphQL Directive: @{}\n", directive.name);
    if let Some(description) = &directive.description {
        out.push_str(&format!("Description: {description}\n"));
    }
    if !directive.arguments.is_empty() {
        out.push_str(&format!("Arguments: {}\n", render_arguments(&directive.arguments)));
    }
    out.push_str(&format!("Locations: {}\n", directive.locations.join(" | ")));
    if directive.repeatable {
        out.push_str("Repeatable: yes\n");
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use crate::graphql::GraphQLParser;
    use apilens_core::ToDocuments;

    #[test]
    fn test_scenario_a_documents() {
        let schema = GraphQLParser::new()
            .parse("type User { id: ID! name: String } type Query { user(id: ID!): User }");
        let docs = schema.to_documents();

        assert_eq!(docs.len(), 4);
        assert!(docs.iter().all(|d| d.get_metadata_str("source") == Some("graphql")));
        assert!(docs.iter().all(|d| !d.content.is_empty()));

        assert_eq!(docs[0].get_metadata_str("type"), Some("type_definition"));
        assert_eq!(docs[0].get_metadata_str("kind"), Some("OBJECT"));
        assert_eq!(docs[1].get_metadata_str("parent_type"), Some("User"));
        assert_eq!(docs[1].get_metadata_str("field_type"), Some("ID"));
        assert_eq!(docs[3].get_metadata_str("type"), Some("query"));
        assert_eq!(docs[3].get_metadata_str("return_type"), Some("User"));
        assert!(docs[3].content.contains("  - id: ID!"));
    }

    #[test]
    fn test_documents_are_deterministic() {
        let sdl = "enum E { A B }\nunion U = X | Y\ntype X { a(b: Int = 1): [E!] }\ntype Y { c: U }";
        let parser = GraphQLParser::new();
        assert_eq!(
            parser.parse(sdl).to_documents(),
            parser.parse(sdl).to_documents()
        );
    }

    #[test]
    fn test_operation_layout() {
        let docs = GraphQLParser::new()
            .parse("type Query { search(term: String!, limit: Int = 10): Result }")
            .to_documents();
        let search = docs
            .iter()
            .find(|d| d.get_metadata_str("type") == Some("query"))
            .unwrap();

        assert_eq!(
            search.content,
            "GraphQL Query: search\nReturns: Result\nArguments:\n  - term: String!\n  - limit: Int = 10"
        );
    }

    #[test]
    fn test_type_rendering() {
        let schema = GraphQLParser::new().parse(
            "type T { old: Int @deprecated(reason: \"gone\") }\nunion U = T | T2",
        );
        let docs = schema.to_documents();
        assert!(docs[0].content.contains("old: Int [DEPRECATED: gone]"));
        assert!(docs[1].content.contains("Possible types: T | T2"));
    }
}
