//! GraphQL schema model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An argument of a field, operation or directive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphQLArgument {
    /// Argument name.
    pub name: String,
    /// Declared type annotation, e.g. `[ID!]!`.
    pub arg_type: String,
    /// Default value as written in the schema.
    pub default_value: Option<String>,
}

/// A field of an object, input or interface type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphQLField {
    /// Field name.
    pub name: String,
    /// Base type with list and non-null wrappers removed.
    pub field_type: String,
    /// Type annotation as declared.
    pub type_annotation: String,
    /// Description string preceding the field.
    pub description: Option<String>,
    /// Field arguments in declaration order.
    pub arguments: Vec<GraphQLArgument>,
    /// The annotation ends with `!`.
    pub is_required: bool,
    /// The annotation contains `[`.
    pub is_list: bool,
    /// The field carries `@deprecated`.
    pub is_deprecated: bool,
    /// Reason given to `@deprecated`.
    pub deprecation_reason: Option<String>,
}

/// Decompose a type annotation into `(base, required, list)`.
///
/// Only the outermost `!` counts toward `required`; inner and outer
/// nullability of lists are not distinguished.
///
/// ```rust
/// use apilens_ingest::graphql::decompose_type;
///
/// assert_eq!(decompose_type("[String!]!"), ("String".to_string(), true, true));
/// assert_eq!(decompose_type("[String]"), ("String".to_string(), false, true));
/// ```
pub fn decompose_type(annotation: &str) -> (String, bool, bool) {
    let annotation = annotation.trim();
    let base = annotation
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '!'))
        .collect::<String>();
    (
        base.trim().to_string(),
        annotation.ends_with('!'),
        annotation.contains('['),
    )
}

/// Payload of a type, one variant per kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeDefinition {
    /// `type Name implements A & B { ... }`
    Object {
        /// Fields in declaration order.
        fields: Vec<GraphQLField>,
        /// Implemented interfaces.
        interfaces: Vec<String>,
    },
    /// `input Name { ... }`
    InputObject {
        /// Input fields in declaration order.
        fields: Vec<GraphQLField>,
    },
    /// `interface Name { ... }`
    Interface {
        /// Fields in declaration order.
        fields: Vec<GraphQLField>,
    },
    /// `enum Name { A B }`
    Enum {
        /// Values in declaration order.
        values: Vec<String>,
    },
    /// `scalar Name`
    Scalar,
    /// `union Name = A | B`
    Union {
        /// Member types in declaration order.
        members: Vec<String>,
    },
}

/// Kind tag of a [`TypeDefinition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GraphQLTypeKind {
    /// Object type.
    Object,
    /// Input object type.
    InputObject,
    /// Interface type.
    Interface,
    /// Enum type.
    Enum,
    /// Scalar type.
    Scalar,
    /// Union type.
    Union,
}

impl GraphQLTypeKind {
    /// Schema-introspection style name, e.g. `INPUT_OBJECT`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "OBJECT",
            Self::InputObject => "INPUT_OBJECT",
            Self::Interface => "INTERFACE",
            Self::Enum => "ENUM",
            Self::Scalar => "SCALAR",
            Self::Union => "UNION",
        }
    }

    /// Whether types of this kind have fields.
    pub fn has_fields(self) -> bool {
        matches!(self, Self::Object | Self::InputObject | Self::Interface)
    }
}

impl fmt::Display for GraphQLTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named type declared in the schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphQLType {
    /// Type name.
    pub name: String,
    /// Description string preceding the declaration.
    pub description: Option<String>,
    /// Kind and kind-specific payload.
    #[serde(flatten)]
    pub definition: TypeDefinition,
}

impl GraphQLType {
    /// Create a type.
    pub fn new<S: Into<String>>(name: S, definition: TypeDefinition) -> Self {
        Self {
            name: name.into(),
            description: None,
            definition,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// The kind tag.
    pub fn kind(&self) -> GraphQLTypeKind {
        match self.definition {
            TypeDefinition::Object { .. } => GraphQLTypeKind::Object,
            TypeDefinition::InputObject { .. } => GraphQLTypeKind::InputObject,
            TypeDefinition::Interface { .. } => GraphQLTypeKind::Interface,
            TypeDefinition::Enum { .. } => GraphQLTypeKind::Enum,
            TypeDefinition::Scalar => GraphQLTypeKind::Scalar,
            TypeDefinition::Union { .. } => GraphQLTypeKind::Union,
        }
    }

    /// Fields of object, input and interface types; empty otherwise.
    pub fn fields(&self) -> &[GraphQLField] {
        match &self.definition {
            TypeDefinition::Object { fields, .. }
            | TypeDefinition::InputObject { fields }
            | TypeDefinition::Interface { fields } => fields,
            _ => &[],
        }
    }

    /// Values of enum types; empty otherwise.
    pub fn enum_values(&self) -> &[String] {
        match &self.definition {
            TypeDefinition::Enum { values } => values,
            _ => &[],
        }
    }

    /// Members of union types; empty otherwise.
    pub fn union_types(&self) -> &[String] {
        match &self.definition {
            TypeDefinition::Union { members } => members,
            _ => &[],
        }
    }

    /// Interfaces implemented by object types; empty otherwise.
    pub fn interfaces(&self) -> &[String] {
        match &self.definition {
            TypeDefinition::Object { interfaces, .. } => interfaces,
            _ => &[],
        }
    }

    /// Fold an `extend` declaration of the same kind into this type.
    pub(crate) fn merge_extension(&mut self, extension: TypeDefinition) {
        match (&mut self.definition, extension) {
            (
                TypeDefinition::Object { fields, interfaces },
                TypeDefinition::Object {
                    fields: more_fields,
                    interfaces: more_interfaces,
                },
            ) => {
                fields.extend(more_fields);
                for interface in more_interfaces {
                    if !interfaces.contains(&interface) {
                        interfaces.push(interface);
                    }
                }
            }
            (
                TypeDefinition::InputObject { fields } | TypeDefinition::Interface { fields },
                TypeDefinition::InputObject { fields: more } | TypeDefinition::Interface { fields: more },
            ) => fields.extend(more),
            (TypeDefinition::Enum { values }, TypeDefinition::Enum { values: more }) => {
                values.extend(more);
            }
            (TypeDefinition::Union { members }, TypeDefinition::Union { members: more }) => {
                members.extend(more);
            }
            _ => {}
        }
    }
}

/// Root operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Field of the query root.
    Query,
    /// Field of the mutation root.
    Mutation,
    /// Field of the subscription root.
    Subscription,
}

impl OperationType {
    /// All root operation types.
    pub const ALL: [OperationType; 3] = [Self::Query, Self::Mutation, Self::Subscription];

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }

    /// Conventional root type name.
    pub fn default_root(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
            Self::Subscription => "Subscription",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field of a root operation type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphQLOperation {
    /// Field name.
    pub name: String,
    /// Which root the field belongs to.
    pub operation_type: OperationType,
    /// Declared return type annotation.
    pub return_type: String,
    /// Arguments in declaration order.
    pub arguments: Vec<GraphQLArgument>,
    /// Description string preceding the field.
    pub description: Option<String>,
    /// The field carries `@deprecated`.
    pub is_deprecated: bool,
    /// Reason given to `@deprecated`.
    pub deprecation_reason: Option<String>,
}

impl GraphQLOperation {
    /// Build an operation from a parsed root field.
    pub fn from_field(field: GraphQLField, operation_type: OperationType) -> Self {
        Self {
            name: field.name,
            operation_type,
            return_type: field.type_annotation,
            arguments: field.arguments,
            description: field.description,
            is_deprecated: field.is_deprecated,
            deprecation_reason: field.deprecation_reason,
        }
    }
}

/// A `directive @name(...) on LOCATIONS` definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphQLDirective {
    /// Directive name without `@`.
    pub name: String,
    /// Description string preceding the definition.
    pub description: Option<String>,
    /// Arguments in declaration order.
    pub arguments: Vec<GraphQLArgument>,
    /// Allowed locations, e.g. `FIELD_DEFINITION`.
    pub locations: Vec<String>,
    /// Declared `repeatable`.
    pub repeatable: bool,
}

/// Everything extracted from one SDL document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphQLSchema {
    /// Named types in declaration order, root operation types excluded.
    pub types: Vec<GraphQLType>,
    /// Query root fields.
    pub queries: Vec<GraphQLOperation>,
    /// Mutation root fields.
    pub mutations: Vec<GraphQLOperation>,
    /// Subscription root fields.
    pub subscriptions: Vec<GraphQLOperation>,
    /// Directive definitions.
    pub directives: Vec<GraphQLDirective>,
}

impl GraphQLSchema {
    /// Look up a type by name.
    pub fn get_type(&self, name: &str) -> Option<&GraphQLType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Types of one kind.
    pub fn types_of_kind(&self, kind: GraphQLTypeKind) -> impl Iterator<Item = &GraphQLType> {
        self.types.iter().filter(move |t| t.kind() == kind)
    }

    /// Operations of one root type.
    pub fn operations(&self, operation_type: OperationType) -> &[GraphQLOperation] {
        match operation_type {
            OperationType::Query => &self.queries,
            OperationType::Mutation => &self.mutations,
            OperationType::Subscription => &self.subscriptions,
        }
    }

    /// No types, operations or directives were found.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.queries.is_empty()
            && self.mutations.is_empty()
            && self.subscriptions.is_empty()
            && self.directives.is_empty()
    }

    pub(crate) fn push_operation(&mut self, operation: GraphQLOperation) {
        match operation.operation_type {
            OperationType::Query => self.queries.push(operation),
            OperationType::Mutation => self.mutations.push(operation),
            OperationType::Subscription => self.subscriptions.push(operation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("String", "String", false, false ; "named")]
    #[test_case("String!", "String", true, false ; "non null")]
    #[test_case("[String]", "String", false, true ; "list")]
    #[test_case("[String!]!", "String", true, true ; "non null list of non null")]
    #[test_case("[String!]", "String", false, true ; "list of non null")]
    fn test_decompose_type(annotation: &str, base: &str, required: bool, list: bool) {
        assert_eq!(decompose_type(annotation), (base.to_string(), required, list));
    }

    #[test]
    fn test_kind_determines_payload() {
        let ty = GraphQLType::new(
            "Color",
            TypeDefinition::Enum {
                values: vec!["RED".into()],
            },
        );
        assert_eq!(ty.kind(), GraphQLTypeKind::Enum);
        assert_eq!(ty.enum_values(), ["RED".to_string()]);
        assert!(ty.fields().is_empty());
        assert!(ty.union_types().is_empty());
    }

    #[test]
    fn test_type_serializes_with_kind_tag() {
        let ty = GraphQLType::new(
            "SearchResult",
            TypeDefinition::Union {
                members: vec!["User".into(), "Post".into()],
            },
        );
        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(json["kind"], "UNION");
        assert_eq!(json["members"][1], "Post");
    }
}
