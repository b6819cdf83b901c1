//! GraphQL SDL parsing.
//!
//! The parser scans schema text with a set of regex-based
//! [`DeclarationExtractor`]s rather than building a syntax tree. Comments and
//! string literals are masked first so their contents never produce
//! declarations; descriptions are then read back from the original text.
//!
//! Malformed input is not an error: regions that match no rule are skipped,
//! and text without declarations yields an empty [`GraphQLSchema`].

mod documents;
pub mod extract;
pub mod model;
mod source;

pub use extract::{
    Declaration, DeclarationExtractor, DirectiveExtractor, EnumExtractor, Located,
    ObjectTypeExtractor, OperationExtractor, RootTypes, ScalarExtractor, ScanContext,
    UnionExtractor, default_extractors,
};
pub use model::{
    GraphQLArgument, GraphQLDirective, GraphQLField, GraphQLOperation, GraphQLSchema,
    GraphQLType, GraphQLTypeKind, OperationType, TypeDefinition, decompose_type,
};

use apilens_core::config::GraphQlConfig;
use tracing::{debug, info};

/// Parses GraphQL SDL into a [`GraphQLSchema`].
///
/// The parser holds only configuration and its rule set; every call builds
/// a fresh schema.
///
/// # Examples
///
/// ```rust
/// use apilens_ingest::graphql::{GraphQLParser, GraphQLTypeKind};
///
/// let schema = GraphQLParser::new()
///     .parse("type User { id: ID! name: String } type Query { user(id: ID!): User }");
///
/// assert_eq!(schema.types.len(), 1);
/// assert_eq!(schema.types[0].kind(), GraphQLTypeKind::Object);
/// assert_eq!(schema.queries[0].return_type, "User");
/// ```
#[derive(Debug)]
pub struct GraphQLParser {
    config: GraphQlConfig,
    extractors: Vec<Box<dyn DeclarationExtractor>>,
}

impl Default for GraphQLParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphQLParser {
    /// Create a parser with the standard rules.
    pub fn new() -> Self {
        Self::with_config(GraphQlConfig::default())
    }

    /// Create a parser with custom settings.
    pub fn with_config(config: GraphQlConfig) -> Self {
        Self {
            config,
            extractors: default_extractors(),
        }
    }

    /// Add an extraction rule.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Box<dyn DeclarationExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Replace the rule set.
    #[must_use]
    pub fn with_extractors(mut self, extractors: Vec<Box<dyn DeclarationExtractor>>) -> Self {
        self.extractors = extractors;
        self
    }

    /// Parse schema text.
    pub fn parse(&self, sdl: &str) -> GraphQLSchema {
        let masked = source::mask(sdl);
        let ctx = ScanContext {
            original: sdl,
            masked: &masked,
            roots: RootTypes::from_masked(&masked),
            description_lookback: self.config.description_lookback_lines,
        };

        let mut found: Vec<Located> = self
            .extractors
            .iter()
            .flat_map(|extractor| extractor.extract(&ctx))
            .collect();
        found.sort_by_key(|located| located.offset);

        let mut schema = GraphQLSchema::default();
        for located in found {
            match located.declaration {
                Declaration::Type { ty, extension } => merge_type(&mut schema, ty, extension),
                Declaration::Operation(operation) => schema.push_operation(operation),
                Declaration::Directive(directive) => schema.directives.push(directive),
            }
        }

        info!(
            "Parsed GraphQL schema: {} types, {} queries, {} mutations, {} subscriptions",
            schema.types.len(),
            schema.queries.len(),
            schema.mutations.len(),
            schema.subscriptions.len()
        );
        schema
    }
}

fn merge_type(schema: &mut GraphQLSchema, ty: GraphQLType, extension: bool) {
    match schema.types.iter_mut().find(|t| t.name == ty.name) {
        Some(existing) if extension => {
            debug!("Merging extension of {}", ty.name);
            existing.merge_extension(ty.definition);
        }
        Some(_) => debug!("Ignoring duplicate declaration of {}", ty.name),
        None => schema.types.push(ty),
    }
}
