//! Declaration extractors.
//!
//! Each rule finds one kind of declaration in the masked SDL and reports it
//! with its byte offset; the parser merges all reports in source order.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Debug;

use super::model::{
    GraphQLArgument, GraphQLDirective, GraphQLField, GraphQLOperation, GraphQLType,
    OperationType, TypeDefinition, decompose_type,
};
use super::source::description_before;

static TYPE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(extend\s+)?(type|input|interface)\s+(\w+)([^{}]*)\{([^}]*)\}")
        .expect("type block regex")
});
static ENUM_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(extend\s+)?enum\s+(\w+)[^{}]*\{([^}]*)\}").expect("enum block regex")
});
static UNION_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(extend\s+)?union\s+(\w+)[^=\n{}]*=").expect("union head regex")
});
static SCALAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(extend\s+)?scalar\s+(\w+)").expect("scalar regex"));
static SCHEMA_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:extend\s+)?schema\b[^{}]*\{([^}]*)\}").expect("schema block regex")
});
static ROOT_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(query|mutation|subscription)\s*:\s*(\w+)").expect("root entry regex")
});
static DIRECTIVE_DEF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bdirective\s+@(\w+)\s*(?:\(([^)]*)\))?\s*(repeatable\s+)?on\s+((?:\|\s*)?[A-Z_]+(?:\s*\|\s*[A-Z_]+)*)",
    )
    .expect("directive definition regex")
});
static DIRECTIVE_USE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\w+(?:\s*\([^)]*\))?").expect("directive use regex"));
static FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\w+)\s*(?:\(([^)]*)\))?\s*:\s*([\[\]\w!]+)").expect("field regex")
});
static ARGUMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:\s*([\[\]\w!]+)").expect("argument regex"));
static DEPRECATION_REASON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@deprecated\s*\(\s*reason\s*:\s*"((?:[^"\\]|\\.)*)""#)
        .expect("deprecation reason regex")
});
static IMPLEMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bimplements\b(.*)").expect("implements regex"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_A-Za-z]\w*").expect("word regex"));

/// Names of the three root operation types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootTypes {
    /// Query root name.
    pub query: String,
    /// Mutation root name.
    pub mutation: String,
    /// Subscription root name.
    pub subscription: String,
}

impl Default for RootTypes {
    fn default() -> Self {
        Self {
            query: OperationType::Query.default_root().to_string(),
            mutation: OperationType::Mutation.default_root().to_string(),
            subscription: OperationType::Subscription.default_root().to_string(),
        }
    }
}

impl RootTypes {
    /// Read a `schema { query: X ... }` block, keeping defaults for roots it
    /// does not name.
    pub fn from_masked(masked: &str) -> Self {
        let mut roots = Self::default();
        for block in SCHEMA_BLOCK.captures_iter(masked) {
            for entry in ROOT_ENTRY.captures_iter(&block[1]) {
                let name = entry[2].to_string();
                match &entry[1] {
                    "query" => roots.query = name,
                    "mutation" => roots.mutation = name,
                    _ => roots.subscription = name,
                }
            }
        }
        roots
    }

    /// The root kind a type name stands for.
    pub fn operation_type(&self, type_name: &str) -> Option<OperationType> {
        if type_name == self.query {
            Some(OperationType::Query)
        } else if type_name == self.mutation {
            Some(OperationType::Mutation)
        } else if type_name == self.subscription {
            Some(OperationType::Subscription)
        } else {
            None
        }
    }
}

/// Input shared by every extractor for one parse call.
#[derive(Debug)]
pub struct ScanContext<'a> {
    /// SDL as given.
    pub original: &'a str,
    /// SDL with comments and strings blanked, same byte offsets.
    pub masked: &'a str,
    /// Root operation type names.
    pub roots: RootTypes,
    /// Lines searched above a declaration for its description.
    pub description_lookback: usize,
}

impl ScanContext<'_> {
    /// Description preceding a byte offset.
    pub fn description_at(&self, offset: usize) -> Option<String> {
        description_before(self.original, offset, self.description_lookback)
    }
}

/// One extracted declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// A named type, possibly an `extend` of an earlier one.
    Type {
        /// The type.
        ty: GraphQLType,
        /// Declared with `extend`.
        extension: bool,
    },
    /// A root operation field.
    Operation(GraphQLOperation),
    /// A directive definition.
    Directive(GraphQLDirective),
}

/// A declaration with its byte offset in the SDL.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    /// Byte offset of the declaration start.
    pub offset: usize,
    /// The declaration.
    pub declaration: Declaration,
}

/// One extraction rule.
pub trait DeclarationExtractor: Send + Sync + Debug {
    /// Find every declaration this rule covers.
    fn extract(&self, ctx: &ScanContext<'_>) -> Vec<Located>;
}

/// `type`, `input` and `interface` blocks other than the root types.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectTypeExtractor;

impl DeclarationExtractor for ObjectTypeExtractor {
    fn extract(&self, ctx: &ScanContext<'_>) -> Vec<Located> {
        TYPE_BLOCK
            .captures_iter(ctx.masked)
            .filter(|caps| ctx.roots.operation_type(&caps[3]).is_none())
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let body = caps.get(5)?;
                let fields = parse_fields(ctx, body.start(), body.end());

                let definition = match &caps[2] {
                    "type" => TypeDefinition::Object {
                        fields,
                        interfaces: parse_interfaces(&caps[4]),
                    },
                    "input" => TypeDefinition::InputObject { fields },
                    _ => TypeDefinition::Interface { fields },
                };

                Some(Located {
                    offset: whole.start(),
                    declaration: Declaration::Type {
                        ty: GraphQLType::new(&caps[3], definition)
                            .with_description(ctx.description_at(whole.start())),
                        extension: caps.get(1).is_some(),
                    },
                })
            })
            .collect()
    }
}

/// `enum Name { ... }` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumExtractor;

impl DeclarationExtractor for EnumExtractor {
    fn extract(&self, ctx: &ScanContext<'_>) -> Vec<Located> {
        ENUM_BLOCK
            .captures_iter(ctx.masked)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let body = blank_directives(&caps[3]);
                let values = WORD
                    .find_iter(&body)
                    .map(|m| m.as_str().to_string())
                    .collect();

                Some(Located {
                    offset: whole.start(),
                    declaration: Declaration::Type {
                        ty: GraphQLType::new(&caps[2], TypeDefinition::Enum { values })
                            .with_description(ctx.description_at(whole.start())),
                        extension: caps.get(1).is_some(),
                    },
                })
            })
            .collect()
    }
}

/// `union Name = A | B` declarations, including `|` continuation lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionExtractor;

impl DeclarationExtractor for UnionExtractor {
    fn extract(&self, ctx: &ScanContext<'_>) -> Vec<Located> {
        UNION_HEAD
            .captures_iter(ctx.masked)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let rhs = union_rhs(&ctx.masked[whole.end()..]);
                let members = blank_directives(&rhs)
                    .split('|')
                    .filter_map(|part| WORD.find(part).map(|m| m.as_str().to_string()))
                    .collect();

                Some(Located {
                    offset: whole.start(),
                    declaration: Declaration::Type {
                        ty: GraphQLType::new(&caps[2], TypeDefinition::Union { members })
                            .with_description(ctx.description_at(whole.start())),
                        extension: caps.get(1).is_some(),
                    },
                })
            })
            .collect()
    }
}

/// The first line after `=` plus following lines that start with `|`.
fn union_rhs(after_eq: &str) -> String {
    let mut lines = after_eq.split('\n');
    let mut rhs = lines.next().unwrap_or_default().to_string();
    for line in lines {
        let trimmed = line.trim_start();
        if trimmed.is_empty() && !rhs.contains(|c: char| c.is_alphanumeric()) {
            continue;
        }
        if !trimmed.starts_with('|') {
            break;
        }
        rhs.push(' ');
        rhs.push_str(trimmed);
    }
    rhs
}

/// `scalar Name` declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarExtractor;

impl DeclarationExtractor for ScalarExtractor {
    fn extract(&self, ctx: &ScanContext<'_>) -> Vec<Located> {
        SCALAR
            .captures_iter(ctx.masked)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(Located {
                    offset: whole.start(),
                    declaration: Declaration::Type {
                        ty: GraphQLType::new(&caps[2], TypeDefinition::Scalar)
                            .with_description(ctx.description_at(whole.start())),
                        extension: caps.get(1).is_some(),
                    },
                })
            })
            .collect()
    }
}

/// Fields of the root operation types, `extend type Query` included.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationExtractor;

impl DeclarationExtractor for OperationExtractor {
    fn extract(&self, ctx: &ScanContext<'_>) -> Vec<Located> {
        let mut found = Vec::new();
        for caps in TYPE_BLOCK.captures_iter(ctx.masked) {
            if &caps[2] != "type" {
                continue;
            }
            let Some(operation_type) = ctx.roots.operation_type(&caps[3]) else {
                continue;
            };
            let Some(body) = caps.get(5) else {
                continue;
            };

            found.extend(
                parse_located_fields(ctx, body.start(), body.end())
                    .into_iter()
                    .map(|(offset, field)| Located {
                        offset,
                        declaration: Declaration::Operation(GraphQLOperation::from_field(
                            field,
                            operation_type,
                        )),
                    }),
            );
        }
        found
    }
}

/// `directive @name(args) on LOCATIONS` definitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveExtractor;

impl DeclarationExtractor for DirectiveExtractor {
    fn extract(&self, ctx: &ScanContext<'_>) -> Vec<Located> {
        DIRECTIVE_DEF
            .captures_iter(ctx.masked)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let arguments = caps
                    .get(2)
                    .map(|args| parse_arguments(ctx, args.as_str(), args.start()))
                    .unwrap_or_default();
                let locations = caps[4]
                    .split('|')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();

                Some(Located {
                    offset: whole.start(),
                    declaration: Declaration::Directive(GraphQLDirective {
                        name: caps[1].to_string(),
                        description: ctx.description_at(whole.start()),
                        arguments,
                        locations,
                        repeatable: caps.get(3).is_some(),
                    }),
                })
            })
            .collect()
    }
}

/// The standard rule set, in the order types, unions, enums, scalars,
/// operations, directives.
pub fn default_extractors() -> Vec<Box<dyn DeclarationExtractor>> {
    vec![
        Box::new(ObjectTypeExtractor),
        Box::new(UnionExtractor),
        Box::new(EnumExtractor),
        Box::new(ScalarExtractor),
        Box::new(OperationExtractor),
        Box::new(DirectiveExtractor),
    ]
}

/// Replace directive applications with spaces of the same byte length.
fn blank_directives(text: &str) -> String {
    DIRECTIVE_USE
        .replace_all(text, |caps: &regex::Captures<'_>| " ".repeat(caps[0].len()))
        .into_owned()
}

fn parse_interfaces(header: &str) -> Vec<String> {
    let header = blank_directives(header);
    IMPLEMENTS
        .captures(&header)
        .map(|caps| {
            caps[1]
                .split(|c: char| c == '&' || c == ',' || c.is_whitespace())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_fields(ctx: &ScanContext<'_>, body_start: usize, body_end: usize) -> Vec<GraphQLField> {
    parse_located_fields(ctx, body_start, body_end)
        .into_iter()
        .map(|(_, field)| field)
        .collect()
}

/// Parse the fields of a block body given as a byte range of the masked SDL.
fn parse_located_fields(
    ctx: &ScanContext<'_>,
    body_start: usize,
    body_end: usize,
) -> Vec<(usize, GraphQLField)> {
    let Some(body) = ctx.masked.get(body_start..body_end) else {
        return Vec::new();
    };
    let cleaned = blank_directives(body);
    let matches: Vec<_> = FIELD.captures_iter(&cleaned).collect();

    let mut fields = Vec::with_capacity(matches.len());
    for (index, caps) in matches.iter().enumerate() {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let start = body_start + whole.start();
        let span_end = matches
            .get(index + 1)
            .and_then(|next| next.get(0))
            .map_or(body_end, |next| body_start + next.start());

        let annotation = caps[3].to_string();
        let (field_type, is_required, is_list) = decompose_type(&annotation);
        let arguments = caps
            .get(2)
            .map(|args| parse_arguments(ctx, args.as_str(), body_start + args.start()))
            .unwrap_or_default();

        let is_deprecated = ctx
            .masked
            .get(start..span_end)
            .is_some_and(|span| span.contains("@deprecated"));
        let deprecation_reason = if is_deprecated {
            ctx.original
                .get(start..span_end)
                .and_then(|span| DEPRECATION_REASON.captures(span))
                .map(|reason| reason[1].replace("\\\"", "\""))
        } else {
            None
        };

        fields.push((
            start,
            GraphQLField {
                name: caps[1].to_string(),
                field_type,
                type_annotation: annotation,
                description: ctx.description_at(start),
                arguments,
                is_required,
                is_list,
                is_deprecated,
                deprecation_reason,
            },
        ));
    }
    fields
}

/// Parse `name: Type = default` pairs. `text` is masked, `base` its offset;
/// default values are read from the original text.
fn parse_arguments(ctx: &ScanContext<'_>, text: &str, base: usize) -> Vec<GraphQLArgument> {
    let matches: Vec<_> = ARGUMENT.captures_iter(text).collect();

    matches
        .iter()
        .enumerate()
        .filter_map(|(index, caps)| {
            let whole = caps.get(0)?;
            let tail_end = matches
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |next| next.start());

            let default_value = ctx
                .original
                .get(base + whole.end()..base + tail_end)
                .and_then(|tail| tail.trim().strip_prefix('='))
                .map(|value| {
                    let value = value.split(" @").next().unwrap_or(value);
                    value.trim().trim_end_matches(',').trim().to_string()
                })
                .filter(|value| !value.is_empty());

            Some(GraphQLArgument {
                name: caps[1].to_string(),
                arg_type: caps[2].to_string(),
                default_value,
            })
        })
        .collect()
}
