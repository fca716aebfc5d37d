//! Parsed documents.
//!
//! [`Document`] keeps every top-level definition of a request in source
//! order. Documents that parse but break a document rule (a repeated
//! operation name, an anonymous operation next to others, a type-system
//! definition) are kept as written, so validation can report the rule.

use async_graphql_parser::types::{
    DocumentOperations, ExecutableDocument, FragmentDefinition, OperationDefinition, OperationType,
};
use async_graphql_parser::{Pos, Positioned};
use async_graphql_value::Name;
use hermes_core::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::outline::{self, OutlineKind};

/// The kind of an operation definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// A read-only query.
    Query,
    /// A mutation.
    Mutation,
    /// A subscription.
    Subscription,
}

impl OperationKind {
    /// Returns the keyword used in documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<OperationType> for OperationKind {
    fn from(ty: OperationType) -> Self {
        match ty {
            OperationType::Query => Self::Query,
            OperationType::Mutation => Self::Mutation,
            OperationType::Subscription => Self::Subscription,
        }
    }
}

/// Summary of one operation definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSummary {
    /// Operation name, `None` for anonymous operations.
    pub name: Option<String>,
    /// Operation kind.
    pub kind: OperationKind,
    /// Where the definition starts.
    pub location: SourceLocation,
}

/// A top-level definition in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    /// An operation definition.
    Operation(OperationSummary),
    /// A fragment definition.
    Fragment {
        /// Fragment name.
        name: String,
        /// The type the fragment applies to.
        type_condition: String,
        /// Where the definition starts.
        location: SourceLocation,
    },
    /// A type-system definition, which cannot be executed.
    TypeSystem {
        /// Name of the defined type or directive, `None` for a schema definition.
        name: Option<String>,
        /// Where the definition starts.
        location: SourceLocation,
    },
}

impl Definition {
    /// Returns where the definition starts.
    #[must_use]
    pub const fn location(&self) -> SourceLocation {
        match self {
            Self::Operation(op) => op.location,
            Self::Fragment { location, .. } | Self::TypeSystem { location, .. } => *location,
        }
    }

    /// Returns the operation summary, if this is an operation.
    #[must_use]
    pub const fn as_operation(&self) -> Option<&OperationSummary> {
        match self {
            Self::Operation(op) => Some(op),
            Self::Fragment { .. } | Self::TypeSystem { .. } => None,
        }
    }
}

pub(crate) fn location(pos: Pos) -> SourceLocation {
    SourceLocation::new(pos.line, pos.column)
}

const fn position(pos: Pos) -> (usize, usize) {
    (pos.line, pos.column)
}

#[derive(Debug, Clone)]
pub(crate) struct OperationNode {
    pub(crate) name: Option<Name>,
    pub(crate) definition: Positioned<OperationDefinition>,
}

#[derive(Debug, Clone)]
pub(crate) struct FragmentNode {
    pub(crate) name: Name,
    pub(crate) definition: Positioned<FragmentDefinition>,
}

/// A parsed document.
#[derive(Debug, Clone)]
pub struct Document {
    operations: Vec<OperationNode>,
    fragments: Vec<FragmentNode>,
    definitions: Vec<Definition>,
}

impl Document {
    /// Wraps a parser document, indexing its definitions in source order.
    #[must_use]
    pub fn new(executable: ExecutableDocument) -> Self {
        let operations = match executable.operations {
            DocumentOperations::Single(definition) => vec![OperationNode {
                name: None,
                definition,
            }],
            DocumentOperations::Multiple(ops) => ops
                .into_iter()
                .map(|(name, definition)| OperationNode {
                    name: Some(name),
                    definition,
                })
                .collect(),
        };
        let fragments = executable
            .fragments
            .into_iter()
            .map(|(name, definition)| FragmentNode { name, definition })
            .collect();

        Self::from_parts(operations, fragments, Vec::new())
    }

    /// Parses a document.
    ///
    /// Text the parser refuses only because of a document rule is split into
    /// its definitions and kept; [`validate`](crate::QueryEngine::validate)
    /// reports the rule. Anything else returns the parser's error.
    pub fn parse(text: &str) -> Result<Self, async_graphql_parser::Error> {
        match async_graphql_parser::parse_query(text) {
            Ok(executable) => Ok(Self::new(executable)),
            Err(err) => Self::parse_definitions(text).ok_or(err),
        }
    }

    /// Parses each top-level definition of `text` on its own.
    fn parse_definitions(text: &str) -> Option<Self> {
        let entries = outline::outline(text)?;
        let anchor = entries
            .iter()
            .find(|entry| entry.kind == OutlineKind::Operation)
            .map(|entry| entry.span.clone());

        let mut operations = Vec::new();
        let mut fragments = Vec::new();
        let mut type_system = Vec::new();

        for entry in entries {
            match entry.kind {
                OutlineKind::Operation => {
                    let isolated = outline::isolate(text, &[entry.span]);
                    let parsed = Self::new(async_graphql_parser::parse_query(&isolated).ok()?);
                    operations.extend(parsed.operations);
                }
                OutlineKind::Fragment => {
                    // A fragment only parses next to an operation.
                    let isolated = outline::isolate(text, &[anchor.clone()?, entry.span]);
                    let parsed = Self::new(async_graphql_parser::parse_query(&isolated).ok()?);
                    fragments.extend(parsed.fragments);
                }
                OutlineKind::TypeSystem(name) => {
                    type_system.push(Definition::TypeSystem {
                        name,
                        location: outline::location_of(text, entry.span.start),
                    });
                }
            }
        }

        Some(Self::from_parts(operations, fragments, type_system))
    }

    fn from_parts(
        mut operations: Vec<OperationNode>,
        mut fragments: Vec<FragmentNode>,
        type_system: Vec<Definition>,
    ) -> Self {
        operations.sort_by_key(|op| position(op.definition.pos));
        fragments.sort_by_key(|fragment| position(fragment.definition.pos));

        let mut definitions: Vec<Definition> = operations
            .iter()
            .map(|op| {
                Definition::Operation(OperationSummary {
                    name: op.name.as_ref().map(ToString::to_string),
                    kind: op.definition.node.ty.into(),
                    location: location(op.definition.pos),
                })
            })
            .chain(fragments.iter().map(|fragment| Definition::Fragment {
                name: fragment.name.to_string(),
                type_condition: fragment
                    .definition
                    .node
                    .type_condition
                    .node
                    .on
                    .node
                    .to_string(),
                location: location(fragment.definition.pos),
            }))
            .chain(type_system)
            .collect();
        definitions.sort_by_key(|d| {
            let loc = d.location();
            (loc.line, loc.column)
        });

        Self {
            operations,
            fragments,
            definitions,
        }
    }

    pub(crate) fn operation_nodes(&self) -> &[OperationNode] {
        &self.operations
    }

    pub(crate) fn fragment_nodes(&self) -> &[FragmentNode] {
        &self.fragments
    }

    /// Returns the first fragment definition with the given name.
    pub(crate) fn fragment(&self, name: &str) -> Option<&Positioned<FragmentDefinition>> {
        self.fragments
            .iter()
            .find(|fragment| fragment.name.as_str() == name)
            .map(|fragment| &fragment.definition)
    }

    /// Returns top-level definitions in source order.
    #[must_use]
    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    /// Returns operation definitions in source order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationSummary> {
        self.definitions.iter().filter_map(Definition::as_operation)
    }

    /// Returns the number of operation definitions.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations().count()
    }

    /// Selects an operation the way execution does: by name when given,
    /// otherwise the only operation in the document.
    #[must_use]
    pub fn select_operation(&self, name: Option<&str>) -> Option<&OperationSummary> {
        match name {
            Some(name) => self.operations().find(|op| op.name.as_deref() == Some(name)),
            None if self.operation_count() == 1 => self.operations().next(),
            None => None,
        }
    }
}
