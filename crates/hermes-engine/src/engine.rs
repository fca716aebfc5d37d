//! The query engine seam.
//!
//! The pipeline never parses or validates by itself; it calls a
//! [`QueryEngine`]. [`StandardEngine`] is the implementation backed by
//! `async-graphql-parser` and the rules in this crate.

use crate::document::{location, Document};
use crate::schema::Schema;
use crate::validation;
use hermes_core::{normalize, FormattedError, GraphQLError};

/// Request text plus the name used in syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source<'a> {
    /// The document text.
    pub body: &'a str,
    /// Name of the source, e.g. `"GraphQL request"`.
    pub name: &'a str,
}

impl<'a> Source<'a> {
    /// Creates a new source.
    #[must_use]
    pub const fn new(body: &'a str, name: &'a str) -> Self {
        Self { body, name }
    }
}

/// The outcome of validating a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// Whether the document passed every rule.
    pub is_valid: bool,
    /// Errors in the order the rules reported them.
    pub errors: Vec<FormattedError>,
}

impl ValidationResult {
    /// Builds a result from a list of errors; valid when the list is empty.
    #[must_use]
    pub fn from_errors(errors: Vec<FormattedError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// A result with no errors.
    #[must_use]
    pub fn valid() -> Self {
        Self::from_errors(Vec::new())
    }
}

/// Parses and validates GraphQL documents.
///
/// Implementations must be shareable across threads; one engine serves every
/// operation of a pipeline.
pub trait QueryEngine: Send + Sync {
    /// Parses request text into a document.
    fn parse(&self, source: &Source<'_>) -> Result<Document, GraphQLError>;

    /// Validates a document against a schema.
    fn validate(&self, schema: &Schema, document: &Document) -> ValidationResult;
}

/// The default engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEngine;

impl StandardEngine {
    /// Creates the engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl QueryEngine for StandardEngine {
    fn parse(&self, source: &Source<'_>) -> Result<Document, GraphQLError> {
        Document::parse(source.body).map_err(|err| {
            let locations: Vec<_> = err.positions().map(location).collect();
            let detail = syntax_detail(&err.to_string());
            let message = match locations.first() {
                Some(at) => format!("Syntax Error {} ({at}) {detail}", source.name),
                None => format!("Syntax Error {} {detail}", source.name),
            };
            GraphQLError::new(message).with_locations(locations)
        })
    }

    fn validate(&self, schema: &Schema, document: &Document) -> ValidationResult {
        let errors = validation::validate(schema, document)
            .into_iter()
            .map(normalize)
            .collect();
        ValidationResult::from_errors(errors)
    }
}

/// Reduces a grammar error report to its `= expected ...` line.
fn syntax_detail(report: &str) -> String {
    report
        .lines()
        .rev()
        .find_map(|line| line.trim_start().strip_prefix("= "))
        .unwrap_or(report)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use hermes_core::SourceLocation;

    const NAME: &str = "GraphQL request";

    #[test]
    fn test_parse_success() {
        let document = StandardEngine
            .parse(&Source::new("query Q { foo }", NAME))
            .unwrap();
        assert_eq!(document.operation_count(), 1);
    }

    #[test]
    fn test_syntax_error_is_located() {
        let err = StandardEngine
            .parse(&Source::new("query {", NAME))
            .unwrap_err();

        assert!(err.message().starts_with("Syntax Error GraphQL request ("));
        assert!(!err.locations().is_empty());
        assert_eq!(err.locations()[0].line, 1);
    }

    #[test]
    fn test_syntax_error_is_one_line() {
        let err = StandardEngine
            .parse(&Source::new("query { foo", NAME))
            .unwrap_err();
        assert!(!err.message().contains('\n'));
        assert_eq!(syntax_detail("  |\n  = expected name\n"), "expected name");
        assert_eq!(syntax_detail("unexpected end"), "unexpected end");
    }

    #[test]
    fn test_rule_violations_parse() {
        for text in [
            "{ foo } query Q { foo }",
            "query Q { foo } query Q { foo }",
            "type T { a: Int } { foo }",
        ] {
            let document = StandardEngine.parse(&Source::new(text, NAME)).unwrap();
            let result = StandardEngine.validate(&fixtures::query_schema(), &document);
            assert!(!result.is_valid, "{text}");
        }
    }

    #[test]
    fn test_source_name_in_message() {
        let err = StandardEngine
            .parse(&Source::new("{", "inline.graphql"))
            .unwrap_err();
        assert!(err.message().contains("inline.graphql"));
    }

    #[test]
    fn test_validate_valid_document() {
        let schema = fixtures::query_schema();
        let document = StandardEngine.parse(&Source::new("{ foo }", NAME)).unwrap();

        let result = StandardEngine.validate(&schema, &document);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_validate_reports_formatted_errors() {
        let schema = fixtures::query_schema();
        let document = StandardEngine
            .parse(&Source::new("{ bar }", NAME))
            .unwrap();

        let result = StandardEngine.validate(&schema, &document);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].locations, vec![SourceLocation::new(1, 3)]);
    }

    #[test]
    fn test_engine_is_object_safe() {
        let engine: Box<dyn QueryEngine> = Box::new(StandardEngine::new());
        assert!(engine.parse(&Source::new("{ foo }", NAME)).is_ok());
    }
}
