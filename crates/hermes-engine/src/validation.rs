//! Document validation rules for the standard engine.
//!
//! The rule set covers what a schema of object types and scalars can check:
//! executable definitions, unique operation and fragment names, lone
//! anonymous operations, root operation types, field existence, leaf
//! selections, fragment names and type conditions, and single-field
//! subscriptions.

use crate::document::{location, Definition, Document, OperationKind};
use crate::schema::{ObjectType, Schema};
use async_graphql_parser::types::{OperationDefinition, Selection, SelectionSet};
use async_graphql_parser::{Pos, Positioned};
use async_graphql_value::Name;
use hermes_core::{GraphQLError, SourceLocation};
use std::collections::{HashMap, HashSet};

const TYPENAME: &str = "__typename";

/// Runs the document rules, then every operation rule over every operation,
/// in document order.
pub(crate) fn validate(schema: &Schema, document: &Document) -> Vec<GraphQLError> {
    let mut walker = Walker {
        schema,
        document,
        errors: Vec::new(),
        visited: HashSet::new(),
    };

    walker.document_rules();
    for op in document.operation_nodes() {
        walker.visited.clear();
        walker.operation(op.name.as_ref(), &op.definition);
    }

    walker.errors
}

struct Walker<'a> {
    schema: &'a Schema,
    document: &'a Document,
    errors: Vec<GraphQLError>,
    visited: HashSet<&'a str>,
}

impl<'a> Walker<'a> {
    fn report(&mut self, message: String, pos: Pos) {
        self.report_at(message, vec![location(pos)]);
    }

    fn report_at(&mut self, message: String, locations: Vec<SourceLocation>) {
        self.errors
            .push(GraphQLError::new(message).with_locations(locations));
    }

    fn document_rules(&mut self) {
        let document = self.document;

        for definition in document.definitions() {
            if let Definition::TypeSystem { name, location: at } = definition {
                let message = match name {
                    Some(name) => format!("The \"{name}\" definition is not executable."),
                    None => "The schema definition is not executable.".to_string(),
                };
                self.report_at(message, vec![*at]);
            }
        }

        let mut seen: HashMap<&str, Pos> = HashMap::new();
        for op in document.operation_nodes() {
            let Some(name) = &op.name else { continue };
            match seen.get(name.as_str()) {
                Some(first) => self.report_at(
                    format!("There can be only one operation named \"{name}\"."),
                    vec![location(*first), location(op.definition.pos)],
                ),
                None => {
                    seen.insert(name.as_str(), op.definition.pos);
                }
            }
        }

        if document.operation_count() > 1 {
            for op in document.operation_nodes() {
                if op.name.is_none() {
                    self.report(
                        "This anonymous operation must be the only defined operation.".to_string(),
                        op.definition.pos,
                    );
                }
            }
        }

        let mut seen: HashMap<&str, Pos> = HashMap::new();
        for fragment in document.fragment_nodes() {
            match seen.get(fragment.name.as_str()) {
                Some(first) => self.report_at(
                    format!("There can be only one fragment named \"{}\".", fragment.name),
                    vec![location(*first), location(fragment.definition.pos)],
                ),
                None => {
                    seen.insert(fragment.name.as_str(), fragment.definition.pos);
                }
            }
        }
    }

    fn operation(&mut self, name: Option<&Name>, op: &'a Positioned<OperationDefinition>) {
        let kind = OperationKind::from(op.node.ty);
        let Some(root) = self.schema.root_type(kind) else {
            self.report(format!("Schema is not configured for {kind}s."), op.pos);
            return;
        };

        if kind == OperationKind::Subscription {
            let items = &op.node.selection_set.node.items;
            if let Some(extra) = items.get(1) {
                let message = match name {
                    Some(name) => {
                        format!("Subscription \"{name}\" must select only one top level field.")
                    }
                    None => "Anonymous Subscription must select only one top level field."
                        .to_string(),
                };
                self.report(message, extra.pos);
            }
        }

        self.selection_set(root, &op.node.selection_set.node);
    }

    fn selection_set(&mut self, parent: &'a ObjectType, set: &'a SelectionSet) {
        for item in &set.items {
            match &item.node {
                Selection::Field(field) => {
                    let name = field.node.name.node.as_str();
                    let sub = &field.node.selection_set.node;

                    if name == TYPENAME {
                        if !sub.items.is_empty() {
                            self.report(
                                format!(
                                    "Field \"{name}\" must not have a selection since type \"String\" has no subfields."
                                ),
                                field.pos,
                            );
                        }
                        continue;
                    }

                    let Some(definition) = parent.get_field(name) else {
                        self.report(
                            format!(
                                "Cannot query field \"{name}\" on type \"{}\".",
                                parent.name()
                            ),
                            field.pos,
                        );
                        continue;
                    };

                    let target = definition.ty.base_name();
                    match self.schema.object_type(target) {
                        Some(_) if sub.items.is_empty() => {
                            self.report(
                                format!(
                                    "Field \"{name}\" of type \"{}\" must have a selection of subfields. Did you mean \"{name} {{ ... }}\"?",
                                    definition.ty
                                ),
                                field.pos,
                            );
                        }
                        Some(object) => self.selection_set(object, sub),
                        None if !sub.items.is_empty() => {
                            self.report(
                                format!(
                                    "Field \"{name}\" must not have a selection since type \"{}\" has no subfields.",
                                    definition.ty
                                ),
                                field.pos,
                            );
                        }
                        None => {}
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    let Some(fragment) = self.document.fragment(name) else {
                        self.report(format!("Unknown fragment \"{name}\"."), spread.pos);
                        continue;
                    };
                    if !self.visited.insert(name) {
                        continue;
                    }
                    let condition = &fragment.node.type_condition;
                    if let Some(target) =
                        self.type_condition(Some(name), parent, condition.node.on.node.as_str(), spread.pos)
                    {
                        self.selection_set(target, &fragment.node.selection_set.node);
                    }
                }
                Selection::InlineFragment(inline) => {
                    let target = match &inline.node.type_condition {
                        Some(condition) => self.type_condition(
                            None,
                            parent,
                            condition.node.on.node.as_str(),
                            condition.pos,
                        ),
                        None => Some(parent),
                    };
                    if let Some(target) = target {
                        self.selection_set(target, &inline.node.selection_set.node);
                    }
                }
            }
        }
    }

    /// Resolves a fragment's type condition against the enclosing type.
    fn type_condition(
        &mut self,
        fragment: Option<&str>,
        parent: &'a ObjectType,
        on: &str,
        pos: Pos,
    ) -> Option<&'a ObjectType> {
        let Some(target) = self.schema.object_type(on) else {
            self.report(format!("Unknown type \"{on}\"."), pos);
            return None;
        };

        if target.name() != parent.name() {
            let message = match fragment {
                Some(name) => format!(
                    "Fragment \"{name}\" cannot be spread here as objects of type \"{}\" can never be of type \"{on}\".",
                    parent.name()
                ),
                None => format!(
                    "Fragment cannot be spread here as objects of type \"{}\" can never be of type \"{on}\".",
                    parent.name()
                ),
            };
            self.report(message, pos);
            return None;
        }

        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use hermes_core::SourceLocation;

    fn run(schema: &Schema, text: &str) -> Vec<GraphQLError> {
        let document = Document::parse(text).unwrap();
        validate(schema, &document)
    }

    fn messages(errors: &[GraphQLError]) -> Vec<&str> {
        errors.iter().map(GraphQLError::message).collect()
    }

    #[test]
    fn test_valid_query() {
        assert!(run(&fixtures::query_schema(), "{ foo }").is_empty());
        assert!(run(&fixtures::query_schema(), "{ __typename foo }").is_empty());
    }

    #[test]
    fn test_unknown_field() {
        let errors = run(&fixtures::query_schema(), "{ foo bar }");
        assert_eq!(
            messages(&errors),
            ["Cannot query field \"bar\" on type \"QueryRoot\"."]
        );
        assert_eq!(errors[0].locations(), [SourceLocation::new(1, 7)]);
    }

    #[test]
    fn test_missing_subscription_root() {
        let errors = run(&fixtures::query_schema(), "subscription { foo }");
        assert_eq!(messages(&errors), ["Schema is not configured for subscriptions."]);
    }

    #[test]
    fn test_missing_mutation_root() {
        let errors = run(&fixtures::query_schema(), "mutation { foo }");
        assert_eq!(messages(&errors), ["Schema is not configured for mutations."]);
    }

    #[test]
    fn test_subscription_single_root_field() {
        let schema = fixtures::subscription_schema();
        assert!(run(&schema, "subscription { foo }").is_empty());

        let errors = run(&schema, "subscription S { foo __typename }");
        assert_eq!(
            messages(&errors),
            ["Subscription \"S\" must select only one top level field."]
        );

        let errors = run(&schema, "subscription { foo __typename }");
        assert_eq!(
            messages(&errors),
            ["Anonymous Subscription must select only one top level field."]
        );
    }

    #[test]
    fn test_leaf_and_object_selections() {
        let schema = fixtures::user_schema();

        assert!(run(&schema, "{ user { id name } }").is_empty());

        let errors = run(&schema, "{ user }");
        assert_eq!(
            messages(&errors),
            ["Field \"user\" of type \"User\" must have a selection of subfields. Did you mean \"user { ... }\"?"]
        );

        let errors = run(&schema, "{ user { id { x } } }");
        assert_eq!(
            messages(&errors),
            ["Field \"id\" must not have a selection since type \"ID!\" has no subfields."]
        );
    }

    #[test]
    fn test_fragments() {
        let schema = fixtures::user_schema();

        assert!(run(&schema, "{ user { ...U } } fragment U on User { id }").is_empty());
        assert!(run(&schema, "{ user { ... on User { name } } }").is_empty());

        let errors = run(&schema, "{ user { ...Missing } }");
        assert_eq!(messages(&errors), ["Unknown fragment \"Missing\"."]);

        let errors = run(&schema, "{ user { ...U } } fragment U on Nope { id }");
        assert_eq!(messages(&errors), ["Unknown type \"Nope\"."]);

        let errors = run(&schema, "{ ...U } fragment U on User { id }");
        assert_eq!(
            messages(&errors),
            ["Fragment \"U\" cannot be spread here as objects of type \"Query\" can never be of type \"User\"."]
        );
    }

    #[test]
    fn test_recursive_fragment_terminates() {
        let schema = fixtures::user_schema();
        let errors = run(
            &schema,
            "{ user { ...A } } fragment A on User { id ...B } fragment B on User { name ...A }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_errors_follow_document_order() {
        let errors = run(
            &fixtures::query_schema(),
            "query A { one }\nquery B { two }\nquery C { three }",
        );
        assert_eq!(
            messages(&errors),
            [
                "Cannot query field \"one\" on type \"QueryRoot\".",
                "Cannot query field \"two\" on type \"QueryRoot\".",
                "Cannot query field \"three\" on type \"QueryRoot\".",
            ]
        );
    }

    #[test]
    fn test_type_system_definition_not_executable() {
        let errors = run(&fixtures::query_schema(), "type T { a: Int }\n{ foo }");
        assert_eq!(messages(&errors), ["The \"T\" definition is not executable."]);
        assert_eq!(errors[0].locations(), [SourceLocation::new(1, 1)]);

        let errors = run(&fixtures::query_schema(), "{ foo } schema { query: QueryRoot }");
        assert_eq!(messages(&errors), ["The schema definition is not executable."]);
    }

    #[test]
    fn test_unique_operation_names() {
        let errors = run(&fixtures::query_schema(), "query Q { foo }\nquery Q { foo }");
        assert_eq!(
            messages(&errors),
            ["There can be only one operation named \"Q\"."]
        );
        assert_eq!(
            errors[0].locations(),
            [SourceLocation::new(1, 1), SourceLocation::new(2, 1)]
        );
    }

    #[test]
    fn test_lone_anonymous_operation() {
        let errors = run(&fixtures::query_schema(), "{ foo } query Q { foo }");
        assert_eq!(
            messages(&errors),
            ["This anonymous operation must be the only defined operation."]
        );
        assert_eq!(errors[0].locations(), [SourceLocation::new(1, 1)]);
    }

    #[test]
    fn test_unique_fragment_names() {
        let errors = run(
            &fixtures::query_schema(),
            "{ ...F } fragment F on QueryRoot { foo } fragment F on QueryRoot { foo }",
        );
        assert_eq!(
            messages(&errors),
            ["There can be only one fragment named \"F\"."]
        );
    }

    #[test]
    fn test_document_rules_come_first() {
        let errors = run(&fixtures::query_schema(), "query Q { bar } query Q { foo }");
        assert_eq!(
            messages(&errors),
            [
                "There can be only one operation named \"Q\".",
                "Cannot query field \"bar\" on type \"QueryRoot\".",
            ]
        );
    }
}
