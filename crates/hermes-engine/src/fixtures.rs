//! Schema fixtures for Hermes development and testing.
//!
//! # Example
//!
//! ```
//! use hermes_engine::fixtures;
//!
//! let schema = fixtures::subscription_schema();
//! assert_eq!(schema.query_type().name(), "QueryRoot");
//! assert!(schema.subscription_type().is_some());
//! ```

use crate::schema::{ObjectType, Schema, TypeRef};

fn root(name: &str) -> ObjectType {
    ObjectType::new(name).field("foo", TypeRef::named("Int"))
}

/// A schema with only a query root, `QueryRoot { foo: Int }`.
#[must_use]
pub fn query_schema() -> Schema {
    Schema::builder()
        .query(root("QueryRoot"))
        .build()
        .expect("fixture schema is well formed")
}

/// A schema with `QueryRoot { foo: Int }` and `SubscriptionRoot { foo: Int }`.
#[must_use]
pub fn subscription_schema() -> Schema {
    Schema::builder()
        .query(root("QueryRoot"))
        .subscription(root("SubscriptionRoot"))
        .build()
        .expect("fixture schema is well formed")
}

/// A schema with a nested object type.
///
/// ```text
/// type Query { user: User }
/// type User { id: ID!, name: String }
/// ```
#[must_use]
pub fn user_schema() -> Schema {
    Schema::builder()
        .query(ObjectType::new("Query").field("user", TypeRef::named("User")))
        .object(
            ObjectType::new("User")
                .field("id", TypeRef::non_null(TypeRef::named("ID")))
                .field("name", TypeRef::named("String")),
        )
        .build()
        .expect("fixture schema is well formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_build() {
        assert!(query_schema().subscription_type().is_none());
        assert_eq!(
            subscription_schema().subscription_type().unwrap().name(),
            "SubscriptionRoot"
        );
        assert!(user_schema().object_type("User").is_some());
    }
}
