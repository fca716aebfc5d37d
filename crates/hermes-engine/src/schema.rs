//! Schema handle consumed by the engine.
//!
//! Hermes does not construct type systems; a [`Schema`] here is the minimal
//! description the standard engine needs to check documents: root operation
//! types and the fields of each object type.
//!
//! # Example
//!
//! ```
//! use hermes_engine::{ObjectType, Schema, TypeRef};
//!
//! let schema = Schema::builder()
//!     .query(ObjectType::new("QueryRoot").field("foo", TypeRef::named("Int")))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.query_type().name(), "QueryRoot");
//! assert!(schema.subscription_type().is_none());
//! ```

use crate::document::OperationKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Scalar types every schema knows about.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Errors raised while building a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No query root type was provided.
    #[error("schema must define a query root type")]
    MissingQueryRoot,

    /// Two object types share a name.
    #[error("type \"{0}\" is defined more than once")]
    DuplicateType(String),

    /// A field refers to a type the schema does not define.
    #[error("field \"{type_name}.{field}\" refers to unknown type \"{target}\"")]
    UnknownFieldType {
        /// The object type declaring the field.
        type_name: String,
        /// The field name.
        field: String,
        /// The unknown type name.
        target: String,
    },
}

/// A reference to a type from a field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum TypeRef {
    /// A named type.
    Named(String),
    /// A list of the inner type.
    List(Box<TypeRef>),
    /// A non-null wrapper around the inner type.
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    /// Creates a named type reference.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Wraps a type reference in a list.
    #[must_use]
    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    /// Wraps a type reference in non-null.
    #[must_use]
    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// Returns the innermost named type.
    #[must_use]
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.base_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// A field on an object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name.
    pub name: String,
    /// Field type.
    pub ty: TypeRef,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An object type and its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    name: String,
    fields: IndexMap<String, FieldDefinition>,
}

impl ObjectType {
    /// Creates an object type with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        self.fields.insert(
            name.clone(),
            FieldDefinition {
                name,
                ty,
                description: None,
            },
        );
        self
    }

    /// Adds a field with a description.
    #[must_use]
    pub fn described_field(
        mut self,
        name: impl Into<String>,
        ty: TypeRef,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.fields.insert(
            name.clone(),
            FieldDefinition {
                name,
                ty,
                description: Some(description.into()),
            },
        );
        self
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// Returns all fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }
}

/// A built, immutable schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    query: String,
    mutation: Option<String>,
    subscription: Option<String>,
    types: IndexMap<String, ObjectType>,
    scalars: Vec<String>,
}

impl Schema {
    /// Creates a new schema builder.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Returns the query root type.
    #[must_use]
    pub fn query_type(&self) -> &ObjectType {
        // The builder guarantees the query root is registered.
        &self.types[self.query.as_str()]
    }

    /// Returns the mutation root type, if configured.
    #[must_use]
    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.mutation.as_deref().and_then(|name| self.types.get(name))
    }

    /// Returns the subscription root type, if configured.
    #[must_use]
    pub fn subscription_type(&self) -> Option<&ObjectType> {
        self.subscription
            .as_deref()
            .and_then(|name| self.types.get(name))
    }

    /// Returns the root type for an operation kind.
    #[must_use]
    pub fn root_type(&self, kind: OperationKind) -> Option<&ObjectType> {
        match kind {
            OperationKind::Query => Some(self.query_type()),
            OperationKind::Mutation => self.mutation_type(),
            OperationKind::Subscription => self.subscription_type(),
        }
    }

    /// Looks up an object type by name.
    #[must_use]
    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    /// Returns true if `name` is a leaf (scalar) type.
    #[must_use]
    pub fn is_scalar(&self, name: &str) -> bool {
        BUILTIN_SCALARS.contains(&name) || self.scalars.iter().any(|s| s == name)
    }

    /// Returns true if the schema knows a type with this name.
    #[must_use]
    pub fn has_type(&self, name: &str) -> bool {
        self.is_scalar(name) || self.types.contains_key(name)
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    query: Option<ObjectType>,
    mutation: Option<ObjectType>,
    subscription: Option<ObjectType>,
    types: Vec<ObjectType>,
    scalars: Vec<String>,
}

impl SchemaBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query root type.
    #[must_use]
    pub fn query(mut self, root: ObjectType) -> Self {
        self.query = Some(root);
        self
    }

    /// Sets the mutation root type.
    #[must_use]
    pub fn mutation(mut self, root: ObjectType) -> Self {
        self.mutation = Some(root);
        self
    }

    /// Sets the subscription root type.
    #[must_use]
    pub fn subscription(mut self, root: ObjectType) -> Self {
        self.subscription = Some(root);
        self
    }

    /// Registers an additional object type.
    #[must_use]
    pub fn object(mut self, ty: ObjectType) -> Self {
        self.types.push(ty);
        self
    }

    /// Registers a custom scalar.
    #[must_use]
    pub fn scalar(mut self, name: impl Into<String>) -> Self {
        self.scalars.push(name.into());
        self
    }

    /// Builds the schema, checking that every field type is known.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let query = self.query.ok_or(SchemaError::MissingQueryRoot)?;
        let query_name = query.name.clone();
        let mutation_name = self.mutation.as_ref().map(|t| t.name.clone());
        let subscription_name = self.subscription.as_ref().map(|t| t.name.clone());

        let mut types = IndexMap::new();
        let all = std::iter::once(query)
            .chain(self.mutation)
            .chain(self.subscription)
            .chain(self.types);
        for ty in all {
            if types.contains_key(&ty.name) {
                return Err(SchemaError::DuplicateType(ty.name));
            }
            types.insert(ty.name.clone(), ty);
        }

        let schema = Schema {
            query: query_name,
            mutation: mutation_name,
            subscription: subscription_name,
            types,
            scalars: self.scalars,
        };

        for ty in schema.types.values() {
            for field in ty.fields() {
                let target = field.ty.base_name();
                if !schema.has_type(target) {
                    return Err(SchemaError::UnknownFieldType {
                        type_name: ty.name.clone(),
                        field: field.name.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }

        Ok(schema)
    }
}
