//! # Hermes Engine
//!
//! Parsing and validation for the Hermes operation pipeline.
//!
//! This crate provides:
//!
//! - [`Schema`] - the type description documents are checked against
//! - [`Document`] - a parsed document with definitions in source order
//! - [`QueryEngine`] - the parse/validate seam the pipeline calls
//! - [`StandardEngine`] - the default engine, backed by `async-graphql-parser`
//! - [`fixtures`] - ready-made schemas for tests

#![doc(html_root_url = "https://docs.rs/hermes-engine/0.1.0")]

mod document;
mod engine;
pub mod fixtures;
mod outline;
mod schema;
mod validation;

pub use document::{Definition, Document, OperationKind, OperationSummary};
pub use engine::{QueryEngine, Source, StandardEngine, ValidationResult};
pub use schema::{
    FieldDefinition, ObjectType, Schema, SchemaBuilder, SchemaError, TypeRef, BUILTIN_SCALARS,
};
