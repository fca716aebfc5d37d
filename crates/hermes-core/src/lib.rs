//! # Hermes Core
//!
//! Core types shared by every Hermes crate.
//!
//! This crate provides the foundational types used throughout Hermes:
//!
//! - [`FormattedError`] - The wire-level error unit of a GraphQL response
//! - [`Failure`] / [`normalize`] - Failure shapes and their normalization
//! - [`GraphQLError`] - The canonical located error produced by the engine
//! - [`RequestContext`] - Immutable context carrier threaded through extensions
//! - [`OperationId`] - UUID v7 operation identifier

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;

pub use context::{OperationId, RequestContext};
pub use error::{
    normalize, BoxError, ExtendedError, Failure, FormattedError, GraphQLError, MessageError,
    PathSegment, SourceLocation,
};
