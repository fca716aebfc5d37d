//! Canonical error shapes for Hermes.
//!
//! Every failure that leaves the operation pipeline is expressed as a
//! [`FormattedError`], the wire-level error unit of a GraphQL response:
//!
//! ```json
//! {
//!   "message": "Cannot query field \"bar\" on type \"QueryRoot\".",
//!   "locations": [{ "line": 1, "column": 9 }],
//!   "path": ["bar"],
//!   "extensions": { "code": "GRAPHQL_VALIDATION_FAILED" }
//! }
//! ```
//!
//! Failures enter the system in several shapes (already formatted errors,
//! located engine errors, errors that carry structured extensions, plain
//! errors). The [`Failure`] enum names those shapes and [`normalize`] turns
//! any of them into a [`FormattedError`].
//!
//! # Example
//!
//! ```
//! use hermes_core::{normalize, Failure, GraphQLError, SourceLocation};
//!
//! let located = GraphQLError::new("Unknown field")
//!     .with_locations(vec![SourceLocation::new(1, 9)]);
//!
//! let once = normalize(located);
//! let twice = normalize(once.clone());
//!
//! assert_eq!(once, twice);
//! assert_eq!(twice.locations, vec![SourceLocation::new(1, 9)]);
//!
//! let plain = normalize(Failure::message("boom"));
//! assert_eq!(plain.message, "boom");
//! assert!(plain.locations.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Shared, type-erased error used as an underlying cause.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// A position in the request text (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number, starting at 1.
    pub column: usize,
}

impl SourceLocation {
    /// Creates a new source location.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One segment of a response path: a field name or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field (or alias) name.
    Field(String),
    /// A list index.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// An error that carries structured metadata for the response `extensions`.
///
/// Implementing this trait is how a cause declares itself "extended". When
/// such a cause is normalized it is wrapped into a [`GraphQLError`] so the
/// locations and extensions survive formatting.
pub trait ExtendedError: std::error::Error + Send + Sync {
    /// Returns the extension entries to attach to the formatted error.
    fn extensions(&self) -> Map<String, Value>;
}

/// A plain message used as an error cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MessageError(pub String);

/// The canonical rich error produced by the query engine.
///
/// Unlike a plain error it knows where in the request text it happened and,
/// optionally, at which response path.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    message: String,
    locations: Vec<SourceLocation>,
    path: Vec<PathSegment>,
    extensions: Option<Map<String, Value>>,
    cause: Option<Cause>,
}

/// The original error wrapped by a [`GraphQLError`].
#[derive(Debug, Clone)]
enum Cause {
    Extended(Arc<dyn ExtendedError>),
    Other(BoxError),
}

impl GraphQLError {
    /// Creates a new error with a message and no locations.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: None,
            cause: None,
        }
    }

    /// Sets the source locations.
    #[must_use]
    pub fn with_locations(mut self, locations: Vec<SourceLocation>) -> Self {
        self.locations = locations;
        self
    }

    /// Sets the response path.
    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Sets the extension entries.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Map<String, Value>) -> Self {
        self.extensions = Some(extensions);
        self
    }

    /// Attaches the underlying error.
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Cause::Other(Arc::new(source)));
        self
    }

    /// Wraps an extended cause, keeping the given locations.
    #[must_use]
    pub fn wrap_extended(cause: Arc<dyn ExtendedError>, locations: Vec<SourceLocation>) -> Self {
        let extensions = cause.extensions();
        Self {
            message: cause.to_string(),
            locations,
            path: Vec::new(),
            extensions: (!extensions.is_empty()).then_some(extensions),
            cause: Some(Cause::Extended(cause)),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the source locations.
    #[must_use]
    pub fn locations(&self) -> &[SourceLocation] {
        &self.locations
    }

    /// Returns the response path.
    #[must_use]
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Returns the extended cause, if this error wraps one.
    #[must_use]
    pub fn extended_cause(&self) -> Option<&Arc<dyn ExtendedError>> {
        match &self.cause {
            Some(Cause::Extended(cause)) => Some(cause),
            _ => None,
        }
    }

    /// Formats this error, keeping it as the original cause.
    #[must_use]
    pub fn format(self) -> FormattedError {
        FormattedError {
            message: self.message.clone(),
            locations: self.locations.clone(),
            path: (!self.path.is_empty()).then(|| self.path.clone()),
            extensions: self.extensions.clone(),
            original: Some(Box::new(Failure::Located(self))),
        }
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GraphQLError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.cause {
            Some(Cause::Other(cause)) => Some(cause.as_ref()),
            _ => None,
        }
    }
}

/// Any failure value that can be normalized into a [`FormattedError`].
#[derive(Debug, Clone)]
pub enum Failure {
    /// An error that was already formatted.
    Formatted(FormattedError),
    /// The canonical rich engine error.
    Located(GraphQLError),
    /// A cause carrying structured extensions.
    Extended(Arc<dyn ExtendedError>),
    /// Any other error; formatted as message only.
    Other(BoxError),
}

impl Failure {
    /// Creates a failure from a plain message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Other(Arc::new(MessageError(message.into())))
    }

    /// Creates a failure from an extended error.
    #[must_use]
    pub fn extended<E: ExtendedError + 'static>(error: E) -> Self {
        Self::Extended(Arc::new(error))
    }

    /// Creates a failure from any other error.
    #[must_use]
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other(Arc::new(error))
    }

    /// Creates a failure from an [`anyhow::Error`].
    #[must_use]
    pub fn from_anyhow(error: anyhow::Error) -> Self {
        let boxed: Box<dyn std::error::Error + Send + Sync + 'static> = error.into();
        Self::Other(Arc::from(boxed))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Formatted(err) => f.write_str(&err.message),
            Self::Located(err) => fmt::Display::fmt(err, f),
            Self::Extended(err) => fmt::Display::fmt(err, f),
            Self::Other(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl From<FormattedError> for Failure {
    fn from(error: FormattedError) -> Self {
        Self::Formatted(error)
    }
}

impl From<GraphQLError> for Failure {
    fn from(error: GraphQLError) -> Self {
        Self::Located(error)
    }
}

impl From<MessageError> for Failure {
    fn from(error: MessageError) -> Self {
        Self::other(error)
    }
}

/// The wire-level error unit.
///
/// Equality compares the serialized fields only; the original cause is
/// carried along for callers that need it but is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedError {
    /// Human-readable message.
    pub message: String,

    /// Locations in the request text, if known.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SourceLocation>,

    /// Response path, if the error is tied to a field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    /// Structured extension entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,

    #[serde(skip)]
    original: Option<Box<Failure>>,
}

impl FormattedError {
    /// Creates a message-only error with no original cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: None,
            original: None,
        }
    }

    /// Returns the original cause this error was formatted from.
    #[must_use]
    pub fn original(&self) -> Option<&Failure> {
        self.original.as_deref()
    }

    fn from_plain(cause: BoxError) -> Self {
        Self {
            message: cause.to_string(),
            locations: Vec::new(),
            path: None,
            extensions: None,
            original: Some(Box::new(Failure::Other(cause))),
        }
    }
}

impl PartialEq for FormattedError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && self.locations == other.locations
            && self.path == other.path
            && self.extensions == other.extensions
    }
}

impl fmt::Display for FormattedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(first) = self.locations.first() {
            write!(f, " ({first})")?;
        }
        Ok(())
    }
}

impl std::error::Error for FormattedError {}

/// Converts any failure into its canonical [`FormattedError`].
///
/// An already formatted error is unwrapped to its original cause first, so
/// normalizing twice yields the same message and locations as normalizing
/// once. Extended causes keep the locations of the formatted shell they came
/// in; plain causes are reported by message only.
pub fn normalize(failure: impl Into<Failure>) -> FormattedError {
    let mut cause = failure.into();
    let mut locations = Vec::new();

    loop {
        match cause {
            Failure::Formatted(mut formatted) => match formatted.original.take() {
                Some(original) => {
                    locations = formatted.locations;
                    cause = *original;
                }
                None => return formatted,
            },
            Failure::Located(err) => return err.format(),
            Failure::Extended(err) => return GraphQLError::wrap_extended(err, locations).format(),
            Failure::Other(err) => return FormattedError::from_plain(err),
        }
    }
}
