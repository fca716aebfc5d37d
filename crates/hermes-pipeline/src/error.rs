//! Pipeline error types.

use hermes_core::FormattedError;
use thiserror::Error;

use crate::phase::Phase;

/// The single failure value returned by [`Pipeline::process`](crate::Pipeline::process).
///
/// Bundles every error collected before the pipeline aborted, in the order
/// they were raised, together with the phase that aborted.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", summary(.phase, .errors))]
pub struct AggregateFailure {
    phase: Phase,
    errors: Vec<FormattedError>,
}

impl AggregateFailure {
    /// Creates a failure for the given phase.
    #[must_use]
    pub fn new(phase: Phase, errors: Vec<FormattedError>) -> Self {
        Self { phase, errors }
    }

    /// Returns the phase in which the pipeline aborted.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the collected errors.
    #[must_use]
    pub fn errors(&self) -> &[FormattedError] {
        &self.errors
    }

    /// Consumes the failure, returning the collected errors.
    #[must_use]
    pub fn into_errors(self) -> Vec<FormattedError> {
        self.errors
    }
}

/// Joins the messages with `"; "`, or names the phase when there are none.
fn summary(phase: &Phase, errors: &[FormattedError]) -> String {
    if errors.is_empty() {
        return format!("{phase} failed");
    }
    errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised while building a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Two extensions share a name.
    #[error("duplicate extension name: {name}")]
    DuplicateExtension {
        /// The repeated name.
        name: String,
    },

    /// No schema was supplied.
    #[error("pipeline requires a schema")]
    MissingSchema,
}

impl PipelineError {
    /// Creates a duplicate extension error.
    pub fn duplicate_extension(name: impl Into<String>) -> Self {
        Self::DuplicateExtension { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_display_joins_messages() {
        let failure = AggregateFailure::new(
            Phase::Validation,
            vec![
                FormattedError::new("first"),
                FormattedError::new("second"),
            ],
        );
        assert_eq!(failure.to_string(), "first; second");
        assert_eq!(failure.phase(), Phase::Validation);
        assert_eq!(failure.errors().len(), 2);
    }

    #[test]
    fn test_aggregate_is_std_error() {
        let failure: Box<dyn std::error::Error> = Box::new(AggregateFailure::new(
            Phase::Parse,
            vec![FormattedError::new("Syntax Error")],
        ));
        assert_eq!(failure.to_string(), "Syntax Error");
        assert!(failure.source().is_none());
    }

    #[test]
    fn test_aggregate_display_without_errors() {
        let failure = AggregateFailure::new(Phase::Validation, Vec::new());
        assert_eq!(failure.to_string(), "Validation failed");
    }

    #[test]
    fn test_into_errors_keeps_order() {
        let failure = AggregateFailure::new(
            Phase::Parse,
            vec![FormattedError::new("a"), FormattedError::new("b")],
        );
        let messages: Vec<_> = failure.into_errors().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["a", "b"]);
    }

    #[test]
    fn test_pipeline_error_display() {
        assert_eq!(
            PipelineError::duplicate_extension("tracing").to_string(),
            "duplicate extension name: tracing"
        );
        assert_eq!(
            PipelineError::MissingSchema.to_string(),
            "pipeline requires a schema"
        );
    }
}
