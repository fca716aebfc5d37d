//! Per-operation parameters.

use std::sync::Arc;

use hermes_core::RequestContext;
use hermes_engine::Schema;
use serde_json::{Map, Value};

use crate::types::OperationRequest;

/// Everything one operation runs with.
///
/// Built by the pipeline from the [`OperationRequest`]; extensions see it in
/// [`Extension::init`](crate::Extension::init) and later phases read it from
/// [`OperationState::params`](crate::OperationState::params). The `context`
/// field always holds the latest context handed back by an extension.
#[derive(Debug, Clone)]
pub struct PipelineParams {
    /// The schema the operation is validated against.
    pub schema: Arc<Schema>,
    /// Root value passed to top-level resolvers.
    pub root_value: Value,
    /// The request text.
    pub query: String,
    /// Variable values by name.
    pub variables: Map<String, Value>,
    /// The requested operation, if any.
    pub operation_name: Option<String>,
    /// The context carrier.
    pub context: RequestContext,
}

impl PipelineParams {
    pub(crate) fn new(
        schema: Arc<Schema>,
        root_value: Value,
        request: OperationRequest,
        context: RequestContext,
    ) -> Self {
        Self {
            schema,
            root_value,
            query: request.query,
            variables: request.variables,
            operation_name: request.operation_name,
            context,
        }
    }

    /// Returns a copy carrying a different context.
    #[must_use]
    pub fn with_context(&self, context: RequestContext) -> Self {
        Self {
            context,
            ..self.clone()
        }
    }
}
