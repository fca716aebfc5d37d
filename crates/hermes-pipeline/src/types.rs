//! Common types used throughout the operation pipeline.

use hermes_core::{FormattedError, PathSegment};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One GraphQL operation as received from the transport.
///
/// Deserializes from the usual request body:
///
/// ```
/// use hermes_pipeline::OperationRequest;
///
/// let request: OperationRequest = serde_json::from_str(
///     r#"{"query": "query Q { foo }", "operationName": "Q"}"#,
/// ).unwrap();
///
/// assert_eq!(request.operation_name.as_deref(), Some("Q"));
/// assert!(request.variables.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    /// The request text.
    pub query: String,

    /// Variable values by name.
    #[serde(default)]
    pub variables: Map<String, Value>,

    /// Selects one operation of a multi-operation document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl OperationRequest {
    /// Creates a request with no variables and no operation name.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Sets the operation name.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Adds a variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }
}

/// The outcome of executing an operation, handed to execution finish callbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Response data, if execution produced any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Errors raised during execution.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FormattedError>,
}

/// Describes the field being resolved, handed to field-resolution hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveInfo {
    /// Name of the field.
    pub field_name: String,
    /// Type the field is defined on.
    pub parent_type: String,
    /// Declared return type, e.g. `[User!]`.
    pub return_type: String,
    /// Response path of the field.
    pub path: Vec<PathSegment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = OperationRequest::new("query Q($id: ID) { user(id: $id) { id } }")
            .with_operation_name("Q")
            .with_variable("id", json!("1"));

        assert_eq!(request.operation_name.as_deref(), Some("Q"));
        assert_eq!(request.variables.get("id"), Some(&json!("1")));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = OperationRequest::new("{ foo }").with_operation_name("Q");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["operationName"], json!("Q"));
        assert_eq!(value["variables"], json!({}));
    }

    #[test]
    fn test_execution_result_wire_shape() {
        let result = ExecutionResult {
            data: Some(json!({"foo": 1})),
            errors: Vec::new(),
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"data": {"foo": 1}})
        );
    }
}
