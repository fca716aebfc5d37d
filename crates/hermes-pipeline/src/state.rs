//! Shared per-operation state.
//!
//! The [`OperationState`] is created by the transport before the pipeline
//! runs and outlives it: later phases (execution, subscription handling) read
//! what the pipeline published here. Only the pipeline writes to it.
//!
//! The key set is fixed, see [`StateKey`].

use std::fmt;
use std::sync::{Arc, Weak};

use hermes_core::RequestContext;
use hermes_engine::Document;
use parking_lot::RwLock;

use crate::params::PipelineParams;

/// The well-known entries of an [`OperationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// The [`PipelineParams`] of the operation.
    OperationParams,
    /// The parsed [`Document`].
    Document,
    /// Whether the document contains a subscription.
    Subscription,
    /// A handle to the state itself, reachable from the context.
    OperationContext,
}

impl StateKey {
    /// Returns the key name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OperationParams => "operation_params",
            Self::Document => "document",
            Self::Subscription => "subscription",
            Self::OperationContext => "operation_context",
        }
    }

    /// Returns all keys.
    #[must_use]
    pub const fn all() -> [StateKey; 4] {
        [
            Self::OperationParams,
            Self::Document,
            Self::Subscription,
            Self::OperationContext,
        ]
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-operation store the pipeline publishes its results into.
///
/// Safe to read from any thread. Always held in an [`Arc`]; the
/// [`OperationContext`](StateKey::OperationContext) entry is a weak handle to
/// that same `Arc`, so the state can be recovered from a context with
/// [`operation_state`].
///
/// # Example
///
/// ```
/// use hermes_pipeline::{OperationState, StateKey};
///
/// let state = OperationState::new();
/// assert!(state.params().is_none());
/// assert!(!state.is_subscription());
/// assert_eq!(state.populated_keys(), vec![StateKey::OperationContext]);
/// ```
pub struct OperationState {
    this: Weak<OperationState>,
    params: RwLock<Option<Arc<PipelineParams>>>,
    document: RwLock<Option<Arc<Document>>>,
    subscription: RwLock<Option<bool>>,
}

impl OperationState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            params: RwLock::new(None),
            document: RwLock::new(None),
            subscription: RwLock::new(None),
        })
    }

    /// Returns the published operation parameters.
    pub fn params(&self) -> Option<Arc<PipelineParams>> {
        self.params.read().clone()
    }

    /// Returns the published document.
    pub fn document(&self) -> Option<Arc<Document>> {
        self.document.read().clone()
    }

    /// Returns the subscription flag, `false` until published.
    pub fn is_subscription(&self) -> bool {
        self.subscription.read().unwrap_or(false)
    }

    /// Returns a weak handle to this state.
    pub fn handle(&self) -> OperationHandle {
        OperationHandle(self.this.clone())
    }

    /// Returns true if `key` holds a value.
    pub fn contains(&self, key: StateKey) -> bool {
        match key {
            StateKey::OperationParams => self.params.read().is_some(),
            StateKey::Document => self.document.read().is_some(),
            StateKey::Subscription => self.subscription.read().is_some(),
            StateKey::OperationContext => true,
        }
    }

    /// Returns the keys that hold a value.
    pub fn populated_keys(&self) -> Vec<StateKey> {
        StateKey::all()
            .into_iter()
            .filter(|key| self.contains(*key))
            .collect()
    }

    pub(crate) fn publish_params(&self, params: Arc<PipelineParams>) {
        *self.params.write() = Some(params);
    }

    pub(crate) fn publish_document(&self, document: Arc<Document>) {
        *self.document.write() = Some(document);
    }

    pub(crate) fn publish_subscription(&self, is_subscription: bool) {
        *self.subscription.write() = Some(is_subscription);
    }
}

impl fmt::Debug for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationState")
            .field("populated", &self.populated_keys())
            .field("subscription", &self.is_subscription())
            .finish_non_exhaustive()
    }
}

/// A weak reference to an [`OperationState`], stored in the context.
#[derive(Debug, Clone)]
pub struct OperationHandle(Weak<OperationState>);

impl OperationHandle {
    /// Returns the state, if it is still alive.
    pub fn upgrade(&self) -> Option<Arc<OperationState>> {
        self.0.upgrade()
    }
}

/// Returns the operation state reachable from `ctx`.
///
/// Every context handed to an extension by the pipeline carries a handle.
///
/// # Example
///
/// ```
/// use hermes_core::RequestContext;
/// use hermes_pipeline::{operation_state, OperationState};
///
/// let state = OperationState::new();
/// let ctx = RequestContext::new().with_value(state.handle());
///
/// let found = operation_state(&ctx).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&found, &state));
/// assert!(operation_state(&RequestContext::new()).is_none());
/// ```
pub fn operation_state(ctx: &RequestContext) -> Option<Arc<OperationState>> {
    ctx.value::<OperationHandle>().and_then(OperationHandle::upgrade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_engine::fixtures;
    use serde_json::Value;

    fn params() -> Arc<PipelineParams> {
        Arc::new(PipelineParams::new(
            Arc::new(fixtures::query_schema()),
            Value::Null,
            crate::OperationRequest::new("{ foo }"),
            RequestContext::new(),
        ))
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = OperationState::new();
        assert!(state.params().is_none());
        assert!(state.document().is_none());
        assert!(!state.contains(StateKey::Subscription));
        assert!(state.contains(StateKey::OperationContext));
    }

    #[test]
    fn test_publish_and_read() {
        let state = OperationState::new();
        state.publish_params(params());
        state.publish_document(Arc::new(Document::parse("{ foo }").unwrap()));
        state.publish_subscription(true);

        assert_eq!(state.params().unwrap().query, "{ foo }");
        assert_eq!(state.document().unwrap().operation_count(), 1);
        assert!(state.is_subscription());
        assert_eq!(state.populated_keys(), StateKey::all().to_vec());
    }

    #[test]
    fn test_handle_points_back_to_state() {
        let state = OperationState::new();
        let handle = state.handle();
        assert!(Arc::ptr_eq(&handle.upgrade().unwrap(), &state));
    }

    #[test]
    fn test_handle_does_not_keep_state_alive() {
        let state = OperationState::new();
        let ctx = RequestContext::new().with_value(state.handle());
        drop(state);
        assert!(operation_state(&ctx).is_none());
    }

    #[test]
    fn test_key_names() {
        assert_eq!(StateKey::OperationParams.to_string(), "operation_params");
        assert_eq!(StateKey::Document.name(), "document");
        assert_eq!(StateKey::Subscription.name(), "subscription");
        assert_eq!(StateKey::OperationContext.name(), "operation_context");
    }

    #[test]
    fn test_debug_lists_populated_keys() {
        let state = OperationState::new();
        state.publish_subscription(false);
        let text = format!("{state:?}");
        assert!(text.contains("Subscription"));
        assert!(text.contains("OperationContext"));
    }
}
