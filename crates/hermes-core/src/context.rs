//! Operation context carrier.
//!
//! The [`RequestContext`] is the value extensions receive and hand back from
//! every hook. It is immutable: enriching it produces a new context that
//! supersedes the previous one for every later extension and phase, so the
//! pipeline can thread it through hooks as a plain fold without locking.

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each operation, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it suitable for log correlation.
///
/// # Example
///
/// ```
/// use hermes_core::OperationId;
///
/// let id = OperationId::new();
/// println!("Operation ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Creates a new unique operation ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates an `OperationId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OperationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

type Values = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Immutable per-operation context threaded through extension hooks.
///
/// Values are keyed by their type, the way typed request extensions work:
/// an extension that wants to pass data to a later hook defines its own
/// type and stores it with [`with_value`](Self::with_value).
///
/// Cloning is cheap; values are shared.
///
/// # Example
///
/// ```
/// use hermes_core::RequestContext;
///
/// #[derive(Debug, PartialEq)]
/// struct TenantId(String);
///
/// let base = RequestContext::new();
/// let enriched = base.with_value(TenantId("acme".to_string()));
///
/// assert!(base.value::<TenantId>().is_none());
/// assert_eq!(enriched.value::<TenantId>(), Some(&TenantId("acme".to_string())));
/// assert_eq!(base.operation_id(), enriched.operation_id());
/// ```
#[derive(Clone)]
pub struct RequestContext {
    /// Unique identifier for this operation.
    operation_id: OperationId,

    /// When the operation started processing.
    started_at: Instant,

    /// Type-keyed values added by the pipeline and by extensions.
    values: Arc<Values>,
}

impl RequestContext {
    /// Creates a new context with a fresh operation ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_operation_id(OperationId::new())
    }

    /// Creates a new context with the specified operation ID.
    ///
    /// Useful when the transport already assigned an ID to the operation.
    #[must_use]
    pub fn with_operation_id(operation_id: OperationId) -> Self {
        Self {
            operation_id,
            started_at: Instant::now(),
            values: Arc::new(HashMap::new()),
        }
    }

    /// Returns the operation ID.
    #[must_use]
    pub const fn operation_id(&self) -> OperationId {
        self.operation_id
    }

    /// Returns when the operation started processing.
    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the operation started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns a new context that also carries `value`.
    ///
    /// A value of the same type already present is replaced in the new
    /// context; `self` is left untouched.
    #[must_use]
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        let mut values: Values = self.values.as_ref().clone();
        values.insert(TypeId::of::<T>(), Arc::new(value));
        Self {
            operation_id: self.operation_id,
            started_at: self.started_at,
            values: Arc::new(values),
        }
    }

    /// Retrieves a typed value.
    ///
    /// Returns `None` if no value of the given type was stored.
    #[must_use]
    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Checks if a value of the given type exists.
    #[must_use]
    pub fn has_value<T: Any + Send + Sync>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("operation_id", &self.operation_id)
            .field("started_at", &self.started_at)
            .field("values", &self.values.len())
            .finish()
    }
}
