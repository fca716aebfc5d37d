//! The extension capability.
//!
//! Extensions observe an operation as it moves through the pipeline. Every
//! bracketed phase calls the extension's start hook, which hands back a
//! (possibly enriched) context and a finish callback; the callback receives
//! the phase outcome once the phase is over.
//!
//! Every hook has a no-op default, so an extension only implements the hooks
//! it cares about.
//!
//! # Example
//!
//! ```
//! use hermes_core::RequestContext;
//! use hermes_pipeline::{finish, Extension, ParseFinishFn};
//!
//! struct ParseTimer;
//!
//! impl Extension for ParseTimer {
//!     fn name(&self) -> &str {
//!         "parse-timer"
//!     }
//!
//!     fn parse_did_start(&self, ctx: RequestContext) -> (RequestContext, ParseFinishFn) {
//!         let started = std::time::Instant::now();
//!         let finish = finish::parse(move |err| {
//!             tracing::debug!(elapsed = ?started.elapsed(), failed = err.is_some(), "parsed");
//!         });
//!         (ctx, finish)
//!     }
//! }
//! ```

use std::fmt;

use hermes_core::{FormattedError, RequestContext};
use serde_json::Value;

use crate::params::PipelineParams;
use crate::types::{ExecutionResult, ResolveInfo};

/// Receives the parse failure, if any.
pub type ParseFinishFn = Box<dyn FnOnce(Option<&FormattedError>) + Send>;

/// Receives the validation errors reported by the engine.
pub type ValidationFinishFn = Box<dyn FnOnce(&[FormattedError]) + Send>;

/// Receives the execution result.
pub type ExecutionFinishFn = Box<dyn FnOnce(&ExecutionResult) + Send>;

/// Receives the resolved value or the resolver error.
pub type ResolveFieldFinishFn = Box<dyn FnOnce(Option<&Value>, Option<&FormattedError>) + Send>;

/// Constructors for finish callbacks.
///
/// Boxing a closure through these functions pins its signature, so argument
/// types never need annotations.
pub mod finish {
    use super::{
        ExecutionFinishFn, ExecutionResult, FormattedError, ParseFinishFn, ResolveFieldFinishFn,
        ValidationFinishFn, Value,
    };

    /// Boxes a parse finish callback.
    pub fn parse<F>(f: F) -> ParseFinishFn
    where
        F: FnOnce(Option<&FormattedError>) + Send + 'static,
    {
        Box::new(f)
    }

    /// Boxes a validation finish callback.
    pub fn validation<F>(f: F) -> ValidationFinishFn
    where
        F: FnOnce(&[FormattedError]) + Send + 'static,
    {
        Box::new(f)
    }

    /// Boxes an execution finish callback.
    pub fn execution<F>(f: F) -> ExecutionFinishFn
    where
        F: FnOnce(&ExecutionResult) + Send + 'static,
    {
        Box::new(f)
    }

    /// Boxes a field-resolution finish callback.
    pub fn resolve_field<F>(f: F) -> ResolveFieldFinishFn
    where
        F: FnOnce(Option<&Value>, Option<&FormattedError>) + Send + 'static,
    {
        Box::new(f)
    }
}

/// A pluggable observer of the operation pipeline.
///
/// # Invariants
///
/// - `name` must be unique within a pipeline; it keys the finish dispatch
///   and tags every fault the extension raises
/// - A panic in any hook is captured at that single call and reported as an
///   error tagged `"<name>.<Hook>: <cause>"`; other extensions keep running
/// - A finish callback is only called if its start hook returned normally
pub trait Extension: Send + Sync + 'static {
    /// Returns the unique name of this extension.
    fn name(&self) -> &str;

    /// Called once per operation, before parsing.
    ///
    /// The returned context replaces `ctx` for every later extension and
    /// phase.
    fn init(&self, ctx: RequestContext, _params: &PipelineParams) -> RequestContext {
        ctx
    }

    /// Called when parsing starts.
    fn parse_did_start(&self, ctx: RequestContext) -> (RequestContext, ParseFinishFn) {
        (ctx, finish::parse(|_| {}))
    }

    /// Called when validation starts.
    fn validation_did_start(&self, ctx: RequestContext) -> (RequestContext, ValidationFinishFn) {
        (ctx, finish::validation(|_| {}))
    }

    /// Called when execution starts.
    fn execution_did_start(&self, ctx: RequestContext) -> (RequestContext, ExecutionFinishFn) {
        (ctx, finish::execution(|_| {}))
    }

    /// Called when a field starts resolving.
    fn resolve_field_did_start(
        &self,
        ctx: RequestContext,
        _info: &ResolveInfo,
    ) -> (RequestContext, ResolveFieldFinishFn) {
        (ctx, finish::resolve_field(|_, _| {}))
    }

    /// Whether this extension contributes to the response `extensions` map.
    fn has_result(&self) -> bool {
        false
    }

    /// The value reported under this extension's name.
    fn get_result(&self, _ctx: &RequestContext) -> Value {
        Value::Null
    }
}

type InitHook = Box<dyn Fn(RequestContext, &PipelineParams) -> RequestContext + Send + Sync>;
type ParseHook = Box<dyn Fn(RequestContext) -> (RequestContext, ParseFinishFn) + Send + Sync>;
type ValidationHook =
    Box<dyn Fn(RequestContext) -> (RequestContext, ValidationFinishFn) + Send + Sync>;
type ExecutionHook = Box<dyn Fn(RequestContext) -> (RequestContext, ExecutionFinishFn) + Send + Sync>;
type ResolveFieldHook = Box<
    dyn Fn(RequestContext, &ResolveInfo) -> (RequestContext, ResolveFieldFinishFn) + Send + Sync,
>;
type ResultHook = Box<dyn Fn(&RequestContext) -> Value + Send + Sync>;

/// An extension assembled from closures.
///
/// Hooks that are not set keep the default no-op behavior.
///
/// # Example
///
/// ```
/// use hermes_pipeline::{finish, Extension, HookExtension};
///
/// let ext = HookExtension::new("audit")
///     .on_parse(|ctx| (ctx, finish::parse(|err| assert!(err.is_none()))))
///     .with_result(|_ctx| serde_json::json!({"audited": true}));
///
/// assert_eq!(ext.name(), "audit");
/// assert!(ext.has_result());
/// ```
pub struct HookExtension {
    name: String,
    init: Option<InitHook>,
    parse: Option<ParseHook>,
    validation: Option<ValidationHook>,
    execution: Option<ExecutionHook>,
    resolve_field: Option<ResolveFieldHook>,
    result: Option<ResultHook>,
}

impl HookExtension {
    /// Creates an extension with the given name and no hooks.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            init: None,
            parse: None,
            validation: None,
            execution: None,
            resolve_field: None,
            result: None,
        }
    }

    /// Sets the init hook.
    #[must_use]
    pub fn on_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestContext, &PipelineParams) -> RequestContext + Send + Sync + 'static,
    {
        self.init = Some(Box::new(hook));
        self
    }

    /// Sets the parse start hook.
    #[must_use]
    pub fn on_parse<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestContext) -> (RequestContext, ParseFinishFn) + Send + Sync + 'static,
    {
        self.parse = Some(Box::new(hook));
        self
    }

    /// Sets the validation start hook.
    #[must_use]
    pub fn on_validation<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestContext) -> (RequestContext, ValidationFinishFn) + Send + Sync + 'static,
    {
        self.validation = Some(Box::new(hook));
        self
    }

    /// Sets the execution start hook.
    #[must_use]
    pub fn on_execution<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestContext) -> (RequestContext, ExecutionFinishFn) + Send + Sync + 'static,
    {
        self.execution = Some(Box::new(hook));
        self
    }

    /// Sets the field-resolution start hook.
    #[must_use]
    pub fn on_resolve_field<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestContext, &ResolveInfo) -> (RequestContext, ResolveFieldFinishFn)
            + Send
            + Sync
            + 'static,
    {
        self.resolve_field = Some(Box::new(hook));
        self
    }

    /// Reports a result under this extension's name.
    #[must_use]
    pub fn with_result<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RequestContext) -> Value + Send + Sync + 'static,
    {
        self.result = Some(Box::new(hook));
        self
    }
}

impl Extension for HookExtension {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, ctx: RequestContext, params: &PipelineParams) -> RequestContext {
        match &self.init {
            Some(hook) => hook(ctx, params),
            None => ctx,
        }
    }

    fn parse_did_start(&self, ctx: RequestContext) -> (RequestContext, ParseFinishFn) {
        match &self.parse {
            Some(hook) => hook(ctx),
            None => (ctx, finish::parse(|_| {})),
        }
    }

    fn validation_did_start(&self, ctx: RequestContext) -> (RequestContext, ValidationFinishFn) {
        match &self.validation {
            Some(hook) => hook(ctx),
            None => (ctx, finish::validation(|_| {})),
        }
    }

    fn execution_did_start(&self, ctx: RequestContext) -> (RequestContext, ExecutionFinishFn) {
        match &self.execution {
            Some(hook) => hook(ctx),
            None => (ctx, finish::execution(|_| {})),
        }
    }

    fn resolve_field_did_start(
        &self,
        ctx: RequestContext,
        info: &ResolveInfo,
    ) -> (RequestContext, ResolveFieldFinishFn) {
        match &self.resolve_field {
            Some(hook) => hook(ctx, info),
            None => (ctx, finish::resolve_field(|_, _| {})),
        }
    }

    fn has_result(&self) -> bool {
        self.result.is_some()
    }

    fn get_result(&self, ctx: &RequestContext) -> Value {
        self.result.as_ref().map_or(Value::Null, |hook| hook(ctx))
    }
}

impl fmt::Debug for HookExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookExtension")
            .field("name", &self.name)
            .field("init", &self.init.is_some())
            .field("parse", &self.parse.is_some())
            .field("validation", &self.validation.is_some())
            .field("execution", &self.execution.is_some())
            .field("resolve_field", &self.resolve_field.is_some())
            .field("result", &self.result.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct Silent;

    impl Extension for Silent {
        fn name(&self) -> &str {
            "silent"
        }
    }

    #[derive(Debug, PartialEq)]
    struct Seen;

    #[test]
    fn test_default_hooks_pass_context_through() {
        let ctx = RequestContext::new().with_value(Seen);
        let (next, finish) = Silent.parse_did_start(ctx.clone());
        finish(None);

        assert_eq!(next.operation_id(), ctx.operation_id());
        assert_eq!(next.value::<Seen>(), Some(&Seen));
        assert!(!Silent.has_result());
        assert_eq!(Silent.get_result(&ctx), Value::Null);
    }

    #[test]
    fn test_hook_extension_runs_closures() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let ext = HookExtension::new("hooks").on_validation(move |ctx| {
            let flag = Arc::clone(&flag);
            (
                ctx.with_value(Seen),
                finish::validation(move |errors| flag.store(errors.is_empty(), Ordering::SeqCst)),
            )
        });

        let (ctx, finish) = ext.validation_did_start(RequestContext::new());
        assert!(ctx.has_value::<Seen>());
        finish(&[]);
        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_hook_extension_defaults() {
        let ext = HookExtension::new("empty");
        let info = ResolveInfo {
            field_name: "foo".to_string(),
            parent_type: "QueryRoot".to_string(),
            return_type: "Int".to_string(),
            path: vec!["foo".into()],
        };

        let (_, finish) = ext.resolve_field_did_start(RequestContext::new(), &info);
        finish(Some(&json!(1)), None);
        assert!(!ext.has_result());
    }

    #[test]
    fn test_hook_extension_result() {
        let ext = HookExtension::new("cost").with_result(|_| json!({"cost": 3}));
        assert!(ext.has_result());
        assert_eq!(ext.get_result(&RequestContext::new()), json!({"cost": 3}));
    }

    #[test]
    fn test_hook_extension_debug() {
        let ext = HookExtension::new("debuggable").on_parse(|ctx| (ctx, finish::parse(|_| {})));
        let text = format!("{ext:?}");
        assert!(text.contains("debuggable"));
        assert!(text.contains("parse: true"));
    }
}
