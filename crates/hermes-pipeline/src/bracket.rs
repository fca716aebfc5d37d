//! Phase brackets with per-call fault isolation.
//!
//! A phase is bracketed in two passes. The start pass calls every
//! extension's start hook in registration order, threading the context from
//! one extension to the next, and collects the finish callbacks by extension
//! name. The finish pass calls every collected callback with the phase
//! outcome.
//!
//! Each hook call is guarded on its own: a panic becomes a tagged
//! [`FormattedError`] and the loop moves on to the next extension.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use hermes_core::{normalize, Failure, FormattedError, RequestContext};
use hermes_telemetry::logging::log_extension_fault;
use hermes_telemetry::metrics::record_extension_fault;
use serde_json::Value;

use crate::extension::{
    Extension, ExecutionFinishFn, ParseFinishFn, ResolveFieldFinishFn, ValidationFinishFn,
};
use crate::phase::{Hook, Phase};
use crate::types::ExecutionResult;

/// Runs `f`, turning a panic into its message.
pub(crate) fn guard<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Turns captured panics into errors, logging and counting them.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FaultReporter {
    log_faults: bool,
}

impl FaultReporter {
    pub(crate) const fn new(log_faults: bool) -> Self {
        Self { log_faults }
    }

    pub(crate) fn report(self, extension: &str, hook: Hook, cause: &str) -> FormattedError {
        let hook = hook.to_string();
        if self.log_faults {
            log_extension_fault(extension, &hook, cause);
        }
        record_extension_fault(extension, &hook);
        normalize(Failure::message(format!("{extension}.{hook}: {cause}")))
    }
}

/// The outcome of a start pass.
#[must_use]
pub struct PhaseStart<F> {
    /// The context after the last extension that started normally.
    pub context: RequestContext,
    /// Calls the finish callbacks of the extensions that started.
    pub finisher: Finisher<F>,
    /// Faults raised by start hooks, in registration order.
    pub errors: Vec<FormattedError>,
}

impl<F> fmt::Debug for PhaseStart<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseStart")
            .field("context", &self.context)
            .field("finisher", &self.finisher)
            .field("errors", &self.errors)
            .finish()
    }
}

/// The finish callbacks collected by a start pass, keyed by extension name.
///
/// Callbacks run in no particular order.
#[must_use]
pub struct Finisher<F> {
    phase: Phase,
    reporter: FaultReporter,
    callbacks: HashMap<String, F>,
}

impl<F> Finisher<F> {
    /// Returns the phase these callbacks belong to.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the number of pending callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns true if no extension started normally.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Returns true if the named extension has a pending callback.
    pub fn contains(&self, extension: &str) -> bool {
        self.callbacks.contains_key(extension)
    }

    fn dispatch(self, mut errors: Vec<FormattedError>, call: impl Fn(F)) -> Vec<FormattedError> {
        let Self {
            phase,
            reporter,
            callbacks,
        } = self;

        for (name, callback) in callbacks {
            if let Err(cause) = guard(|| call(callback)) {
                errors.push(reporter.report(&name, Hook::FinishFunc(phase), &cause));
            }
        }

        errors
    }
}

impl Finisher<ParseFinishFn> {
    /// Calls every parse callback with the parse failure.
    ///
    /// The failure, if any, is the first entry of the returned errors,
    /// followed by callback faults.
    pub fn finish(self, error: Option<&FormattedError>) -> Vec<FormattedError> {
        let seed = error.cloned().into_iter().collect();
        self.dispatch(seed, |callback| callback(error))
    }
}

impl Finisher<ValidationFinishFn> {
    /// Calls every validation callback with the engine's errors.
    ///
    /// Returns those errors followed by callback faults.
    pub fn finish(self, errors: &[FormattedError]) -> Vec<FormattedError> {
        self.dispatch(errors.to_vec(), |callback| callback(errors))
    }
}

impl Finisher<ExecutionFinishFn> {
    /// Calls every execution callback with the result.
    ///
    /// Returns callback faults only.
    pub fn finish(self, result: &ExecutionResult) -> Vec<FormattedError> {
        self.dispatch(Vec::new(), |callback| callback(result))
    }
}

impl Finisher<ResolveFieldFinishFn> {
    /// Calls every field callback with the resolved value or error.
    ///
    /// Returns callback faults only.
    pub fn finish(self, value: Option<&Value>, error: Option<&FormattedError>) -> Vec<FormattedError> {
        self.dispatch(Vec::new(), |callback| callback(value, error))
    }
}

impl<F> fmt::Debug for Finisher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.callbacks.keys().collect();
        names.sort();
        f.debug_struct("Finisher")
            .field("phase", &self.phase)
            .field("callbacks", &names)
            .finish()
    }
}

/// Runs the start pass of `phase` over `extensions`.
///
/// Each extension receives the context produced by the previous one. An
/// extension whose start hook panics leaves the context as it was and gets
/// no finish callback.
pub(crate) fn run_start_phase<F>(
    extensions: &[Arc<dyn Extension>],
    context: RequestContext,
    phase: Phase,
    reporter: FaultReporter,
    start: impl Fn(&dyn Extension, RequestContext) -> (RequestContext, F),
) -> PhaseStart<F> {
    let mut callbacks = HashMap::with_capacity(extensions.len());
    let mut errors = Vec::new();

    let context = extensions.iter().fold(context, |ctx, extension| {
        match guard(|| start(extension.as_ref(), ctx.clone())) {
            Ok((next, callback)) => {
                callbacks.insert(extension.name().to_string(), callback);
                next
            }
            Err(cause) => {
                errors.push(reporter.report(extension.name(), Hook::DidStart(phase), &cause));
                ctx
            }
        }
    });

    PhaseStart {
        context,
        finisher: Finisher {
            phase,
            reporter,
            callbacks,
        },
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{finish, HookExtension};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Trail(Vec<&'static str>);

    fn trail(ctx: &RequestContext) -> Vec<&'static str> {
        ctx.value::<Trail>().map(|t| t.0.clone()).unwrap_or_default()
    }

    fn appending(name: &'static str) -> Arc<dyn Extension> {
        Arc::new(HookExtension::new(name).on_parse(move |ctx| {
            let mut steps = trail(&ctx);
            steps.push(name);
            (ctx.with_value(Trail(steps)), finish::parse(|_| {}))
        }))
    }

    fn panicking(name: &'static str) -> Arc<dyn Extension> {
        Arc::new(HookExtension::new(name).on_parse(|_| panic!("start exploded")))
    }

    fn start_parse(extensions: &[Arc<dyn Extension>]) -> PhaseStart<ParseFinishFn> {
        run_start_phase(
            extensions,
            RequestContext::new(),
            Phase::Parse,
            FaultReporter::new(false),
            |ext, ctx| ext.parse_did_start(ctx),
        )
    }

    #[test]
    fn test_guard_captures_str_and_string_payloads() {
        assert_eq!(guard(|| 7), Ok(7));

        let literal: Result<(), String> = guard(|| panic!("static"));
        assert_eq!(literal, Err("static".to_string()));

        let formatted: Result<(), String> = guard(|| panic!("formatted {}", 42));
        assert_eq!(formatted, Err("formatted 42".to_string()));
    }

    #[test]
    fn test_guard_non_string_payload() {
        let result: Result<(), String> = guard(|| std::panic::panic_any(42_u32));
        assert_eq!(result, Err("non-string panic payload".to_string()));
    }

    #[test]
    fn test_start_pass_chains_context_in_order() {
        let started = start_parse(&[appending("first"), appending("second")]);

        assert!(started.errors.is_empty());
        assert_eq!(trail(&started.context), vec!["first", "second"]);
        assert_eq!(started.finisher.len(), 2);
    }

    #[test]
    fn test_panicking_start_is_isolated() {
        let started = start_parse(&[appending("first"), panicking("broken"), appending("third")]);

        assert_eq!(started.errors.len(), 1);
        assert_eq!(
            started.errors[0].message,
            "broken.ParseDidStart: start exploded"
        );
        // The faulted extension is skipped; the chain continues past it
        assert_eq!(trail(&started.context), vec!["first", "third"]);
        assert!(!started.finisher.contains("broken"));
        assert!(started.finisher.contains("first"));
        assert!(started.finisher.contains("third"));
    }

    #[test]
    fn test_parse_finish_seeds_error_and_collects_faults() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let counting: Arc<dyn Extension> = Arc::new(HookExtension::new("counting").on_parse(
            move |ctx| {
                let counter = Arc::clone(&counter);
                (
                    ctx,
                    finish::parse(move |err| {
                        assert!(err.is_some());
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
                )
            },
        ));
        let exploding: Arc<dyn Extension> = Arc::new(
            HookExtension::new("exploding")
                .on_parse(|ctx| (ctx, finish::parse(|_| panic!("finish exploded")))),
        );

        let started = start_parse(&[counting, exploding]);
        let parse_error = FormattedError::new("Syntax Error");
        let errors = started.finisher.finish(Some(&parse_error));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], parse_error);
        assert_eq!(errors[1].message, "exploding.ParseFinishFunc: finish exploded");
    }

    #[test]
    fn test_validation_finish_seeds_engine_errors() {
        let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(HookExtension::new("plain"))];
        let started = run_start_phase(
            &extensions,
            RequestContext::new(),
            Phase::Validation,
            FaultReporter::new(false),
            |ext, ctx| ext.validation_did_start(ctx),
        );

        let engine_errors = vec![FormattedError::new("Cannot query field")];
        let errors = started.finisher.finish(&engine_errors);
        assert_eq!(errors, engine_errors);
    }

    #[test]
    fn test_execution_and_field_finishers_return_faults_only() {
        let extensions: Vec<Arc<dyn Extension>> = vec![Arc::new(
            HookExtension::new("exec")
                .on_execution(|ctx| (ctx, finish::execution(|_| panic!("no result"))))
                .on_resolve_field(|ctx, _| (ctx, finish::resolve_field(|_, _| {}))),
        )];

        let execution = run_start_phase(
            &extensions,
            RequestContext::new(),
            Phase::Execution,
            FaultReporter::new(false),
            |ext, ctx| ext.execution_did_start(ctx),
        );
        let errors = execution.finisher.finish(&ExecutionResult::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "exec.ExecutionFinishFunc: no result");

        let info = crate::types::ResolveInfo {
            field_name: "foo".to_string(),
            parent_type: "QueryRoot".to_string(),
            return_type: "Int".to_string(),
            path: vec!["foo".into()],
        };
        let field = run_start_phase(
            &extensions,
            RequestContext::new(),
            Phase::ResolveField,
            FaultReporter::new(false),
            |ext, ctx| ext.resolve_field_did_start(ctx, &info),
        );
        let error = FormattedError::new("resolver failed");
        assert!(field.finisher.finish(None, Some(&error)).is_empty());
    }

    #[test]
    fn test_fault_reporter_tags_message() {
        let error = FaultReporter::new(true).report("metrics", Hook::Init, "boom");
        assert_eq!(error.message, "metrics.Init: boom");
        assert!(error.locations.is_empty());
        assert!(error.original().is_some());
    }

    #[test]
    fn test_finisher_debug_lists_names() {
        let started = start_parse(&[appending("b"), appending("a")]);
        let text = format!("{:?}", started.finisher);
        assert!(text.contains("[\"a\", \"b\"]"));
    }
}
