//! The operation pipeline.
//!
//! ## Phases
//!
//! [`Pipeline::process`] drives one operation through a fixed sequence:
//!
//! 1. **Init** - every extension's `init` hook, in registration order
//! 2. **Parse** - bracketed; the document is published before parse finish callbacks run
//! 3. **Validation** - bracketed; the document stays published if validation fails
//! 4. **Classification** - the subscription flag is published
//!
//! Any phase that ends with errors aborts the run with one [`AggregateFailure`].
//! Which [`StateKey`](crate::StateKey)s are populated tells how far the
//! operation got.
//!
//! Execution and field resolution belong to the executor, which brackets them
//! through [`Pipeline::execution_did_start`] and
//! [`Pipeline::resolve_field_did_start`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use hermes_config::PipelineConfig;
use hermes_core::{normalize, Failure, FormattedError, RequestContext};
use hermes_engine::{Document, OperationKind, QueryEngine, Schema, Source, StandardEngine};
use hermes_telemetry::metrics::{self, InFlightGuard, Outcome};
use serde_json::{Map, Value};
use tracing::debug;

use crate::bracket::{guard, run_start_phase, FaultReporter, PhaseStart};
use crate::error::{AggregateFailure, PipelineError};
use crate::extension::{Extension, ExecutionFinishFn, ResolveFieldFinishFn};
use crate::params::PipelineParams;
use crate::phase::{Hook, Phase};
use crate::state::OperationState;
use crate::types::{OperationRequest, ResolveInfo};

/// A type-erased extension that can be stored in a vector.
pub type BoxedExtension = Arc<dyn Extension>;

/// The operation pipeline.
///
/// Built once per server and shared by every operation; the extension list
/// cannot change after construction.
///
/// # Example
///
/// ```
/// use hermes_core::RequestContext;
/// use hermes_engine::fixtures;
/// use hermes_pipeline::{OperationRequest, OperationState, Pipeline};
///
/// let pipeline = Pipeline::builder()
///     .schema(fixtures::query_schema())
///     .build()
///     .unwrap();
///
/// let state = OperationState::new();
/// pipeline
///     .process(&state, RequestContext::new(), OperationRequest::new("query { foo }"))
///     .unwrap();
///
/// assert!(state.document().is_some());
/// assert!(!state.is_subscription());
/// ```
pub struct Pipeline {
    engine: Arc<dyn QueryEngine>,
    schema: Arc<Schema>,
    root_value: Value,
    extensions: Vec<BoxedExtension>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs one operation through init, parse, validation and classification.
    ///
    /// Results are published into `state`. Returns `Ok(())` only if every
    /// phase finished without errors; otherwise returns every collected
    /// error in one [`AggregateFailure`].
    ///
    /// Cancellation is not checked between phases. A caller that cancels
    /// operations must check before calling and after this returns.
    pub fn process(
        &self,
        state: &OperationState,
        ctx: RequestContext,
        request: OperationRequest,
    ) -> Result<(), AggregateFailure> {
        let span = tracing::debug_span!(
            "operation",
            operation_id = %ctx.operation_id(),
            operation_name = request.operation_name.as_deref().unwrap_or("")
        );
        let _entered = span.enter();
        let _in_flight = InFlightGuard::new();
        let started = Instant::now();

        let result = self.run(state, ctx, request);

        let outcome = match &result {
            Ok(()) => Outcome::Success,
            Err(failure) => match failure.phase() {
                Phase::Init => Outcome::InitFailed,
                Phase::Parse => Outcome::ParseFailed,
                Phase::Validation | Phase::Execution | Phase::ResolveField => {
                    Outcome::ValidationFailed
                }
            },
        };
        metrics::record_operation(outcome, started.elapsed());

        match &result {
            Ok(()) => debug!(outcome = %outcome, "Operation ready for execution"),
            Err(failure) => debug!(
                outcome = %outcome,
                error_count = failure.errors().len(),
                error = %failure,
                "Operation aborted"
            ),
        }

        result
    }

    fn run(
        &self,
        state: &OperationState,
        ctx: RequestContext,
        request: OperationRequest,
    ) -> Result<(), AggregateFailure> {
        let reporter = self.reporter();

        let mut params = PipelineParams::new(
            Arc::clone(&self.schema),
            self.root_value.clone(),
            request,
            ctx.with_value(state.handle()),
        );
        state.publish_params(Arc::new(params.clone()));

        // Init
        let mut errors = Vec::new();
        for extension in &self.extensions {
            match guard(|| extension.init(params.context.clone(), &params)) {
                Ok(next) => params.context = next,
                Err(cause) => errors.push(reporter.report(extension.name(), Hook::Init, &cause)),
            }
        }
        let ctx = params.context.clone();
        state.publish_params(Arc::new(params.clone()));
        if !errors.is_empty() {
            return Err(AggregateFailure::new(Phase::Init, errors));
        }
        debug!(phase = %Phase::Init, extensions = self.extensions.len(), "Extensions initialized");

        // Parse
        let PhaseStart {
            context: ctx,
            finisher,
            errors,
        } = run_start_phase(&self.extensions, ctx, Phase::Parse, reporter, |ext, ctx| {
            ext.parse_did_start(ctx)
        });
        if !errors.is_empty() {
            return Err(abort(state, &params, ctx, Phase::Parse, errors));
        }

        let (document, parse_error) = match self.parse(&params.query) {
            Ok(document) => {
                let document = Arc::new(document);
                state.publish_document(Arc::clone(&document));
                (Some(document), None)
            }
            Err(error) => (None, Some(error)),
        };
        let errors = finisher.finish(parse_error.as_ref());
        let document = match document {
            Some(document) if errors.is_empty() => document,
            _ => return Err(abort(state, &params, ctx, Phase::Parse, errors)),
        };
        debug!(
            phase = %Phase::Parse,
            operations = document.operation_count(),
            "Document parsed"
        );

        // Validation
        let PhaseStart {
            context: ctx,
            finisher,
            mut errors,
        } = run_start_phase(&self.extensions, ctx, Phase::Validation, reporter, |ext, ctx| {
            ext.validation_did_start(ctx)
        });
        let validation = self.engine.validate(&self.schema, &document);
        errors.extend(finisher.finish(&validation.errors));
        if !errors.is_empty() || !validation.is_valid {
            return Err(abort(state, &params, ctx, Phase::Validation, errors));
        }
        debug!(phase = %Phase::Validation, "Document validated");

        // Classification
        state.publish_params(Arc::new(params.with_context(ctx)));
        let is_subscription = classify_subscription(&document);
        state.publish_subscription(is_subscription);
        if is_subscription {
            metrics::record_subscription();
        }

        Ok(())
    }

    fn parse(&self, query: &str) -> Result<Document, FormattedError> {
        if let Some(limit) = self.config.max_query_length {
            if query.len() > limit {
                return Err(normalize(Failure::message(format!(
                    "query length {} exceeds limit {limit}",
                    query.len()
                ))));
            }
        }

        self.engine
            .parse(&Source::new(query, &self.config.source_name))
            .map_err(normalize)
    }

    /// Starts the execution bracket.
    ///
    /// Call [`Finisher::finish`](crate::Finisher) with the execution result
    /// once execution is done.
    pub fn execution_did_start(&self, ctx: RequestContext) -> PhaseStart<ExecutionFinishFn> {
        run_start_phase(
            &self.extensions,
            ctx,
            Phase::Execution,
            self.reporter(),
            |ext, ctx| ext.execution_did_start(ctx),
        )
    }

    /// Starts the bracket around resolving one field.
    pub fn resolve_field_did_start(
        &self,
        ctx: RequestContext,
        info: &ResolveInfo,
    ) -> PhaseStart<ResolveFieldFinishFn> {
        run_start_phase(
            &self.extensions,
            ctx,
            Phase::ResolveField,
            self.reporter(),
            |ext, ctx| ext.resolve_field_did_start(ctx, info),
        )
    }

    /// Collects the results of every extension that reports one.
    ///
    /// Returns the response `extensions` map keyed by extension name, plus
    /// the faults raised while collecting.
    pub fn extension_results(&self, ctx: &RequestContext) -> (Map<String, Value>, Vec<FormattedError>) {
        let reporter = self.reporter();
        let mut results = Map::new();
        let mut errors = Vec::new();

        for extension in &self.extensions {
            match guard(|| extension.has_result().then(|| extension.get_result(ctx))) {
                Ok(Some(value)) => {
                    results.insert(extension.name().to_string(), value);
                }
                Ok(None) => {}
                Err(cause) => errors.push(reporter.report(extension.name(), Hook::GetResult, &cause)),
            }
        }

        (results, errors)
    }

    /// Returns the extension names in registration order.
    #[must_use]
    pub fn extension_names(&self) -> Vec<&str> {
        self.extensions.iter().map(|ext| ext.name()).collect()
    }

    /// Returns the number of extensions.
    #[must_use]
    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    /// Returns the schema operations are validated against.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    const fn reporter(&self) -> FaultReporter {
        FaultReporter::new(self.config.log_faults)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("extensions", &self.extension_names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Republishes `params` with the latest context and wraps the phase errors.
fn abort(
    state: &OperationState,
    params: &PipelineParams,
    ctx: RequestContext,
    phase: Phase,
    errors: Vec<FormattedError>,
) -> AggregateFailure {
    state.publish_params(Arc::new(params.with_context(ctx)));
    AggregateFailure::new(phase, errors)
}

/// Returns true if the document defines a subscription operation.
///
/// Definitions are scanned in document order and the scan stops at the first
/// subscription. The requested operation name is not consulted: a document
/// holding a query and a subscription is classified as a subscription even
/// when the query is the operation being run.
#[must_use]
pub fn classify_subscription(document: &Document) -> bool {
    document
        .operations()
        .any(|op| op.kind == OperationKind::Subscription)
}

/// Builder for constructing a [`Pipeline`].
pub struct PipelineBuilder {
    engine: Option<Arc<dyn QueryEngine>>,
    schema: Option<Arc<Schema>>,
    root_value: Value,
    extensions: Vec<BoxedExtension>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Creates a new builder with the standard engine and default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: None,
            schema: None,
            root_value: Value::Null,
            extensions: Vec::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Sets the schema. Required.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<Arc<Schema>>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Replaces the default [`StandardEngine`].
    #[must_use]
    pub fn engine<E: QueryEngine + 'static>(mut self, engine: E) -> Self {
        self.engine = Some(Arc::new(engine));
        self
    }

    /// Sets the root value handed to top-level resolvers.
    #[must_use]
    pub fn root_value(mut self, root_value: Value) -> Self {
        self.root_value = root_value;
        self
    }

    /// Appends an extension.
    ///
    /// Start hooks run in the order extensions are added.
    #[must_use]
    pub fn extension<E: Extension>(mut self, extension: E) -> Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    /// Appends an already shared extension.
    #[must_use]
    pub fn shared_extension(mut self, extension: BoxedExtension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Applies a configuration section.
    #[must_use]
    pub fn config(mut self, config: &PipelineConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Sets the source name shown in syntax errors.
    #[must_use]
    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.config.source_name = name.into();
        self
    }

    /// Enables or disables warnings for captured extension faults.
    #[must_use]
    pub fn log_faults(mut self, enabled: bool) -> Self {
        self.config.log_faults = enabled;
        self
    }

    /// Refuses request text longer than `limit` bytes.
    #[must_use]
    pub fn max_query_length(mut self, limit: usize) -> Self {
        self.config.max_query_length = Some(limit);
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingSchema` if no schema was set, or
    /// `PipelineError::DuplicateExtension` if two extensions share a name.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let schema = self.schema.ok_or(PipelineError::MissingSchema)?;

        let mut names = HashSet::with_capacity(self.extensions.len());
        for extension in &self.extensions {
            if !names.insert(extension.name()) {
                return Err(PipelineError::duplicate_extension(extension.name()));
            }
        }

        Ok(Pipeline {
            engine: self
                .engine
                .unwrap_or_else(|| Arc::new(StandardEngine::new())),
            schema,
            root_value: self.root_value,
            extensions: self.extensions,
            config: self.config,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
