//! # Hermes Pipeline
//!
//! The operation pipeline between the transport and the executor.
//!
//! Every operation is initialized, parsed and validated here, with each phase
//! bracketed by the registered extensions. The results are published into a
//! shared [`OperationState`] for the phases that follow.
//!
//! ```text
//! Request → Init → ParseDidStart → parse → ParseFinishFunc
//!                → ValidationDidStart → validate → ValidationFinishFunc
//!                → classify → OperationState
//! ```
//!
//! | Phase          | Publishes                | Abort leaves published |
//! |----------------|--------------------------|------------------------|
//! | Init           | operation params         | params                 |
//! | Parse          | document                 | params (+ document if only a finish callback failed) |
//! | Validation     | -                        | params, document       |
//! | Classification | subscription flag        | -                      |
//!
//! ## Key Features
//!
//! - **Fault Isolation**: A panic in one extension hook is captured at that
//!   call, reported as `"<name>.<Hook>: <cause>"` and never stops other extensions
//! - **Context Chaining**: Each extension receives the context returned by the previous one
//! - **One Failure Value**: Callers get `Ok(())` or a single [`AggregateFailure`]
//!
//! ## Example
//!
//! ```
//! use hermes_core::RequestContext;
//! use hermes_engine::fixtures;
//! use hermes_pipeline::{finish, HookExtension, OperationRequest, OperationState, Pipeline};
//!
//! let pipeline = Pipeline::builder()
//!     .schema(fixtures::subscription_schema())
//!     .extension(HookExtension::new("audit").on_validation(|ctx| {
//!         (ctx, finish::validation(|errors| assert!(errors.is_empty())))
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let state = OperationState::new();
//! let request = OperationRequest::new("subscription { foo }");
//! pipeline.process(&state, RequestContext::new(), request).unwrap();
//!
//! assert!(state.is_subscription());
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bracket;
mod error;
pub mod extension;
mod params;
pub mod phase;
pub mod pipeline;
mod state;
pub mod types;

// Re-export main types at crate root
pub use bracket::{Finisher, PhaseStart};
pub use error::{AggregateFailure, PipelineError};
pub use extension::{
    finish, ExecutionFinishFn, Extension, HookExtension, ParseFinishFn, ResolveFieldFinishFn,
    ValidationFinishFn,
};
pub use params::PipelineParams;
pub use phase::{Hook, Phase};
pub use pipeline::{classify_subscription, BoxedExtension, Pipeline, PipelineBuilder};
pub use state::{operation_state, OperationHandle, OperationState, StateKey};
pub use types::{ExecutionResult, OperationRequest, ResolveInfo};
