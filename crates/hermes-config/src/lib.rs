//! Typed configuration system for Hermes.
//!
//! This crate provides strongly-typed configuration for the Hermes operation
//! pipeline with support for:
//! - TOML and JSON configuration files
//! - `.env` files and environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Overview
//!
//! The configuration system is built around the [`HermesConfig`] struct:
//!
//! - [`PipelineConfig`] - Source name, fault logging, request size limit
//! - [`LoggingConfig`] - Log level and output format
//! - [`MetricsSection`] - Prometheus recorder settings
//!
//! # Example
//!
//! ```no_run
//! use hermes_config::ConfigLoader;
//!
//! # fn main() -> Result<(), hermes_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_production()
//!     .with_optional_file("hermes.toml")?
//!     .with_env_prefix("HERMES")
//!     .load()?;
//!
//! hermes_telemetry::init_telemetry(&config.telemetry_config()).ok();
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! service_name = "gateway"
//! environment = "production"
//!
//! [pipeline]
//! source_name = "GraphQL request"
//! log_faults = true
//! max_query_length = 262144
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! histogram_buckets = [0.001, 0.01, 0.1, 1.0]
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`. For example:
//!
//! - `HERMES__SERVICE_NAME=gateway`
//! - `HERMES__PIPELINE__MAX_QUERY_LENGTH=none`
//! - `HERMES__LOGGING__FORMAT=pretty`
//! - `HERMES__METRICS__HISTOGRAM_BUCKETS=0.01,0.1,1`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
