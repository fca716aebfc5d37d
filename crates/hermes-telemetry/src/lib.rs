//! Observability for the Hermes operation pipeline.
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! The pipeline records through the `metrics` facade and emits `tracing`
//! events unconditionally. Nothing is collected or printed until the host
//! process calls [`init_telemetry`] (or the individual initializers).
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `hermes_operations_total` | Counter | `outcome` | Operations processed |
//! | `hermes_pipeline_duration_seconds` | Histogram | `outcome` | Pipeline latency |
//! | `hermes_extension_faults_total` | Counter | `extension`, `hook` | Captured extension panics |
//! | `hermes_subscriptions_total` | Counter | - | Subscription operations |
//! | `hermes_operations_in_flight` | Gauge | - | Operations in the pipeline |
//!
//! # Example
//!
//! ```rust,ignore
//! use hermes_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder()
//!     .service_name("gateway")
//!     .environment("production")
//!     .build();
//!
//! init_telemetry(&config)?;
//!
//! // later, from an admin endpoint
//! let text = hermes_telemetry::render_metrics().unwrap_or_default();
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, MetricsConfig, Outcome};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if any subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    if config.service_name.trim().is_empty() {
        return Err(TelemetryError::InvalidConfig(
            "service name must not be empty".to_string(),
        ));
    }

    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_service_name_rejected() {
        let config = TelemetryConfig {
            service_name: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            init_telemetry(&config),
            Err(TelemetryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_disabled_subsystems() {
        let mut config = TelemetryConfig::default();
        config.logging.enabled = false;
        config.metrics.enabled = false;
        assert!(init_telemetry(&config).is_ok());
    }
}
