//! Prometheus metrics for Hermes.
//!
//! Recording goes through the `metrics` facade, so the functions here are
//! cheap no-ops until [`init_metrics`] installs a recorder.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `hermes_operations_total` | Counter | `outcome` | Operations processed by the pipeline |
//! | `hermes_pipeline_duration_seconds` | Histogram | `outcome` | Time spent in the pipeline |
//! | `hermes_extension_faults_total` | Counter | `extension`, `hook` | Panics captured in extension hooks |
//! | `hermes_subscriptions_total` | Counter | - | Operations classified as subscriptions |
//! | `hermes_operations_in_flight` | Gauge | - | Operations currently in the pipeline |
//!
//! # Example
//!
//! ```
//! use hermes_telemetry::metrics::{record_operation, Outcome};
//! use std::time::Duration;
//!
//! record_operation(Outcome::Success, Duration::from_millis(3));
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names.
pub mod names {
    /// Operations processed, by outcome.
    pub const OPERATIONS_TOTAL: &str = "hermes_operations_total";

    /// Pipeline duration histogram.
    pub const PIPELINE_DURATION: &str = "hermes_pipeline_duration_seconds";

    /// Captured extension faults.
    pub const EXTENSION_FAULTS_TOTAL: &str = "hermes_extension_faults_total";

    /// Operations classified as subscriptions.
    pub const SUBSCRIPTIONS_TOTAL: &str = "hermes_subscriptions_total";

    /// Operations currently in the pipeline.
    pub const OPERATIONS_IN_FLIGHT: &str = "hermes_operations_in_flight";
}

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Service name, attached as a global label.
    pub service_name: String,

    /// Histogram buckets for pipeline duration.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "hermes".to_string(),
            // 100us up to 1s; the pipeline only parses and validates
            duration_buckets: vec![
                0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ],
        }
    }
}

/// How an operation left the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Parsed, validated and classified.
    Success,
    /// Aborted because an extension failed to initialize.
    InitFailed,
    /// Aborted during parsing.
    ParseFailed,
    /// Aborted during validation.
    ValidationFailed,
}

impl Outcome {
    /// Returns the label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::InitFailed => "init_failed",
            Self::ParseFailed => "parse_failed",
            Self::ValidationFailed => "validation_failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Initializes the metrics subsystem.
///
/// Installs a global Prometheus recorder without an HTTP listener; use
/// [`render_metrics`] to obtain the exposition text.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the recorder cannot be built or
/// another recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .add_global_label("service", config.service_name.clone())
        .set_buckets_for_metric(
            Matcher::Full(names::PIPELINE_DURATION.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(
        names::OPERATIONS_TOTAL,
        "Total number of operations processed by the pipeline"
    );
    describe_histogram!(
        names::PIPELINE_DURATION,
        "Time spent parsing and validating an operation, in seconds"
    );
    describe_counter!(
        names::EXTENSION_FAULTS_TOTAL,
        "Panics captured in extension hooks"
    );
    describe_counter!(
        names::SUBSCRIPTIONS_TOTAL,
        "Operations classified as subscriptions"
    );
    describe_gauge!(
        names::OPERATIONS_IN_FLIGHT,
        "Number of operations currently in the pipeline"
    );
}

/// Records a finished pipeline run.
///
/// Updates `hermes_operations_total` and `hermes_pipeline_duration_seconds`.
pub fn record_operation(outcome: Outcome, duration: Duration) {
    counter!(names::OPERATIONS_TOTAL, "outcome" => outcome.as_str()).increment(1);
    histogram!(names::PIPELINE_DURATION, "outcome" => outcome.as_str())
        .record(duration.as_secs_f64());
}

/// Records a panic captured in an extension hook.
///
/// * `extension` - Extension name
/// * `hook` - Hook name, e.g. `"ParseDidStart"`
pub fn record_extension_fault(extension: &str, hook: &str) {
    counter!(
        names::EXTENSION_FAULTS_TOTAL,
        "extension" => extension.to_string(),
        "hook" => hook.to_string()
    )
    .increment(1);
}

/// Records an operation classified as a subscription.
pub fn record_subscription() {
    counter!(names::SUBSCRIPTIONS_TOTAL).increment(1);
}

/// Guard that tracks an operation in `hermes_operations_in_flight`.
///
/// The gauge is decremented on drop, so it stays balanced even if the
/// pipeline unwinds.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(names::OPERATIONS_IN_FLIGHT).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(names::OPERATIONS_IN_FLIGHT).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.service_name, "hermes");
        assert!(config.duration_buckets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Success.as_str(), "success");
        assert_eq!(Outcome::InitFailed.as_str(), "init_failed");
        assert_eq!(Outcome::ParseFailed.to_string(), "parse_failed");
        assert_eq!(Outcome::ValidationFailed.to_string(), "validation_failed");
    }

    #[test]
    fn test_record_functions_dont_panic() {
        // No recorder installed: the facade discards everything
        record_operation(Outcome::Success, Duration::from_millis(1));
        record_extension_fault("tracing", "ParseDidStart");
        record_subscription();
        drop(InFlightGuard::new());
    }

    #[test]
    fn test_disabled_metrics_skip_install() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_render_after_install() {
        // Only one global recorder per process

        if init_metrics(&MetricsConfig::default()).is_ok() {
            record_operation(Outcome::ParseFailed, Duration::from_millis(2));
            let text = render_metrics().unwrap_or_default();
            assert!(text.contains(names::OPERATIONS_TOTAL));
        }
    }
}
