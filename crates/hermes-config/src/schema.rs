//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};

/// Operation pipeline configuration section.
///
/// # Example
///
/// ```
/// use hermes_config::PipelineConfig;
///
/// let config = PipelineConfig {
///     max_query_length: Some(64 * 1024),
///     ..Default::default()
/// };
/// assert_eq!(config.source_name, "GraphQL request");
/// assert!(config.log_faults);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Name given to the request source; appears in syntax errors.
    #[serde(default = "default_source_name")]
    pub source_name: String,

    /// Log a warning for every panic captured in an extension hook.
    #[serde(default = "default_true")]
    pub log_faults: bool,

    /// Longest accepted request text in bytes. `None` means unlimited.
    #[serde(default)]
    pub max_query_length: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_name: default_source_name(),
            log_faults: true,
            max_query_length: None,
        }
    }
}

fn default_source_name() -> String {
    "GraphQL request".to_string()
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directive (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts this section into the telemetry crate's logging settings.
    #[must_use]
    pub fn to_log_config(&self) -> hermes_telemetry::LogConfig {
        let json = self.format == LogFormat::Json;
        hermes_telemetry::LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: json,
            span_events: !json,
            file_line_info: self.include_location,
            thread_ids: false,
            include_target: true,
            ansi: self.ansi_enabled,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Enable metrics collection.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Histogram bucket boundaries for pipeline duration, in seconds.
    #[serde(default = "default_histogram_buckets")]
    pub histogram_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_buckets: default_histogram_buckets(),
        }
    }
}

impl MetricsSection {
    /// Converts this section into the telemetry crate's metrics settings.
    #[must_use]
    pub fn to_metrics_config(&self, service_name: &str) -> hermes_telemetry::MetricsConfig {
        hermes_telemetry::MetricsConfig {
            enabled: self.enabled,
            service_name: service_name.to_string(),
            duration_buckets: self.histogram_buckets.clone(),
        }
    }
}

fn default_histogram_buckets() -> Vec<f64> {
    hermes_telemetry::MetricsConfig::default().duration_buckets
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.source_name, "GraphQL request");
        assert!(config.log_faults);
        assert!(config.max_query_length.is_none());
    }

    #[test]
    fn test_pipeline_config_deserialize() {
        let toml = r"
            max_query_length = 4096
        ";
        let config: PipelineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_query_length, Some(4096));
        // Defaults applied
        assert_eq!(config.source_name, "GraphQL request");
        assert!(config.log_faults);
    }

    #[test]
    fn test_pipeline_config_unknown_field_rejected() {
        let toml = r"
            log_faults = false
            unknown_field = 1
        ";
        let result: Result<PipelineConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);

        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_logging_to_log_config() {
        let config = LoggingConfig {
            format: LogFormat::Pretty,
            ansi_enabled: true,
            include_location: true,
            level: "debug".to_string(),
            ..Default::default()
        };
        let log = config.to_log_config();
        assert!(!log.json_format);
        assert!(log.ansi);
        assert!(log.file_line_info);
        assert_eq!(log.level, "debug");
    }

    #[test]
    fn test_metrics_section_to_metrics_config() {
        let section = MetricsSection {
            enabled: false,
            histogram_buckets: vec![0.1, 1.0],
        };
        let metrics = section.to_metrics_config("gateway");
        assert!(!metrics.enabled);
        assert_eq!(metrics.service_name, "gateway");
        assert_eq!(metrics.duration_buckets, vec![0.1, 1.0]);
    }
}
