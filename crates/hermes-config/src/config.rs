//! Main configuration types.
//!
//! This module provides the top-level [`HermesConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogFormat, LoggingConfig, MetricsSection, PipelineConfig};

/// Complete Hermes configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert_eq!(config.pipeline.source_name, "GraphQL request");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Service name, used as a metrics label.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Deployment environment (e.g., "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Operation pipeline configuration.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for HermesConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsSection::default(),
        }
    }
}

fn default_service_name() -> String {
    "hermes".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

impl HermesConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::{HermesConfig, PipelineConfig};
    ///
    /// let config = HermesConfig::builder()
    ///     .pipeline(PipelineConfig {
    ///         max_query_length: Some(8192),
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.pipeline.max_query_length, Some(8192));
    /// ```
    #[must_use]
    pub fn builder() -> HermesConfigBuilder {
        HermesConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The service name or source name is empty
    /// - `max_query_length` is zero
    /// - The log level is not a valid filter directive
    /// - Metrics are enabled with empty or unsorted histogram buckets
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value("service_name", "must not be empty"));
        }

        if self.pipeline.source_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "pipeline.source_name",
                "must not be empty",
            ));
        }

        if self.pipeline.max_query_length == Some(0) {
            return Err(ConfigError::invalid_value(
                "pipeline.max_query_length",
                "must be greater than 0",
            ));
        }

        if self.logging.enabled {
            hermes_telemetry::logging::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        if self.metrics.enabled {
            let buckets = &self.metrics.histogram_buckets;
            if buckets.is_empty() {
                return Err(ConfigError::invalid_value(
                    "metrics.histogram_buckets",
                    "must not be empty",
                ));
            }
            if !buckets.windows(2).all(|w| w[0] < w[1]) {
                return Err(ConfigError::invalid_value(
                    "metrics.histogram_buckets",
                    "must be strictly increasing",
                ));
            }
        }

        Ok(())
    }

    /// Builds the telemetry settings described by this configuration.
    #[must_use]
    pub fn telemetry_config(&self) -> hermes_telemetry::TelemetryConfig {
        hermes_telemetry::TelemetryConfig::builder()
            .service_name(&self.service_name)
            .environment(&self.environment)
            .logging(self.logging.to_log_config())
            .metrics(self.metrics.to_metrics_config(&self.service_name))
            .build()
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting with ANSI colors
    /// - Debug log level
    /// - No request size limit
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::HermesConfig;
    ///
    /// let config = HermesConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config.environment = "development".to_string();
        config.pipeline.max_query_length = None;

        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting
    /// - Info log level
    /// - Request text capped at 256 KiB
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::{HermesConfig, LogFormat};
    ///
    /// let config = HermesConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;

        config.environment = "production".to_string();
        config.pipeline.max_query_length = Some(256 * 1024);

        config
    }
}

/// Builder for [`HermesConfig`].
#[derive(Debug, Default)]
pub struct HermesConfigBuilder {
    service_name: Option<String>,
    environment: Option<String>,
    pipeline: Option<PipelineConfig>,
    logging: Option<LoggingConfig>,
    metrics: Option<MetricsSection>,
}

impl HermesConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service name.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Set the environment.
    #[must_use]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Set the pipeline configuration.
    #[must_use]
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsSection) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> HermesConfig {
        let defaults = HermesConfig::default();
        HermesConfig {
            service_name: self.service_name.unwrap_or(defaults.service_name),
            environment: self.environment.unwrap_or(defaults.environment),
            pipeline: self.pipeline.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<HermesConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
