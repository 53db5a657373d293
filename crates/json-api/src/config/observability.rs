//! Logging, tracing export and request timing settings.

use std::time::Duration;

use clap::Args;

/// Crates whose `info` output drowns out request logs.
const QUIET_TARGETS: &[&str] = &[
    "h2", "hyper", "tower", "tonic", "sqlx", "redis", "reqwest", "opentelemetry",
];

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable single-line logs.
    Compact,

    /// One JSON object per line, with the current span attached.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl LoggingConfig {
    /// Filter directives used when `RUST_LOG` is not a full directive set.
    #[must_use]
    pub fn filter_directives(&self) -> String {
        QUIET_TARGETS
            .iter()
            .fold(self.log_level.clone(), |directives, target| {
                format!("{directives},{target}=warn")
            })
    }
}

/// OTLP span export.
#[derive(Debug, Args)]
pub struct OtelConfig {
    /// Export request spans over OTLP.
    #[arg(long = "otel-enabled", env = "OTEL_ENABLED", default_value_t = false)]
    pub enabled: bool,

    /// Continue traces from an incoming `traceparent` header.
    #[arg(
        long = "otel-parent-propagation-enabled",
        env = "OTEL_PARENT_PROPAGATION_ENABLED",
        default_value_t = false
    )]
    pub parent_propagation: bool,

    #[arg(
        long = "otel-exporter-otlp-endpoint",
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub endpoint: String,

    #[arg(
        long = "otel-exporter-otlp-timeout-seconds",
        env = "OTEL_EXPORTER_OTLP_TIMEOUT_SECONDS",
        default_value_t = 3
    )]
    pub timeout_seconds: u64,

    #[arg(
        long = "otel-service-name",
        env = "OTEL_SERVICE_NAME",
        default_value = "storefront-json"
    )]
    pub service_name: String,

    #[arg(
        long = "otel-service-version",
        env = "OTEL_SERVICE_VERSION",
        default_value = env!("CARGO_PKG_VERSION")
    )]
    pub service_version: String,

    #[arg(
        long = "otel-deployment-environment",
        env = "OTEL_DEPLOYMENT_ENVIRONMENT",
        default_value = "development"
    )]
    pub deployment_environment: String,

    /// Trace sampling ratio, clamped to [0.0, 1.0].
    #[arg(
        long = "otel-trace-sample-ratio",
        env = "OTEL_TRACE_SAMPLE_RATIO",
        default_value_t = 1.0
    )]
    pub sample_ratio: f64,
}

impl OtelConfig {
    #[must_use]
    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Parent extraction only makes sense when spans are exported.
    #[must_use]
    pub fn propagates_parent(&self) -> bool {
        self.enabled && self.parent_propagation
    }
}

/// Tracing export and request timing settings.
#[derive(Debug, Args)]
pub struct ObservabilityConfig {
    #[command(flatten)]
    pub otel: OtelConfig,

    /// Requests slower than this are logged at `warn`.
    #[arg(long, env = "SLOW_REQUEST_THRESHOLD_MS", default_value_t = 1_000)]
    pub slow_request_threshold_ms: u64,
}

impl ObservabilityConfig {
    #[must_use]
    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_threshold_ms)
    }
}
