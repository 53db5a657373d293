//! Structured logging, OTLP spans, request middleware and Prometheus metrics.

use thiserror::Error;

mod init;
mod metrics;
mod otel;
mod request;
mod settings;

pub(crate) use init::Observability;
pub(crate) use metrics::{metrics_handler, observe_webhook};
pub(crate) use request::request_logging;

#[derive(Debug, Error)]
pub(crate) enum ObservabilityError {
    #[error("OTLP span exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    /// A global subscriber was already installed.
    #[error("tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}
