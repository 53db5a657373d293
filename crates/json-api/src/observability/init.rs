//! Subscriber installation and telemetry teardown.

use opentelemetry::{global, trace::TracerProvider as _};
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    trace::{SdkTracer, SdkTracerProvider},
};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Registry,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{ServerConfig, observability::LogFormat};

use super::{ObservabilityError, otel, settings};

/// Holds the tracer provider so buffered spans can be flushed on exit.
#[derive(Debug)]
pub(crate) struct Observability {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Observability {
    pub(crate) fn init(config: &ServerConfig) -> Result<Self, ObservabilityError> {
        let otel = &config.observability.otel;

        settings::install(&config.observability);

        let tracer_provider = if otel.enabled {
            global::set_text_map_propagator(TraceContextPropagator::new());
            Some(otel::build_tracer_provider(otel)?)
        } else {
            None
        };

        let export = tracer_provider
            .as_ref()
            .map(|provider| provider.tracer(otel.service_name.clone()));

        match config.logging.log_format {
            LogFormat::Compact => install(
                config,
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
                export,
            )?,
            LogFormat::Json => install(
                config,
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true),
                export,
            )?,
        }

        info!(
            otel_enabled = otel.enabled,
            parent_propagation = otel.propagates_parent(),
            slow_request_threshold_ms = config.observability.slow_request_threshold_ms,
            "observability initialised"
        );

        Ok(Self { tracer_provider })
    }

    pub(crate) fn shutdown(self) {
        if let Some(provider) = self.tracer_provider
            && let Err(source) = provider.shutdown()
        {
            error!("failed to flush spans on shutdown: {source}");
        }
    }
}

fn install<L>(
    config: &ServerConfig,
    fmt_layer: L,
    export: Option<SdkTracer>,
) -> Result<(), ObservabilityError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.filter_directives()));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .with(export.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer)))
        .try_init()?;

    Ok(())
}
