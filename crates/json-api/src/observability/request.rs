//! Request logging, request ids, route labels and parent trace extraction.

use std::time::Instant;

use opentelemetry::{global, propagation::Extractor, trace::TraceContextExt as _};
use salvo::{
    Request, handler,
    http::{HeaderMap, HeaderName, StatusCode, header::HeaderValue},
    prelude::{Depot, FlowCtrl, Response},
};
use tracing::{Instrument as _, error, info, warn};
use tracing_opentelemetry::OpenTelemetrySpanExt as _;
use uuid::Uuid;

use super::{metrics, settings};

pub(crate) const REQUEST_ID_HEADER: &str = "x-request-id";
const REQUEST_ID_DEPOT_KEY: &str = "request_id";

#[handler]
pub(crate) async fn request_logging(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    if req.uri().path() == "/metrics" {
        ctrl.call_next(req, depot, res).await;
        return;
    }

    let started = Instant::now();
    let settings = settings::current();

    let request_id = resolve_request_id(req.header::<String>(REQUEST_ID_HEADER));

    depot.insert(REQUEST_ID_DEPOT_KEY, request_id.clone());
    set_request_id_header(res, &request_id);

    let method = req.method().to_string();
    let path = req.uri().path().to_owned();
    let route = route_label(&path);
    let remote_addr = req.remote_addr().to_string();
    let _in_flight = metrics::InFlightRequestGuard::track();

    let span = tracing::info_span!(
        parent: None,
        "http.request",
        otel.name = %format!("{method} {route}"),
        otel.kind = "server",
        request_id = %request_id,
        method = %method,
        path = %path,
        remote_addr = %remote_addr,
        status = tracing::field::Empty,
        duration_ms = tracing::field::Empty
    );

    if settings.propagate_parent
        && let Some(parent) = extract_parent_context(req.headers())
        && let Err(source) = span.set_parent(parent)
    {
        warn!("failed to set parent context on request span: {source}");
    }

    ctrl.call_next(req, depot, res)
        .instrument(span.clone())
        .await;

    let duration = started.elapsed();
    let status = res.status_code.unwrap_or(StatusCode::OK);
    let duration_ms = duration.as_millis();
    let threshold_ms = settings.slow_request_threshold.as_millis();

    metrics::observe_request(&method, &route, status.as_u16(), duration.as_secs_f64());

    span.record("status", status.as_u16());
    span.record("duration_ms", duration_ms);

    span.in_scope(|| {
        info!(status = status.as_u16(), duration_ms, "request.completed");

        if status.is_server_error() {
            error!(status = status.as_u16(), %method, %path, %request_id, "server error response");
        } else if status.is_client_error() {
            warn!(status = status.as_u16(), %method, %path, %request_id, "client error response");
        }

        if duration_ms > threshold_ms {
            warn!(
                %method,
                %path,
                %request_id,
                duration_ms,
                threshold_ms,
                "slow request detected"
            );
        }
    });
}

fn resolve_request_id(header: Option<String>) -> String {
    header
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

fn set_request_id_header(res: &mut Response, request_id: &str) {
    match HeaderValue::from_str(request_id) {
        Ok(value) => {
            res.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        Err(source) => {
            warn!(request_id, "could not encode request id for response header: {source}");
        }
    }
}

/// Collapse ids in a path so metric and span labels stay low-cardinality.
fn route_label(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if Uuid::try_parse(segment).is_ok() {
                "{id}"
            } else {
                segment
            }
        })
        .collect();

    format!("/{}", segments.join("/"))
}

fn extract_parent_context(headers: &HeaderMap) -> Option<opentelemetry::Context> {
    let extractor = HeaderExtractor(headers);

    global::get_text_map_propagator(|propagator| {
        // A fresh base context keeps requests without trace headers from
        // inheriting whatever span is active in-process.
        let context = propagator.extract_with_context(&opentelemetry::Context::new(), &extractor);
        let valid = context.span().span_context().is_valid();

        valid.then_some(context)
    })
}

#[derive(Debug)]
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.to_str().ok()
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}
