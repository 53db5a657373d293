//! Payment Webhook Handler
//!
//! The body must reach the verifier byte-for-byte, so it is read raw rather
//! than through a JSON extractor.

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use storefront_app::{
    domain::payments::SignatureError,
    errors::{Classify, ErrorClass},
};

use crate::{errors::into_status_error, extensions::*, observability::observe_webhook, state::State};

pub(crate) const SIGNATURE_HEADER: &str = "payment-signature";

/// Webhook Acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct WebhookAckResponse {
    pub received: bool,

    /// `processed`, `already_handled` or `ignored`
    pub outcome: String,
}

/// Payment Webhook Handler
///
/// Non-2xx responses make the provider redeliver; duplicates and irrelevant
/// events are acknowledged with 200.
#[endpoint(
    tags("webhooks"),
    summary = "Receive Payment Provider Event",
    responses(
        (status_code = StatusCode::OK, description = "Event acknowledged"),
        (status_code = StatusCode::BAD_REQUEST, description = "Malformed event"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing or invalid signature"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Processing failed; will be retried"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<WebhookAckResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let Some(signature) = req.header::<String>(SIGNATURE_HEADER) else {
        observe_webhook("rejected");

        return Err(into_status_error(SignatureError::MalformedHeader));
    };

    let payload = req
        .payload()
        .await
        .map_err(|error| {
            observe_webhook("rejected");

            StatusError::bad_request().brief(format!("unreadable body: {error}"))
        })?
        .to_vec();

    match state.app.fulfillment.handle_webhook(&payload, &signature).await {
        Ok(outcome) => {
            info!(outcome = outcome.as_str(), "payment webhook handled");
            observe_webhook(outcome.as_str());

            Ok(Json(WebhookAckResponse {
                received: true,
                outcome: outcome.as_str().to_string(),
            }))
        }
        Err(error) => {
            let label = match error.class() {
                ErrorClass::Authentication | ErrorClass::Validation => {
                    warn!("payment webhook rejected: {error}");

                    "rejected"
                }
                _ => "failed",
            };

            observe_webhook(label);

            Err(into_status_error(error))
        }
    }
}
