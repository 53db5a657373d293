//! Refund Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use tracing::info;
use uuid::Uuid;

use crate::{errors::into_status_error, extensions::*, state::State};

/// Refund Order Handler
///
/// Admin-only. Asks the payment provider to refund the order; the provider's
/// `charge.refunded` webhook performs the state change, so this only accepts.
#[endpoint(
    tags("admin"),
    summary = "Refund Order",
    responses(
        (status_code = StatusCode::ACCEPTED, description = "Refund requested"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin role required"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order is not refundable"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let admin = depot.admin_or_403()?;
    let order = order.into_inner();

    state
        .app
        .fulfillment
        .request_refund(order.into())
        .await
        .map_err(into_status_error)?;

    info!(%order, admin = %admin.user, "refund requested by admin");

    Ok(StatusCode::ACCEPTED)
}
