//! Confirm Checkout Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::into_status_error, extensions::*, state::State};

/// Order Status Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderStatusResponse {
    pub order_id: Uuid,

    /// `pending`, `completed`, `payment_failed` or `refunded`
    pub status: String,
}

/// Confirm Checkout Handler
///
/// Called when the buyer returns from the payment page. Completes the order if
/// the provider reports the session paid, otherwise reports the current status.
#[endpoint(
    tags("checkout"),
    summary = "Confirm Checkout",
    responses(
        (status_code = StatusCode::OK, description = "Current order status"),
        (status_code = StatusCode::FORBIDDEN, description = "Order belongs to another user"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderStatusResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let order = order.into_inner();

    let status = state
        .app
        .fulfillment
        .confirm(order.into(), depot.identity())
        .await
        .map_err(into_status_error)?;

    Ok(Json(OrderStatusResponse {
        order_id: order,
        status: status.as_str().to_string(),
    }))
}
