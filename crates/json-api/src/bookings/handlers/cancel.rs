//! Cancel Booking Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use tracing::info;
use uuid::Uuid;

use crate::{
    bookings::models::BookingResponse, errors::into_status_error, extensions::*, state::State,
};

/// Cancel Booking Handler
///
/// Admin-only. Releases the booking's seats back to the event.
#[endpoint(
    tags("admin"),
    summary = "Cancel Booking",
    responses(
        (status_code = StatusCode::OK, description = "Booking cancelled"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin role required"),
        (status_code = StatusCode::NOT_FOUND, description = "Booking not found"),
        (status_code = StatusCode::CONFLICT, description = "Booking is no longer active"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    booking: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<BookingResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let admin = depot.admin_or_403()?;

    let booking = state
        .app
        .bookings
        .cancel_booking(booking.into_inner().into())
        .await
        .map_err(into_status_error)?;

    info!(booking = %booking.uuid, admin = %admin.user, "booking cancelled by admin");

    Ok(Json(booking.into()))
}
