//! Get Booking Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    bookings::models::BookingResponse, errors::into_status_error, extensions::*, state::State,
};

/// Get Booking Handler
///
/// Visible to the booking's owner and to admins.
#[endpoint(
    tags("bookings"),
    summary = "Get Booking",
    responses(
        (status_code = StatusCode::OK, description = "Booking"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Booking belongs to another user"),
        (status_code = StatusCode::NOT_FOUND, description = "Booking not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    booking: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<BookingResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let booking = state
        .app
        .bookings
        .get_booking(booking.into_inner().into())
        .await
        .map_err(into_status_error)?;

    if booking.user != identity.user && !identity.is_admin() {
        return Err(StatusError::forbidden().brief("Booking belongs to another user"));
    }

    Ok(Json(booking.into()))
}
