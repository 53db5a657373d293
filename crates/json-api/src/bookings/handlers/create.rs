//! Book Event Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::checkout::{
    CheckoutError,
    records::{EventBookingCreated, EventBookingRequest},
};

use crate::{errors::into_status_error, extensions::*, state::State};

/// Fallback for the buyer's email when the body omits it.
pub(crate) const USER_EMAIL_HEADER: &str = "x-user-email";

/// Book Event Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookEventRequest {
    /// Between 1 and 10
    pub attendees: u32,

    pub user_email: Option<String>,
}

/// Event Booked Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventBookedResponse {
    pub booking_id: Uuid,
    pub order_id: Uuid,
    pub total_price: u64,
    pub session_id: String,
    pub session_url: String,
}

impl From<EventBookingCreated> for EventBookedResponse {
    fn from(created: EventBookingCreated) -> Self {
        Self {
            booking_id: created.booking.into(),
            order_id: created.order.into(),
            total_price: created.total_price,
            session_id: created.payment_reference,
            session_url: created.session_url,
        }
    }
}

/// Book Event Handler
///
/// Reserves seats directly, bypassing the cart, and opens a payment session.
#[endpoint(
    tags("bookings"),
    summary = "Book Event",
    responses(
        (status_code = StatusCode::CREATED, description = "Seats held pending payment"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid attendees or email"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::NOT_FOUND, description = "Event not found"),
        (status_code = StatusCode::CONFLICT, description = "Event full or already booked"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    event: PathParam<Uuid>,
    json: JsonBody<BookEventRequest>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<EventBookedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;
    let body = json.into_inner();

    let Some(email) = body
        .user_email
        .or_else(|| req.header::<String>(USER_EMAIL_HEADER))
    else {
        return Err(into_status_error(CheckoutError::InvalidEmail));
    };

    let created = state
        .app
        .checkout
        .book_event(EventBookingRequest {
            user: identity.user,
            event: event.into_inner().into(),
            attendees: body.attendees,
            email,
        })
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/bookings/{}", created.booking), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(created.into()))
}
