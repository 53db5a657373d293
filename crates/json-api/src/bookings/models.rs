//! Booking wire models.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::bookings::records::BookingRecord;

/// Booking Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookingResponse {
    pub booking_id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub attendees: u32,
    pub total_price: u64,

    /// `pending`, `confirmed`, `cancelled` or `attended`
    pub status: String,

    pub created_at: String,
    pub updated_at: String,
}

impl From<BookingRecord> for BookingResponse {
    fn from(booking: BookingRecord) -> Self {
        Self {
            booking_id: booking.uuid.into(),
            event_id: booking.event.into(),
            user_id: booking.user.into(),
            order_id: booking.order.map(Into::into),
            attendees: booking.attendees,
            total_price: booking.total_price,
            status: booking.status.as_str().to_string(),
            created_at: booking.created_at.to_string(),
            updated_at: booking.updated_at.to_string(),
        }
    }
}
