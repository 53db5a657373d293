//! Booking Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{catalog::records::EventUuid, orders::OrderUuid},
    identity::UserUuid,
    uuids::TypedUuid,
};

/// Largest party a single booking may hold.
pub const MAX_ATTENDEES: u32 = 10;

/// Booking marker.
#[derive(Debug)]
pub struct Booking;

/// Booking UUID
pub type BookingUuid = TypedUuid<Booking>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Attended,
}

#[derive(Debug, Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownBookingStatus(String);

impl BookingStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Attended => "attended",
        }
    }

    /// Active bookings hold seats.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownBookingStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "attended" => Ok(Self::Attended),
            other => Err(UnknownBookingStatus(other.to_string())),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking Record
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub uuid: BookingUuid,
    pub user: UserUuid,
    pub event: EventUuid,
    pub order: Option<OrderUuid>,
    pub attendees: u32,
    pub total_price: u64,
    pub status: BookingStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Seat reservation request.
#[derive(Debug, Clone, Copy)]
pub struct NewBooking {
    pub event: EventUuid,
    pub user: UserUuid,
    pub attendees: u32,
    pub order: Option<OrderUuid>,
}
