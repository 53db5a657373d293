//! Error classes shared by every service error.

/// Transport-independent classification of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed or out-of-range input.
    Validation,

    /// No identity where one is required.
    Authentication,

    /// Identity present but not allowed.
    Authorization,

    /// State conflict such as exhausted capacity or a duplicate booking.
    Conflict,

    /// A referenced entity does not exist.
    NotFound,

    /// Infrastructure failure; callers may retry.
    Unavailable,
}

/// Implemented by service errors so transports can map them in one place.
pub trait Classify {
    fn class(&self) -> ErrorClass;
}
