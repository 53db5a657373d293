//! Service error to HTTP status mapping.

use std::fmt::Display;

use salvo::http::StatusError;
use tracing::{error, warn};

use storefront_app::errors::{Classify, ErrorClass};

/// Map any classified service error to a status. The only place statuses are
/// chosen for domain failures.
pub(crate) fn into_status_error<E>(error: E) -> StatusError
where
    E: Classify + Display,
{
    let class = error.class();

    match class {
        ErrorClass::Validation => StatusError::bad_request().brief(error.to_string()),
        ErrorClass::Authentication => StatusError::unauthorized().brief(error.to_string()),
        ErrorClass::Authorization => StatusError::forbidden().brief(error.to_string()),
        ErrorClass::Conflict => StatusError::conflict().brief(error.to_string()),
        ErrorClass::NotFound => StatusError::not_found().brief(error.to_string()),
        ErrorClass::Unavailable => {
            error!("service unavailable: {error}");

            StatusError::internal_server_error()
        }
    }
}

/// Like [`into_status_error`] but hides the reason; used where a refusal must
/// not reveal which check failed.
pub(crate) fn into_forbidden<E>(error: E) -> StatusError
where
    E: Classify + Display,
{
    if error.class() == ErrorClass::Authorization {
        warn!("download refused: {error}");

        return StatusError::forbidden();
    }

    into_status_error(error)
}
