//! Course enrollments granted by completed orders.

pub(crate) mod repository;

use crate::uuids::TypedUuid;

/// Enrollment marker.
#[derive(Debug)]
pub struct Enrollment;

/// Enrollment UUID
pub type EnrollmentUuid = TypedUuid<Enrollment>;
