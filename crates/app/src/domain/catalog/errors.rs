//! Catalog service errors.

use sqlx::Error;
use thiserror::Error;

use crate::errors::{Classify, ErrorClass};

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("catalog item not found")]
    NotFound,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CatalogServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Sql(error)
    }
}

impl Classify for CatalogServiceError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound => ErrorClass::NotFound,
            Self::Sql(_) => ErrorClass::Unavailable,
        }
    }
}
