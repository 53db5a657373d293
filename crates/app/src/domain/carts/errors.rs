//! Carts service errors.

use thiserror::Error;

use crate::{
    domain::{
        carts::{records::InvalidSessionKey, store::CartStoreError},
        catalog::CatalogServiceError,
    },
    errors::{Classify, ErrorClass},
};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error(transparent)]
    InvalidSessionKey(#[from] InvalidSessionKey),

    #[error("quantity must be between 1 and 10, got {0}")]
    InvalidQuantity(u32),

    #[error("item not found in catalog")]
    ItemNotFound,

    #[error("cart has no line for that item")]
    LineNotFound,

    #[error("catalog lookup failed")]
    Catalog(#[source] CatalogServiceError),

    #[error("cart store failed")]
    Store(#[from] CartStoreError),
}

impl From<CatalogServiceError> for CartsServiceError {
    fn from(error: CatalogServiceError) -> Self {
        match error {
            CatalogServiceError::NotFound => Self::ItemNotFound,
            other @ CatalogServiceError::Sql(_) => Self::Catalog(other),
        }
    }
}

impl Classify for CartsServiceError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidSessionKey(_) | Self::InvalidQuantity(_) => ErrorClass::Validation,
            Self::ItemNotFound | Self::LineNotFound => ErrorClass::NotFound,
            Self::Catalog(_) | Self::Store(_) => ErrorClass::Unavailable,
        }
    }
}
