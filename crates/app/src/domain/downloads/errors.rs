//! Download errors.

use hmac::digest::InvalidLength;
use thiserror::Error;

use crate::errors::{Classify, ErrorClass};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download token is invalid or expired")]
    InvalidToken,

    #[error("no completed purchase of this product on the order")]
    NotEntitled,

    #[error("download limit reached")]
    LimitExceeded,

    #[error("download signing key rejected")]
    Signing(#[from] InvalidLength),

    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}

impl Classify for DownloadError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidToken | Self::NotEntitled | Self::LimitExceeded => {
                ErrorClass::Authorization
            }
            Self::Signing(_) | Self::Sql(_) => ErrorClass::Unavailable,
        }
    }
}
