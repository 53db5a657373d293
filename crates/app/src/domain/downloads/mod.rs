//! Download Entitlements

pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;
pub mod token;

pub use errors::DownloadError;
pub use service::*;
pub use token::DownloadSigner;
