//! Download Records

use std::time::Duration;

use crate::{
    domain::{catalog::records::DigitalProductUuid, orders::OrderUuid},
    identity::UserUuid,
    secrets::Secret,
    uuids::TypedUuid,
};

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Download log marker.
#[derive(Debug)]
pub struct DownloadLog;

/// Download Log UUID
pub type DownloadLogUuid = TypedUuid<DownloadLog>;

#[derive(Debug)]
pub struct DownloadsConfig {
    pub secret: Secret,
    pub ttl: Duration,

    /// Prefix joined with a product's `file_key` to form the content location.
    pub content_base_url: String,
}

/// The purchase a download is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entitlement {
    pub user: UserUuid,
    pub product: DigitalProductUuid,
    pub order: OrderUuid,
}

/// A signed, time-limited grant returned by `authorize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadGrant {
    pub token: String,

    /// Unix seconds after which the token no longer verifies.
    pub expires: i64,

    pub download_path: String,
}

/// What a client presents to redeem a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub entitlement: Entitlement,
    pub token: String,
    pub expires: i64,
}

/// Per-product delivery details of an entitled purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntitlementRecord {
    pub(crate) download_limit: u32,
    pub(crate) file_key: String,
}
