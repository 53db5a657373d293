//! Liveness check.

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok` while the process is serving requests.
    pub status: String,

    /// Build version of the running server.
    pub version: String,
}

/// Liveness only; never touches `PostgreSQL`, Redis or the payment provider.
#[endpoint(tags("health"), summary = "Liveness check")]
pub(crate) async fn handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
