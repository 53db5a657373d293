//! Authorize Download Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::downloads::records::{DownloadGrant, Entitlement};

use crate::{errors::into_status_error, extensions::*, state::State};

/// Authorize Download Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthorizeDownloadRequest {
    /// Completed order that purchased the product
    pub order_id: Uuid,
}

/// Download Grant Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DownloadGrantResponse {
    pub token: String,

    /// Unix seconds after which the token is rejected
    pub expires: i64,

    /// Path to redeem the grant at
    pub url: String,
}

impl From<DownloadGrant> for DownloadGrantResponse {
    fn from(grant: DownloadGrant) -> Self {
        Self {
            token: grant.token,
            expires: grant.expires,
            url: grant.download_path,
        }
    }
}

/// Authorize Download Handler
///
/// Issues a short-lived signed token for a purchased digital product.
#[endpoint(
    tags("downloads"),
    summary = "Authorize Download",
    responses(
        (status_code = StatusCode::OK, description = "Signed download grant"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Not purchased on this order"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    json: JsonBody<AuthorizeDownloadRequest>,
    depot: &mut Depot,
) -> Result<Json<DownloadGrantResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let grant = state
        .app
        .downloads
        .authorize(Entitlement {
            user: identity.user,
            product: product.into_inner().into(),
            order: json.into_inner().order_id.into(),
        })
        .await
        .map_err(into_status_error)?;

    Ok(Json(grant.into()))
}
