//! Download Handler

use std::sync::Arc;

use salvo::{http::header::LOCATION, oapi::extract::PathParam, prelude::*};
use tracing::info;
use uuid::Uuid;

use storefront_app::domain::downloads::{
    DownloadError,
    records::{DownloadRequest, Entitlement},
};

use crate::{errors::into_forbidden, extensions::*, state::State};

/// Download Handler
///
/// Redeems a grant from `authorize` (query `token`, `orderId`, `expires`) and
/// redirects to the content. Any refusal is a bare 403.
#[endpoint(
    tags("downloads"),
    summary = "Download Digital Product",
    responses(
        (status_code = StatusCode::FOUND, description = "Redirect to content"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Sign in required"),
        (status_code = StatusCode::FORBIDDEN, description = "Download refused"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    product: PathParam<Uuid>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let (Some(token), Some(order), Some(expires)) = (
        req.query::<String>("token"),
        req.query::<Uuid>("orderId"),
        req.query::<i64>("expires"),
    ) else {
        return Err(into_forbidden(DownloadError::InvalidToken));
    };

    let entitlement = Entitlement {
        user: identity.user,
        product: product.into_inner().into(),
        order: order.into(),
    };

    let location = state
        .app
        .downloads
        .download(DownloadRequest {
            entitlement,
            token,
            expires,
        })
        .await
        .map_err(into_forbidden)?;

    info!(
        user = %entitlement.user,
        product = %entitlement.product,
        order = %entitlement.order,
        "download redeemed"
    );

    res.add_header(LOCATION, location, true)
        .or_500("failed to set location header")?;

    Ok(StatusCode::FOUND)
}
