//! Remove Cart Item Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use storefront_app::domain::catalog::records::{ItemRef, ItemType};

use crate::{
    carts::{models::CartResponse, session::session_key},
    errors::into_status_error,
    extensions::*,
    state::State,
};

/// Remove Cart Item Handler
#[endpoint(
    tags("carts"),
    summary = "Remove Item from Cart",
    responses(
        (status_code = StatusCode::OK, description = "Updated cart"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart has no line for that item"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    item_type: PathParam<String>,
    item_id: PathParam<Uuid>,
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let item_type = item_type
        .into_inner()
        .parse::<ItemType>()
        .map_err(|error| StatusError::bad_request().brief(error.to_string()))?;

    let Some(session) = session_key(req) else {
        return Err(StatusError::not_found().brief("Cart has no line for that item"));
    };

    let cart = state
        .app
        .carts
        .remove_item(&session, ItemRef::new(item_type, item_id.into_inner()))
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}
