//! Add Cart Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::{
    carts::{NewCartLine, records::SessionKey},
    catalog::records::ItemRef,
};

use crate::{
    carts::{
        models::{CartResponse, ItemKind},
        session::{session_key, set_session_cookie},
    },
    errors::into_status_error,
    extensions::*,
    state::State,
};

/// Add Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddCartItemRequest {
    pub item_type: ItemKind,
    pub item_id: Uuid,

    /// Between 1 and 10; merged with any existing line and clamped at 10
    pub quantity: u32,
}

impl From<AddCartItemRequest> for NewCartLine {
    fn from(request: AddCartItemRequest) -> Self {
        NewCartLine {
            item: ItemRef::new(request.item_type.into(), request.item_id),
            quantity: request.quantity,
        }
    }
}

/// Add Cart Item Handler
///
/// Starts a cart session when the request has none.
#[endpoint(
    tags("carts"),
    summary = "Add Item to Cart",
    responses(
        (status_code = StatusCode::OK, description = "Updated cart"),
        (status_code = StatusCode::NOT_FOUND, description = "Item not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<AddCartItemRequest>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let (session, is_new) = match session_key(req) {
        Some(session) => (session, false),
        None => (SessionKey::generate(), true),
    };

    let cart = state
        .app
        .carts
        .add_item(&session, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    if is_new {
        set_session_cookie(res, &session);
    }

    Ok(Json(cart.into()))
}
