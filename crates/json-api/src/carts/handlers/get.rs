//! Get Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use storefront_app::domain::carts::records::CartRecord;

use crate::{
    carts::{models::CartResponse, session::session_key},
    errors::into_status_error,
    extensions::*,
    state::State,
};

/// Get Cart Handler
///
/// Returns the cart for the `cart_session` cookie; requests without one get
/// an empty cart.
#[endpoint(
    tags("carts"),
    summary = "Get Cart",
    responses(
        (status_code = StatusCode::OK, description = "Current cart"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let Some(session) = session_key(req) else {
        return Ok(Json(CartRecord::default().into()));
    };

    let cart = state
        .app
        .carts
        .get_cart(&session)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::{
        carts::{CartStoreError, CartsServiceError},
        catalog::records::{CourseUuid, ItemRef},
    };

    use crate::{
        carts::ItemKind,
        test_helpers::{Mocks, make_service, strict_carts_mock, with_cart_session},
    };

    use super::{
        super::tests::{SESSION, make_cart},
        *,
    };

    fn service(mocks: Mocks) -> Service {
        make_service(mocks, Router::with_path("cart").get(handler))
    }

    #[tokio::test]
    async fn test_get_without_session_returns_empty_cart() -> TestResult {
        let mut res = TestClient::get("http://example.com/cart")
            .send(&service(Mocks::default()))
            .await;

        let body: CartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.lines.is_empty());
        assert_eq!(body.total, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_returns_session_cart() -> TestResult {
        let item = ItemRef::Course(CourseUuid::new());
        let cart = make_cart(item, 2);

        let mut carts = strict_carts_mock();

        carts
            .expect_get_cart()
            .once()
            .withf(|session| session.as_str() == SESSION)
            .return_once(move |_| Ok(cart));

        let mut res = with_cart_session(TestClient::get("http://example.com/cart"), SESSION)
            .send(&service(Mocks {
                carts,
                ..Mocks::default()
            }))
            .await;

        let body: CartResponse = res.take_json().await?;
        let line = body.lines.first().ok_or("missing cart line")?;

        assert_eq!(line.item_type, ItemKind::Course);
        assert_eq!(line.item_id, item.uuid());
        assert_eq!(line.quantity, 2);
        assert_eq!(line.subtotal, 50_00);
        assert_eq!(body.total, 50_00);

        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_session_cookie_is_ignored() -> TestResult {
        let mut res = with_cart_session(TestClient::get("http://example.com/cart"), "bad:key")
            .send(&service(Mocks::default()))
            .await;

        let body: CartResponse = res.take_json().await?;

        assert!(body.lines.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_returns_500() -> TestResult {
        let decode = serde_json::from_str::<u8>("x")
            .err()
            .ok_or("expected decode error")?;

        let mut carts = strict_carts_mock();

        carts
            .expect_get_cart()
            .once()
            .return_once(move |_| Err(CartsServiceError::Store(CartStoreError::Encoding(decode))));

        let res = with_cart_session(TestClient::get("http://example.com/cart"), SESSION)
            .send(&service(Mocks {
                carts,
                ..Mocks::default()
            }))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }
}
