//! Create Checkout Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::checkout::{
    CheckoutError,
    records::{CheckoutCreated, CheckoutRequest},
};

use crate::{carts::session_key, errors::into_status_error, extensions::*, state::State};

/// Create Checkout Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateCheckoutRequest {
    pub user_email: String,

    /// Overrides the configured success URL; `{ORDER_ID}` is substituted
    pub success_url: Option<String>,

    /// Overrides the configured cancel URL; `{ORDER_ID}` is substituted
    pub cancel_url: Option<String>,
}

/// Checkout Created Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckoutCreatedResponse {
    /// Payment provider session id
    pub session_id: String,

    /// Hosted payment page to redirect the buyer to
    pub session_url: String,

    pub order_id: Uuid,
}

impl From<CheckoutCreated> for CheckoutCreatedResponse {
    fn from(created: CheckoutCreated) -> Self {
        Self {
            session_id: created.payment_reference,
            session_url: created.session_url,
            order_id: created.order.into(),
        }
    }
}

/// Create Checkout Handler
///
/// Turns the session cart into a pending order and opens a hosted payment
/// session for it.
#[endpoint(
    tags("checkout"),
    summary = "Checkout Cart",
    responses(
        (status_code = StatusCode::CREATED, description = "Pending order and payment session created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Empty cart or invalid email"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Event lines require a signed-in user"),
        (status_code = StatusCode::CONFLICT, description = "Item unavailable or event full"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateCheckoutRequest>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutCreatedResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let Some(session) = session_key(req) else {
        return Err(into_status_error(CheckoutError::EmptyCart));
    };

    let body = json.into_inner();

    let created = state
        .app
        .checkout
        .checkout(CheckoutRequest {
            session,
            email: body.user_email,
            user: depot.identity().map(|identity| identity.user),
            success_url: body.success_url,
            cancel_url: body.cancel_url,
        })
        .await
        .map_err(into_status_error)?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(created.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use storefront_app::domain::{
        bookings::BookingError, catalog::records::ItemRef, orders::OrderUuid,
    };

    use crate::test_helpers::{
        Mocks, as_identity, customer, make_service, strict_checkout_mock, with_cart_session,
    };

    use super::*;

    const SESSION: &str = "checkout_session_key";

    fn service(mocks: Mocks) -> Service {
        make_service(mocks, Router::with_path("checkout").post(handler))
    }

    fn created(order: OrderUuid) -> CheckoutCreated {
        CheckoutCreated {
            order,
            payment_reference: format!("cs_{order}"),
            session_url: format!("https://pay.example.test/{order}"),
        }
    }

    #[tokio::test]
    async fn test_checkout_creates_order_for_signed_in_user() -> TestResult {
        let identity = customer();
        let order = OrderUuid::new();

        let mut checkout = strict_checkout_mock();

        checkout
            .expect_checkout()
            .once()
            .withf(move |request| {
                request.session.as_str() == SESSION
                    && request.email == "buyer@example.com"
                    && request.user == Some(identity.user)
                    && request.success_url.as_deref() == Some("https://shop.test/{ORDER_ID}")
                    && request.cancel_url.is_none()
            })
            .return_once(move |_| Ok(created(order)));

        let mut res = as_identity(
            with_cart_session(TestClient::post("http://example.com/checkout"), SESSION),
            identity,
        )
        .json(&json!({
            "userEmail": "buyer@example.com",
            "successUrl": "https://shop.test/{ORDER_ID}",
        }))
        .send(&service(Mocks {
            checkout,
            ..Mocks::default()
        }))
        .await;

        let body: CheckoutCreatedResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(body.order_id, order.into_uuid());
        assert_eq!(body.session_id, format!("cs_{order}"));

        Ok(())
    }

    #[tokio::test]
    async fn test_guest_checkout_has_no_user() -> TestResult {
        let order = OrderUuid::new();

        let mut checkout = strict_checkout_mock();

        checkout
            .expect_checkout()
            .once()
            .withf(|request| request.user.is_none())
            .return_once(move |_| Ok(created(order)));

        let res = with_cart_session(TestClient::post("http://example.com/checkout"), SESSION)
            .json(&json!({ "userEmail": "guest@example.com" }))
            .send(&service(Mocks {
                checkout,
                ..Mocks::default()
            }))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        Ok(())
    }

    #[tokio::test]
    async fn test_without_cart_session_returns_400() -> TestResult {
        let res = TestClient::post("http://example.com/checkout")
            .json(&json!({ "userEmail": "buyer@example.com" }))
            .send(&service(Mocks::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_full_event_returns_409() -> TestResult {
        let mut checkout = strict_checkout_mock();

        checkout
            .expect_checkout()
            .once()
            .return_once(|_| Err(CheckoutError::Booking(BookingError::CapacityExceeded)));

        let res = as_identity(
            with_cart_session(TestClient::post("http://example.com/checkout"), SESSION),
            customer(),
        )
        .json(&json!({ "userEmail": "buyer@example.com" }))
        .send(&service(Mocks {
            checkout,
            ..Mocks::default()
        }))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_unpublished_item_returns_409() -> TestResult {
        let mut checkout = strict_checkout_mock();

        checkout.expect_checkout().once().return_once(|_| {
            Err(CheckoutError::ItemUnavailable(ItemRef::Course(
                Uuid::now_v7().into(),
            )))
        });

        let res = with_cart_session(TestClient::post("http://example.com/checkout"), SESSION)
            .json(&json!({ "userEmail": "buyer@example.com" }))
            .send(&service(Mocks {
                checkout,
                ..Mocks::default()
            }))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_guest_event_checkout_returns_401() -> TestResult {
        let mut checkout = strict_checkout_mock();

        checkout
            .expect_checkout()
            .once()
            .return_once(|_| Err(CheckoutError::AuthenticationRequired));

        let res = with_cart_session(TestClient::post("http://example.com/checkout"), SESSION)
            .json(&json!({ "userEmail": "buyer@example.com" }))
            .send(&service(Mocks {
                checkout,
                ..Mocks::default()
            }))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
