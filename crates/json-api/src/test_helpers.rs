//! Test helpers.

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*, test::RequestBuilder};

use storefront_app::{
    context::AppContext,
    domain::{
        bookings::MockBookingsService, carts::MockCartsService, catalog::MockCatalogService,
        checkout::MockCheckoutService, downloads::MockDownloadsService,
        fulfillment::MockFulfillmentService,
    },
    identity::{Identity, Role, UserUuid},
};

use crate::{
    carts::CART_SESSION_COOKIE,
    identity::middleware::{self, USER_ID_HEADER, USER_ROLE_HEADER},
    state::State,
};

/// One mock per service. Unset fields fail the test if called.
pub(crate) struct Mocks {
    pub(crate) catalog: MockCatalogService,
    pub(crate) carts: MockCartsService,
    pub(crate) checkout: MockCheckoutService,
    pub(crate) fulfillment: MockFulfillmentService,
    pub(crate) bookings: MockBookingsService,
    pub(crate) downloads: MockDownloadsService,
}

impl Default for Mocks {
    fn default() -> Self {
        Self {
            catalog: strict_catalog_mock(),
            carts: strict_carts_mock(),
            checkout: strict_checkout_mock(),
            fulfillment: strict_fulfillment_mock(),
            bookings: strict_bookings_mock(),
            downloads: strict_downloads_mock(),
        }
    }
}

fn strict_catalog_mock() -> MockCatalogService {
    let mut catalog = MockCatalogService::new();

    catalog.expect_get_item().never();

    catalog
}

pub(crate) fn strict_carts_mock() -> MockCartsService {
    let mut carts = MockCartsService::new();

    carts.expect_get_cart().never();
    carts.expect_add_item().never();
    carts.expect_remove_item().never();
    carts.expect_clear().never();

    carts
}

pub(crate) fn strict_checkout_mock() -> MockCheckoutService {
    let mut checkout = MockCheckoutService::new();

    checkout.expect_checkout().never();
    checkout.expect_book_event().never();

    checkout
}

pub(crate) fn strict_fulfillment_mock() -> MockFulfillmentService {
    let mut fulfillment = MockFulfillmentService::new();

    fulfillment.expect_handle_webhook().never();
    fulfillment.expect_process_event().never();
    fulfillment.expect_confirm().never();
    fulfillment.expect_request_refund().never();

    fulfillment
}

pub(crate) fn strict_bookings_mock() -> MockBookingsService {
    let mut bookings = MockBookingsService::new();

    bookings.expect_get_booking().never();
    bookings.expect_cancel_booking().never();
    bookings.expect_release_stale().never();

    bookings
}

pub(crate) fn strict_downloads_mock() -> MockDownloadsService {
    let mut downloads = MockDownloadsService::new();

    downloads.expect_authorize().never();
    downloads.expect_check_download_limit().never();
    downloads.expect_download().never();

    downloads
}

pub(crate) fn state_with(mocks: Mocks) -> Arc<State> {
    State::shared(AppContext {
        catalog: Arc::new(mocks.catalog),
        carts: Arc::new(mocks.carts),
        checkout: Arc::new(mocks.checkout),
        fulfillment: Arc::new(mocks.fulfillment),
        bookings: Arc::new(mocks.bookings),
        downloads: Arc::new(mocks.downloads),
    })
}

/// A service with state injected and the identity middleware in front of `route`.
pub(crate) fn make_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with(mocks)))
            .hoop(middleware::handler)
            .push(route),
    )
}

pub(crate) fn customer() -> Identity {
    Identity::new(UserUuid::new(), Role::Customer)
}

pub(crate) fn admin() -> Identity {
    Identity::new(UserUuid::new(), Role::Admin)
}

pub(crate) fn as_identity(request: RequestBuilder, identity: Identity) -> RequestBuilder {
    request
        .add_header(USER_ID_HEADER, identity.user.to_string(), true)
        .add_header(USER_ROLE_HEADER, identity.role.as_str(), true)
}

pub(crate) fn with_cart_session(request: RequestBuilder, session: &str) -> RequestBuilder {
    request.add_header("cookie", format!("{CART_SESSION_COOKIE}={session}"), true)
}
