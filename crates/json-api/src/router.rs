//! App Router

use salvo::Router;

use crate::{bookings, carts, checkout, downloads, identity, orders, webhooks};

pub(crate) fn app_router() -> Router {
    Router::new()
        .hoop(identity::middleware::handler)
        .push(
            Router::with_path("cart").get(carts::get::handler).push(
                Router::with_path("items")
                    .post(carts::add_item::handler)
                    .push(
                        Router::with_path("{item_type}/{item_id}")
                            .delete(carts::remove_item::handler),
                    ),
            ),
        )
        .push(
            Router::with_path("checkout")
                .post(checkout::create::handler)
                .push(Router::with_path("{order}/confirm").post(checkout::confirm::handler)),
        )
        .push(Router::with_path("webhooks/payments").post(webhooks::payments::handler))
        .push(Router::with_path("events/{event}/bookings").post(bookings::create::handler))
        .push(Router::with_path("bookings/{booking}").get(bookings::get::handler))
        .push(
            Router::with_path("downloads/{product}")
                .get(downloads::get::handler)
                .push(Router::with_path("authorize").post(downloads::authorize::handler)),
        )
        .push(
            Router::with_path("admin")
                .push(Router::with_path("orders/{order}/refund").post(orders::refund::handler))
                .push(
                    Router::with_path("bookings/{booking}/cancel").post(bookings::cancel::handler),
                ),
        )
}
