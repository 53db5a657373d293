//! Cart session cookie.

use salvo::{
    http::cookie::{Cookie, SameSite},
    prelude::*,
};
use tracing::debug;

use storefront_app::domain::carts::records::SessionKey;

pub(crate) const CART_SESSION_COOKIE: &str = "cart_session";

/// The session key carried by the request, if any. Malformed cookies are
/// treated as absent so the client simply gets a fresh cart.
pub(crate) fn session_key(req: &Request) -> Option<SessionKey> {
    let cookie = req.cookie(CART_SESSION_COOKIE)?;

    match SessionKey::parse(cookie.value()) {
        Ok(session) => Some(session),
        Err(error) => {
            debug!("ignoring cart session cookie: {error}");

            None
        }
    }
}

pub(crate) fn set_session_cookie(res: &mut Response, session: &SessionKey) {
    let cookie = Cookie::build((CART_SESSION_COOKIE, session.as_str().to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    res.add_cookie(cookie);
}
