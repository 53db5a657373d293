//! Identity middleware.
//!
//! Authentication happens upstream. The gateway forwards the caller as
//! `x-user-id` and `x-user-role`; requests without `x-user-id` are anonymous.

use salvo::prelude::*;
use tracing::debug;
use uuid::Uuid;

use storefront_app::identity::{Identity, Role};

use crate::extensions::*;

pub(crate) const USER_ID_HEADER: &str = "x-user-id";
pub(crate) const USER_ROLE_HEADER: &str = "x-user-role";

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    match extract_identity(req) {
        Ok(Some(identity)) => {
            debug!(user = %identity.user, role = %identity.role, "request identity");

            depot.insert_identity(identity);
        }
        Ok(None) => {}
        Err(brief) => {
            res.render(StatusError::unauthorized().brief(brief));

            return;
        }
    }

    ctrl.call_next(req, depot, res).await;
}

fn extract_identity(req: &Request) -> Result<Option<Identity>, &'static str> {
    let Some(user) = header_value(req, USER_ID_HEADER) else {
        return Ok(None);
    };

    let user = Uuid::try_parse(user).map_err(|_ignored| "Invalid x-user-id header")?;

    let role = match header_value(req, USER_ROLE_HEADER) {
        Some(role) => role
            .parse::<Role>()
            .map_err(|_ignored| "Invalid x-user-role header")?,
        None => Role::default(),
    };

    Ok(Some(Identity::new(user.into(), role)))
}

fn header_value<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
