//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use storefront_app::identity::Identity;

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_identity(&mut self, identity: Identity);

    /// The caller's identity, if the gateway supplied one.
    fn identity(&self) -> Option<Identity>;

    fn identity_or_401(&self) -> Result<Identity, StatusError>;

    fn admin_or_403(&self) -> Result<Identity, StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_identity(&mut self, identity: Identity) {
        self.inject(identity);
    }

    fn identity(&self) -> Option<Identity> {
        self.obtain::<Identity>().ok().copied()
    }

    fn identity_or_401(&self) -> Result<Identity, StatusError> {
        self.identity()
            .ok_or_else(|| StatusError::unauthorized().brief("Sign in required"))
    }

    fn admin_or_403(&self) -> Result<Identity, StatusError> {
        let identity = self.identity_or_401()?;

        if identity.is_admin() {
            Ok(identity)
        } else {
            Err(StatusError::forbidden().brief("Admin role required"))
        }
    }
}
