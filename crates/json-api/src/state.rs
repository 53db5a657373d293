//! Shared handler state.

use std::sync::Arc;

use storefront_app::context::AppContext;

/// Injected into every request; handlers reach services through `app`.
#[derive(Clone, Debug)]
pub(crate) struct State {
    pub(crate) app: AppContext,
}

impl State {
    pub(crate) fn shared(app: AppContext) -> Arc<Self> {
        Arc::new(Self { app })
    }
}
