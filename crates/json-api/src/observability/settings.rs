//! Request middleware settings, installed once at startup.

use std::{sync::OnceLock, time::Duration};

use crate::config::observability::ObservabilityConfig;

#[derive(Clone, Copy, Debug)]
pub(super) struct RequestSettings {
    pub(super) slow_request_threshold: Duration,
    pub(super) propagate_parent: bool,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            slow_request_threshold: Duration::from_secs(1),
            propagate_parent: false,
        }
    }
}

impl From<&ObservabilityConfig> for RequestSettings {
    fn from(config: &ObservabilityConfig) -> Self {
        Self {
            slow_request_threshold: config.slow_request_threshold(),
            propagate_parent: config.otel.propagates_parent(),
        }
    }
}

static SETTINGS: OnceLock<RequestSettings> = OnceLock::new();

/// The first install wins.
pub(super) fn install(config: &ObservabilityConfig) {
    _ = SETTINGS.set(RequestSettings::from(config));
}

/// Installed settings, or defaults when running without [`install`].
pub(super) fn current() -> RequestSettings {
    SETTINGS.get().copied().unwrap_or_default()
}
