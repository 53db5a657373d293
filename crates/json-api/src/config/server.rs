//! Listener and shutdown settings.

use std::time::Duration;

use clap::Args;

#[derive(Debug, Args)]
pub struct ServerRuntimeConfig {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds to let in-flight requests finish after a shutdown signal; 0 waits indefinitely.
    #[arg(long, env = "SHUTDOWN_GRACE_SECONDS", default_value_t = 30)]
    pub shutdown_grace_seconds: u64,
}

impl ServerRuntimeConfig {
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Drain deadline handed to the server; `None` lets requests run to completion.
    #[must_use]
    pub fn shutdown_grace(&self) -> Option<Duration> {
        (self.shutdown_grace_seconds > 0)
            .then_some(Duration::from_secs(self.shutdown_grace_seconds))
    }
}
