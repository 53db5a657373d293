//! Stop accepting connections on Ctrl+C or SIGTERM and drain in-flight requests.

use std::{io, time::Duration};

use salvo::server::ServerHandle;
use thiserror::Error;
use tokio::signal;
use tracing::info;

#[derive(Debug, Error)]
#[error("failed to install {signal} handler: {source}")]
pub(crate) struct ShutdownSignalError {
    signal: &'static str,
    #[source]
    source: io::Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Signal {
    Interrupt,
    Terminate,
}

impl Signal {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        }
    }
}

async fn interrupt() -> Result<Signal, ShutdownSignalError> {
    signal::ctrl_c()
        .await
        .map(|()| Signal::Interrupt)
        .map_err(|source| ShutdownSignalError {
            signal: Signal::Interrupt.as_str(),
            source,
        })
}

#[cfg(unix)]
async fn terminate() -> Result<Signal, ShutdownSignalError> {
    let mut stream = signal::unix::signal(signal::unix::SignalKind::terminate()).map_err(
        |source| ShutdownSignalError {
            signal: Signal::Terminate.as_str(),
            source,
        },
    )?;

    stream.recv().await;

    Ok(Signal::Terminate)
}

#[cfg(not(unix))]
async fn terminate() -> Result<Signal, ShutdownSignalError> {
    std::future::pending().await
}

/// Wait for the first shutdown signal, then stop `handle` with `grace` as the drain deadline.
pub(crate) async fn listen(
    handle: ServerHandle,
    grace: Option<Duration>,
) -> Result<(), ShutdownSignalError> {
    let received = tokio::select! {
        result = interrupt() => result?,
        result = terminate() => result?,
    };

    info!(
        signal = received.as_str(),
        grace_seconds = grace.map(|grace| grace.as_secs()),
        "shutdown requested, draining in-flight requests"
    );

    handle.stop_graceful(grace);

    Ok(())
}
