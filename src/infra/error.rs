use std::{io, net::SocketAddr, path::PathBuf};

use thiserror::Error;

/// Failures while bringing up or running the server processes.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("content directory `{}` does not exist", .path.display())]
    MissingContentRoot { path: PathBuf },
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("listener stopped unexpectedly")]
    Serve(#[source] io::Error),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn bind(addr: SocketAddr) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Bind { addr, source }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
