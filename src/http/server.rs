//! HTTP server startup logic.

use std::net::{SocketAddr, TcpListener};

use axum::Router;
use axum_server::Handle;

use crate::config::{AppConfig, HttpServerConfig};

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// A listening socket that has not started serving yet.
#[derive(Debug)]
pub struct BoundListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

/// Bind the configured address.
///
/// The socket is listening once this returns, so connections made before
/// [`BoundListener::serve`] is awaited queue in the backlog.
pub fn bind(config: &HttpServerConfig) -> Result<BoundListener, ServerError> {
    let addr = config.socket_addr();
    let bind_err = |source| ServerError::Bind { addr, source };

    let listener = TcpListener::bind(addr).map_err(bind_err)?;
    listener.set_nonblocking(true).map_err(bind_err)?;
    let local_addr = listener.local_addr().map_err(bind_err)?;

    Ok(BoundListener {
        listener,
        local_addr,
    })
}

impl BoundListener {
    /// Address actually bound; differs from the configured one when port 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve `app` until `handle` is shut down.
    pub async fn serve(self, app: Router, handle: Handle) -> Result<(), ServerError> {
        axum_server::from_tcp(self.listener)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .map_err(ServerError::Serve)
    }
}

/// Start the HTTP server based on configuration.
///
/// This function blocks until the server shuts down.
pub async fn start_server(app: Router, config: &AppConfig) -> Result<(), ServerError> {
    // Signal handlers go in before the port accepts connections
    let handle = Handle::new();
    shutdown::setup_shutdown_handler(handle.clone(), config.http.shutdown_timeout);

    let listener = bind(&config.http)?;
    tracing::info!(
        addr = %listener.local_addr(),
        title = %config.app.title,
        "Starting HTTP server"
    );

    listener.serve(app, handle).await
}
