//! HTTP listener module.
//!
//! Binding and serving are separate steps so that a bind failure (port already
//! in use, address not available) is reported before anything is served. The
//! server drains open connections on SIGTERM/SIGINT.

mod server;
mod shutdown;

pub use server::{bind, start_server, BoundListener, ServerError};
pub use shutdown::setup_shutdown_handler;
