//! ARGOS Oracle - service status endpoint
//!
//! A small HTTP service that reports whether the oracle is up. Configuration is
//! read once from the environment, threaded through an explicit [`AppState`],
//! and served by an axum router on a configurable listener.

pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{AppConfig, ConfigError, EnvSnapshot};
pub use error::StartupError;
pub use routes::create_router;
pub use state::AppState;
