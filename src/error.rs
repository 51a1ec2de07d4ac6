use crate::config::ConfigError;
use crate::http::ServerError;

/// Fatal startup failure. Any of these ends the process with a non-zero status.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

impl StartupError {
    /// Whether this failed before logging was initialized.
    pub fn is_config(&self) -> bool {
        matches!(self, StartupError::Config(_))
    }
}
