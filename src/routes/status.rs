//! Service status endpoint.
//!
//! Returns a fixed payload naming the service. Used as the liveness probe by
//! load balancers and container orchestration.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Body returned by `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub status: String,
}

impl StatusPayload {
    /// Payload announcing that the service titled `title` is up.
    pub fn active(title: &str) -> Self {
        Self {
            status: format!("{} is active", title),
        }
    }
}

/// Status handler.
///
/// Built fresh on every request; there is nothing to compute or fail.
pub async fn index(State(state): State<AppState>) -> Json<StatusPayload> {
    Json(StatusPayload::active(state.title()))
}
