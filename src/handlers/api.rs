//! Root and status endpoints.

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::state::AppState;

/// Paths advertised by the root endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoints {
    pub translator: String,
    pub websocket: String,
    pub status: String,
}

/// Payload of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub endpoints: Endpoints,
}

/// Payload of `GET /api/status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
    /// RFC 3339 UTC timestamp
    pub timestamp: String,
    pub active_sessions: usize,
}

/// Describe the service and where to find it.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: Endpoints {
            translator: "/translator".to_string(),
            websocket: "/ws/translate".to_string(),
            status: "/api/status".to_string(),
        },
    })
}

/// Liveness plus the number of live relay sessions.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    Json(StatusResponse {
        status: "ok".to_string(),
        timestamp,
        active_sessions: state.active_sessions(),
    })
}
