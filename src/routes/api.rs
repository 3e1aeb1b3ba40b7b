use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, translator};
use crate::state::AppState;
use std::sync::Arc;

/// Create the public HTTP router
///
/// - `GET /` - Service name, version and endpoint paths
/// - `GET /api/status` - Liveness and active session count
/// - `GET /translator` - Browser capture page
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::root))
        .route("/api/status", get(api::status))
        .route("/translator", get(translator::translator_page))
        .layer(TraceLayer::new_for_http())
}
