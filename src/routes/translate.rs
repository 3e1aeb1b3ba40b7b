//! Translation WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::translate_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the translation WebSocket router
///
/// # Endpoint
///
/// `GET /ws/translate` - WebSocket upgrade into a relay session
///
/// # Protocol
///
/// Client sends:
/// - `{"type":"start"}` to clear the provider's audio buffer
/// - Binary audio frames (PCM 16-bit LE, 24kHz, mono)
/// - `{"type":"stop"}` to commit the audio and request a translation
///
/// Server responds with:
/// - `{"type":"ready"}` once the upstream session is configured
/// - `{"type":"audio","delta":"<base64 pcm16>"}` for translated speech
/// - `{"type":"text","delta":"..."}` for translated text
/// - `{"type":"error","message":"..."}` on failures
pub fn create_translate_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/translate", get(translate_handler))
        .layer(TraceLayer::new_for_http())
}
