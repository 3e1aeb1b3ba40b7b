pub mod api;
pub mod translate;

use axum::{Router, middleware};
use http::{Method, header::CONTENT_TYPE};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::middleware::connection_limit_middleware;
use crate::state::AppState;

/// Assemble the full application: public routes, the translation WebSocket
/// behind the connection limit middleware, CORS and security headers.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`; the
/// connection limit middleware needs the peer address.
pub fn create_app(state: Arc<AppState>) -> Router {
    let translate_routes =
        translate::create_translate_router().layer(middleware::from_fn_with_state(
            state.clone(),
            connection_limit_middleware,
        ));

    let cors_layer = cors_layer(state.config.cors_allowed_origins.as_deref());

    // Security headers
    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ));

    api::create_api_router()
        .merge(translate_routes)
        .with_state(state)
        .layer(cors_layer)
        .layer(security_headers)
}

fn cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE])
            .allow_credentials(false),
        Some(origins) => {
            // Parse comma-separated origins
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE])
                .allow_credentials(true)
        }
        None => {
            info!(
                "CORS not configured, defaulting to same-origin only. \
                 Set CORS_ALLOWED_ORIGINS to enable cross-origin access."
            );
            // No allow_origin = same-origin only
            CorsLayer::new()
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE])
                .allow_credentials(false)
        }
    }
}
