//! Browser capture page.

use axum::response::Html;

const TRANSLATOR_HTML: &str = include_str!("../../static/translator.html");

/// Serve the microphone capture and playback page.
pub async fn translator_page() -> Html<&'static str> {
    Html(TRANSLATOR_HTML)
}
