//! HTTP and WebSocket request handlers
//!
//! - `api` - Root description and status endpoint
//! - `translator` - Static browser capture page
//! - `translate` - Translation relay WebSocket

pub mod api;
pub mod translate;
pub mod translator;

pub use translate::translate_handler;
