//! Realtime upstream provider module.
//!
//! # Architecture
//!
//! - `UpstreamConnector` opens sockets; `WebSocketConnector` is the real one
//! - A connection task reports `UpstreamSignal`s and accepts frames through `UpstreamLink`
//! - `OpenAIRealtime` turns signals into `UpstreamEvent`s and gates outbound sends
//!
//! # Audio Format
//!
//! PCM 16-bit signed little-endian, 24kHz, mono, base64 on the wire.

mod base;
mod connector;
pub mod openai;

pub use base::{
    RealtimeError, RealtimeResult, UpstreamConnector, UpstreamEvent, UpstreamFrame, UpstreamLink,
    UpstreamSignal,
};
pub use connector::WebSocketConnector;
pub use openai::{InterpreterConfig, OpenAIRealtime};
