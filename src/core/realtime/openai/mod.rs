//! OpenAI Realtime API upstream.
//!
//! - `config`: endpoint, model, voice and prompt settings
//! - `messages`: client and server event types
//! - `client`: the gated upstream session client

mod client;
mod config;
pub mod messages;

pub use client::{DEFAULT_PROVIDER_ERROR, OpenAIRealtime, UpstreamStats};
pub use config::{
    DEFAULT_REALTIME_MODEL, DEFAULT_TARGET_LANGUAGE, DEFAULT_TRANSCRIPTION_MODEL, DEFAULT_VOICE,
    InterpreterConfig, OPENAI_BETA_HEADER, OPENAI_REALTIME_SAMPLE_RATE, OPENAI_REALTIME_URL,
};
pub use messages::{ClientEvent, ServerEvent};
