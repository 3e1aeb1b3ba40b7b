//! Messages exchanged with the browser on `/ws/translate`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::realtime::UpstreamEvent;

/// JSON messages sent to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelayOutgoingMessage {
    /// Upstream is configured; audio may be streamed.
    Ready,
    /// Base64 PCM16 chunk of translated speech.
    Audio { delta: String },
    /// Chunk of translated text.
    Text { delta: String },
    Error { message: String },
}

impl RelayOutgoingMessage {
    /// Map an upstream event to its downstream envelope.
    pub fn from_upstream(event: UpstreamEvent) -> Option<Self> {
        match event {
            UpstreamEvent::Ready => Some(RelayOutgoingMessage::Ready),
            UpstreamEvent::AudioDelta(delta) => Some(RelayOutgoingMessage::Audio { delta }),
            UpstreamEvent::TextDelta(delta) => Some(RelayOutgoingMessage::Text { delta }),
            UpstreamEvent::Error(message) => Some(RelayOutgoingMessage::Error { message }),
            UpstreamEvent::SessionClosed => None,
        }
    }
}

/// Work items for the downstream writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownstreamRoute {
    Outgoing(RelayOutgoingMessage),
    Close,
}

/// What the downstream socket reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownstreamEvent {
    Text(String),
    Binary(Bytes),
    Closed,
    Error(String),
}
