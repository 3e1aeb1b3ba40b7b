//! Provider-agnostic types for upstream realtime sessions.
//!
//! The upstream socket is owned by a background connection task. The task
//! reports what happens on the socket as [`UpstreamSignal`]s and accepts
//! outbound frames through an [`UpstreamLink`]. Dialing is abstracted behind
//! [`UpstreamConnector`] so sessions can be driven without a network.

use std::fmt;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::client::Request;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during realtime operations.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The connection task is gone
    #[error("Not connected")]
    NotConnected,
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Events
// =============================================================================

/// Raw notifications produced by an upstream connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamSignal {
    /// The WebSocket handshake completed.
    Opened,
    /// A text frame arrived.
    Message(String),
    /// The socket closed, failed, or could not be opened.
    Closed { reason: Option<String> },
}

/// Decoded provider event, as seen by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// Session configuration was sent and the gate is open.
    Ready,
    /// Base64 PCM16 chunk of translated speech.
    AudioDelta(String),
    /// Chunk of translated text.
    TextDelta(String),
    /// Provider-reported fault.
    Error(String),
    /// The upstream socket is gone.
    SessionClosed,
}

impl fmt::Display for UpstreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamEvent::Ready => write!(f, "ready"),
            UpstreamEvent::AudioDelta(_) => write!(f, "audio_delta"),
            UpstreamEvent::TextDelta(_) => write!(f, "text_delta"),
            UpstreamEvent::Error(_) => write!(f, "error"),
            UpstreamEvent::SessionClosed => write!(f, "session_closed"),
        }
    }
}

// =============================================================================
// Connection Plumbing
// =============================================================================

/// Frames accepted by an upstream connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFrame {
    Text(String),
    Close,
}

/// Sending half of an upstream connection.
///
/// Sends never block. Frames queued before the handshake completes are
/// flushed once the socket is open.
#[derive(Debug, Clone)]
pub struct UpstreamLink {
    tx: mpsc::UnboundedSender<UpstreamFrame>,
}

impl UpstreamLink {
    pub fn new(tx: mpsc::UnboundedSender<UpstreamFrame>) -> Self {
        Self { tx }
    }

    /// Queue a text frame for the upstream socket.
    pub fn send_text(&self, text: String) -> RealtimeResult<()> {
        self.tx
            .send(UpstreamFrame::Text(text))
            .map_err(|_| RealtimeError::NotConnected)
    }

    /// Ask the connection task to close the socket. Safe to call repeatedly.
    pub fn close(&self) {
        let _ = self.tx.send(UpstreamFrame::Close);
    }

    /// Whether the connection task has finished.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Opens upstream WebSocket connections.
///
/// `connect` must not block: it validates the request, spawns whatever task
/// owns the socket and returns immediately. The task reports through
/// `signals` and ends with exactly one [`UpstreamSignal::Closed`].
pub trait UpstreamConnector: Send + Sync {
    fn connect(
        &self,
        request: Request,
        signals: mpsc::UnboundedSender<UpstreamSignal>,
    ) -> RealtimeResult<UpstreamLink>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_reports_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let link = UpstreamLink::new(tx);
        assert!(link.send_text("{}".to_string()).is_ok());
        drop(rx);
        assert!(link.is_closed());
        assert!(matches!(
            link.send_text("{}".to_string()),
            Err(RealtimeError::NotConnected)
        ));
        // closing a dead link is a no-op
        link.close();
    }

    #[test]
    fn test_upstream_event_display() {
        assert_eq!(UpstreamEvent::Ready.to_string(), "ready");
        assert_eq!(
            UpstreamEvent::AudioDelta("AAAA".into()).to_string(),
            "audio_delta"
        );
        assert_eq!(UpstreamEvent::SessionClosed.to_string(), "session_closed");
    }
}
