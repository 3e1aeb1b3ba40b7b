//! Upstream session client for the OpenAI Realtime API.
//!
//! # API Reference
//!
//! - Endpoint: `wss://api.openai.com/v1/realtime?model=<model>`
//! - Protocol: WebSocket with JSON events
//! - Audio: PCM 16-bit, 24kHz, mono, little-endian, base64 encoded
//!
//! The client does not own a task. The relay session drives it: it calls
//! [`OpenAIRealtime::open`] once, feeds every [`UpstreamSignal`] back into
//! [`OpenAIRealtime::on_open`], [`OpenAIRealtime::decode`] and
//! [`OpenAIRealtime::on_closed`], and pushes client events through the gated
//! [`OpenAIRealtime::send`].

use http::HeaderValue;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tracing::{debug, info, warn};

use super::config::{InterpreterConfig, OPENAI_BETA_HEADER};
use super::messages::{
    ClientEvent, InputAudioTranscription, ServerEvent, SessionConfig, audio_and_text,
};
use crate::core::realtime::base::{
    RealtimeError, RealtimeResult, UpstreamConnector, UpstreamEvent, UpstreamLink, UpstreamSignal,
};

/// Message forwarded when the provider reports an error without text.
pub const DEFAULT_PROVIDER_ERROR: &str = "OpenAI reported an error.";

/// Counters kept for the teardown summary.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamStats {
    /// Events written to the upstream link
    pub sent: u64,
    /// Events discarded because the session was not ready
    pub dropped: u64,
    /// Upstream frames that failed to decode
    pub decode_failures: u64,
}

/// OpenAI Realtime client for one interpreter session.
///
/// Outbound sends are gated on `ready`, which only becomes true after the
/// `session.update` handshake has been written. Sends before that are
/// dropped, never queued.
pub struct OpenAIRealtime {
    config: InterpreterConfig,
    link: Option<UpstreamLink>,
    ready: bool,
    session_id: Option<String>,
    stats: UpstreamStats,
}

impl OpenAIRealtime {
    /// Create a client. The API key must be non-empty.
    pub fn new(config: InterpreterConfig) -> RealtimeResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "API key is required for OpenAI Realtime".to_string(),
            ));
        }

        Ok(Self {
            config,
            link: None,
            ready: false,
            session_id: None,
            stats: UpstreamStats::default(),
        })
    }

    /// Build the WebSocket upgrade request with auth headers.
    pub fn build_request(&self) -> RealtimeResult<Request> {
        let url = self.config.build_ws_url()?;
        let mut request = url
            .into_client_request()
            .map_err(|e| RealtimeError::InvalidConfiguration(e.to_string()))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
            .map_err(|e| RealtimeError::InvalidConfiguration(format!("Invalid API key: {e}")))?;
        let headers = request.headers_mut();
        headers.insert(http::header::AUTHORIZATION, bearer);
        headers.insert("OpenAI-Beta", HeaderValue::from_static(OPENAI_BETA_HEADER));

        Ok(request)
    }

    /// Start dialing the upstream socket. Returns once the connection task
    /// exists; nothing is sent until [`Self::on_open`].
    pub fn open(
        &mut self,
        connector: &dyn UpstreamConnector,
        signals: mpsc::UnboundedSender<UpstreamSignal>,
    ) -> RealtimeResult<()> {
        if self.link.is_some() {
            return Ok(());
        }

        let request = self.build_request()?;
        let link = connector.connect(request, signals)?;
        info!(model = %self.config.model, "Opening OpenAI Realtime connection");
        self.link = Some(link);
        Ok(())
    }

    fn build_session_config(&self) -> SessionConfig {
        SessionConfig {
            instructions: Some(self.config.instructions()),
            modalities: Some(audio_and_text()),
            voice: Some(self.config.voice.clone()),
            input_audio_transcription: Some(InputAudioTranscription {
                model: self.config.transcription_model.clone(),
            }),
        }
    }

    /// Handle the upstream open event: send `session.update`, then open the gate.
    pub fn on_open(&mut self) -> RealtimeResult<UpstreamEvent> {
        let session = self.build_session_config();
        self.write(&ClientEvent::SessionUpdate { session })?;
        self.ready = true;
        info!(voice = %self.config.voice, "OpenAI Realtime session configured");
        Ok(UpstreamEvent::Ready)
    }

    /// Send an event if the session is ready. Returns whether it was written.
    pub fn send(&mut self, event: ClientEvent) -> bool {
        if !self.ready {
            self.stats.dropped += 1;
            debug!(
                event_type = event.event_type(),
                "Dropping upstream event, session not ready"
            );
            return false;
        }

        match self.write(&event) {
            Ok(()) => true,
            Err(e) => {
                warn!(event_type = event.event_type(), "Failed to send upstream event: {}", e);
                false
            }
        }
    }

    fn write(&mut self, event: &ClientEvent) -> RealtimeResult<()> {
        let link = self.link.as_ref().ok_or(RealtimeError::NotConnected)?;
        let json = serde_json::to_string(event)
            .map_err(|e| RealtimeError::SerializationError(e.to_string()))?;
        link.send_text(json)?;
        self.stats.sent += 1;
        Ok(())
    }

    /// Decode one upstream text frame into the event the relay forwards.
    ///
    /// Returns `None` for ignored types, empty deltas and malformed JSON.
    pub fn decode(&mut self, text: &str) -> Option<UpstreamEvent> {
        let event = match serde_json::from_str::<ServerEvent>(text) {
            Ok(event) => event,
            Err(e) => {
                self.stats.decode_failures += 1;
                warn!("Failed to parse server event: {}", e);
                return Self::salvage_error(text);
            }
        };

        match event {
            ServerEvent::ResponseAudioDelta { delta } => delta
                .filter(|d| !d.is_empty())
                .map(UpstreamEvent::AudioDelta),
            ServerEvent::ResponseTextDelta { delta } => delta
                .filter(|d| !d.is_empty())
                .map(UpstreamEvent::TextDelta),
            ServerEvent::Error { error } => {
                let message = error
                    .and_then(|e| e.message)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_PROVIDER_ERROR.to_string());
                warn!("OpenAI Realtime error: {}", message);
                Some(UpstreamEvent::Error(message))
            }
            ServerEvent::SessionCreated { session } | ServerEvent::SessionUpdated { session } => {
                if let Some(id) = session.and_then(|s| s.id) {
                    debug!(session_id = %id, "OpenAI Realtime session acknowledged");
                    self.session_id = Some(id);
                }
                None
            }
            ServerEvent::ResponseDone => {
                debug!("OpenAI Realtime response done");
                None
            }
            ServerEvent::Unknown => None,
        }
    }

    /// An `error` event whose payload does not match the typed shape is
    /// still reported, with its message when one is readable.
    fn salvage_error(text: &str) -> Option<UpstreamEvent> {
        let value = serde_json::from_str::<serde_json::Value>(text).ok()?;
        if value.get("type").and_then(|t| t.as_str()) != Some("error") {
            return None;
        }
        let message = value
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_PROVIDER_ERROR);
        Some(UpstreamEvent::Error(message.to_string()))
    }

    /// Handle the upstream socket going away.
    pub fn on_closed(&mut self) -> UpstreamEvent {
        self.ready = false;
        self.link = None;
        UpstreamEvent::SessionClosed
    }

    /// Close the upstream socket. Idempotent.
    pub fn close(&mut self) {
        self.ready = false;
        if let Some(link) = self.link.take() {
            link.close();
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether a connection task has been started and not yet reported closed.
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn stats(&self) -> UpstreamStats {
        self.stats
    }
}
