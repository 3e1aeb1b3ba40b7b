//! Relay session state machine.
//!
//! One [`RelaySession`] bridges one browser socket and one upstream
//! Realtime socket. Every event from either side goes through
//! [`RelaySession::handle`], so handlers never interleave.
//!
//! ```text
//! Connecting -> AwaitingUpstreamReady -> Streaming -> Closing -> Closed
//!      |                 |                              ^
//!      +-----------------+------------------------------+
//! ```

use std::fmt;
use std::net::IpAddr;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::credential::{Credential, MISSING_CREDENTIAL_MESSAGE};
use super::frames;
use super::messages::{DownstreamEvent, DownstreamRoute, RelayOutgoingMessage};
use super::registry::{ConnectionId, SessionHandle, SessionRegistry};
use crate::core::realtime::openai::{InterpreterConfig, OpenAIRealtime};
use crate::core::realtime::{UpstreamConnector, UpstreamEvent, UpstreamSignal};

/// Error sent downstream when the upstream socket cannot be created.
pub const UPSTREAM_UNAVAILABLE_MESSAGE: &str = "Translation service is unavailable";

/// Lifecycle of a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    AwaitingUpstreamReady,
    Streaming,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::AwaitingUpstreamReady => write!(f, "AwaitingUpstreamReady"),
            SessionState::Streaming => write!(f, "Streaming"),
            SessionState::Closing => write!(f, "Closing"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}

/// Everything a session reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Downstream(DownstreamEvent),
    Upstream(UpstreamSignal),
    /// Server shutdown or registry cancellation.
    Shutdown,
}

/// Per-session counters, logged on teardown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Frames received from the browser
    pub frames_received: u64,
    /// Messages queued for the browser
    pub messages_sent: u64,
}

/// One browser connection paired with one upstream session.
pub struct RelaySession {
    id: ConnectionId,
    peer: Option<IpAddr>,
    state: SessionState,
    downstream: mpsc::UnboundedSender<DownstreamRoute>,
    downstream_open: bool,
    upstream: Option<OpenAIRealtime>,
    registry: SessionRegistry,
    registered: bool,
    cancel: CancellationToken,
    stats: RelayStats,
}

impl RelaySession {
    pub fn new(
        id: ConnectionId,
        peer: Option<IpAddr>,
        downstream: mpsc::UnboundedSender<DownstreamRoute>,
        registry: SessionRegistry,
    ) -> Self {
        Self {
            id,
            peer,
            state: SessionState::Connecting,
            downstream,
            downstream_open: true,
            upstream: None,
            registry,
            registered: false,
            cancel: CancellationToken::new(),
            stats: RelayStats::default(),
        }
    }

    /// Check the credential, register, and start dialing upstream.
    ///
    /// Without a credential the browser gets a single error message and the
    /// session ends without any upstream attempt or registry entry.
    pub fn start(
        &mut self,
        config: &InterpreterConfig,
        connector: &dyn UpstreamConnector,
        signals: mpsc::UnboundedSender<UpstreamSignal>,
    ) {
        if self.state != SessionState::Connecting {
            return;
        }

        if !Credential::check(Some(config.api_key.as_str())).is_present() {
            warn!(connection_id = %self.id, "Rejecting session: no provider credential configured");
            self.send_downstream(RelayOutgoingMessage::Error {
                message: MISSING_CREDENTIAL_MESSAGE.to_string(),
            });
            self.teardown("missing credential");
            return;
        }

        self.registered = self.registry.insert(
            self.id,
            SessionHandle::new(self.peer, self.cancel.clone()),
        );

        let opened = OpenAIRealtime::new(config.clone()).and_then(|mut client| {
            client.open(connector, signals)?;
            Ok(client)
        });

        match opened {
            Ok(client) => {
                self.upstream = Some(client);
                self.transition(SessionState::AwaitingUpstreamReady);
            }
            Err(e) => {
                error!(connection_id = %self.id, "Failed to open upstream session: {}", e);
                self.send_downstream(RelayOutgoingMessage::Error {
                    message: UPSTREAM_UNAVAILABLE_MESSAGE.to_string(),
                });
                self.teardown("upstream open failed");
            }
        }
    }

    /// Single dispatch point for all session events.
    pub fn handle(&mut self, event: SessionEvent) {
        if self.state == SessionState::Closed {
            debug!(connection_id = %self.id, "Ignoring event for closed session");
            return;
        }

        match event {
            SessionEvent::Downstream(event) => self.handle_downstream(event),
            SessionEvent::Upstream(signal) => self.handle_upstream(signal),
            SessionEvent::Shutdown => {
                self.send_downstream(RelayOutgoingMessage::Error {
                    message: "Server is shutting down".to_string(),
                });
                self.teardown("shutdown");
            }
        }
    }

    fn handle_downstream(&mut self, event: DownstreamEvent) {
        match event {
            DownstreamEvent::Text(text) => {
                self.stats.frames_received += 1;
                let Some(upstream) = self.upstream.as_mut() else {
                    return;
                };
                for client_event in frames::interpret_text(&text) {
                    upstream.send(client_event);
                }
            }
            DownstreamEvent::Binary(audio) => {
                self.stats.frames_received += 1;
                if let Some(upstream) = self.upstream.as_mut() {
                    upstream.send(frames::interpret_binary(&audio));
                }
            }
            DownstreamEvent::Closed => {
                info!(connection_id = %self.id, "Client closed the connection");
                self.downstream_open = false;
                self.teardown("client closed");
            }
            DownstreamEvent::Error(e) => {
                warn!(connection_id = %self.id, "Client WebSocket error: {}", e);
                self.downstream_open = false;
                self.teardown("client error");
            }
        }
    }

    fn handle_upstream(&mut self, signal: UpstreamSignal) {
        let Some(upstream) = self.upstream.as_mut() else {
            return;
        };

        match signal {
            UpstreamSignal::Opened => match upstream.on_open() {
                Ok(event) => {
                    self.forward(event);
                    self.transition(SessionState::Streaming);
                }
                Err(e) => {
                    error!(connection_id = %self.id, "Failed to configure upstream session: {}", e);
                    self.teardown("upstream handshake failed");
                }
            },
            UpstreamSignal::Message(text) => {
                if let Some(event) = upstream.decode(&text) {
                    self.forward(event);
                }
            }
            UpstreamSignal::Closed { reason } => {
                info!(
                    connection_id = %self.id,
                    reason = reason.as_deref().unwrap_or("none"),
                    "Upstream connection closed"
                );
                upstream.on_closed();
                self.teardown("upstream closed");
            }
        }
    }

    fn forward(&mut self, event: UpstreamEvent) {
        if let Some(message) = RelayOutgoingMessage::from_upstream(event) {
            self.send_downstream(message);
        }
    }

    fn send_downstream(&mut self, message: RelayOutgoingMessage) {
        if !self.downstream_open {
            return;
        }
        if self.downstream.send(DownstreamRoute::Outgoing(message)).is_ok() {
            self.stats.messages_sent += 1;
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(connection_id = %self.id, from = %self.state, to = %next, "Session state change");
        self.state = next;
    }

    /// Close whichever side is still open, deregister, and stop.
    fn teardown(&mut self, cause: &str) {
        self.transition(SessionState::Closing);

        if self.downstream_open {
            let _ = self.downstream.send(DownstreamRoute::Close);
            self.downstream_open = false;
        }

        let upstream_stats = self.upstream.as_mut().map(|upstream| {
            upstream.close();
            upstream.stats()
        });

        if self.registered {
            self.registry.remove(&self.id);
            self.registered = false;
        }
        self.cancel.cancel();

        let upstream_stats = upstream_stats.unwrap_or_default();
        info!(
            connection_id = %self.id,
            cause,
            frames_received = self.stats.frames_received,
            messages_sent = self.stats.messages_sent,
            upstream_sent = upstream_stats.sent,
            upstream_dropped = upstream_stats.dropped,
            decode_failures = upstream_stats.decode_failures,
            "Relay session closed"
        );

        self.transition(SessionState::Closed);
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Token cancelled by the registry on shutdown, and by teardown.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }
}
