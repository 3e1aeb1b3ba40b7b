//! Translation relay WebSocket handler
//!
//! Upgrades `/ws/translate` and drives one [`RelaySession`] per connection.
//! A writer task owns the socket's sending half and drains the session's
//! outbound queue; the driver loop below feeds browser frames, upstream
//! signals and shutdown into the session until it reaches `Closed`.

use axum::{
    Extension,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};
use tracing::{debug, error, info, warn};

use crate::core::relay::{
    ConnectionId, DownstreamEvent, DownstreamRoute, RelaySession, SessionEvent,
};
use crate::middleware::ClientIp;
use crate::state::AppState;

/// Maximum WebSocket frame size (1 MB)
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// How long the writer gets to flush a final error and close frame.
const WRITER_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Translation WebSocket handler
///
/// # Arguments
/// * `ws` - The WebSocket upgrade request from Axum
/// * `state` - Application state with the interpreter settings and session registry
/// * `client_ip` - Present when the connection limit middleware reserved a slot
pub async fn translate_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    let peer = client_ip.map(|Extension(ClientIp(ip))| ip);
    info!(peer = ?peer, "Translation WebSocket connection upgrade requested");

    let failed_state = state.clone();
    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_failed_upgrade(move |e| {
            warn!("Translation WebSocket upgrade failed: {}", e);
            if let Some(ip) = peer {
                failed_state.release_connection(ip);
            }
        })
        .on_upgrade(move |socket| handle_translate_socket(socket, state, peer))
}

async fn handle_translate_socket(socket: WebSocket, state: Arc<AppState>, peer: Option<IpAddr>) {
    let id = ConnectionId::new();
    info!(connection_id = %id, peer = ?peer, "Translation WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let (route_tx, mut route_rx) = mpsc::unbounded_channel::<DownstreamRoute>();

    // Sender task for outgoing messages
    let sender_task = tokio::spawn(async move {
        while let Some(route) = route_rx.recv().await {
            let should_close = matches!(route, DownstreamRoute::Close);

            let result = match route {
                DownstreamRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                DownstreamRoute::Close => sender.send(Message::Close(None)).await,
            };

            if let Err(e) = result {
                debug!("Failed to send WebSocket message: {}", e);
                break;
            }

            if should_close {
                break;
            }
        }
    });

    let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
    let mut session = RelaySession::new(id, peer, route_tx, state.sessions.clone());
    session.start(&state.interpreter, state.connector.as_ref(), signal_tx);
    let cancel = session.cancellation();

    while !session.is_closed() {
        let event = tokio::select! {
            msg = receiver.next() => match downstream_event(msg) {
                Some(event) => SessionEvent::Downstream(event),
                None => continue,
            },
            Some(signal) = signal_rx.recv() => SessionEvent::Upstream(signal),
            _ = cancel.cancelled() => SessionEvent::Shutdown,
        };
        session.handle(event);
    }

    // Dropping the session drops the last route sender so the writer can finish
    drop(session);
    if !finish_writer(sender_task, WRITER_FLUSH_TIMEOUT).await {
        warn!(connection_id = %id, "Timed out flushing final messages to client");
    }

    if let Some(ip) = peer {
        state.release_connection(ip);
    }
    info!(connection_id = %id, "Translation WebSocket connection finished");
}

/// Wait for the writer to drain, aborting it after `limit` so a stalled
/// client cannot keep the socket alive. Returns whether it finished in time.
async fn finish_writer(mut writer: JoinHandle<()>, limit: Duration) -> bool {
    match timeout(limit, &mut writer).await {
        Ok(_) => true,
        Err(_) => {
            writer.abort();
            false
        }
    }
}

/// Map a socket read to a session event. Ping and pong frames yield `None`.
fn downstream_event(msg: Option<Result<Message, axum::Error>>) -> Option<DownstreamEvent> {
    match msg {
        Some(Ok(Message::Text(text))) => Some(DownstreamEvent::Text(text.as_str().to_owned())),
        Some(Ok(Message::Binary(data))) => Some(DownstreamEvent::Binary(data)),
        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => None,
        Some(Ok(Message::Close(_))) | None => Some(DownstreamEvent::Closed),
        Some(Err(e)) => Some(DownstreamEvent::Error(e.to_string())),
    }
}
