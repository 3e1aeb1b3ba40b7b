//! WebSocket connector backed by tokio-tungstenite.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tracing::{debug, error, info, warn};

use super::base::{RealtimeResult, UpstreamConnector, UpstreamFrame, UpstreamLink, UpstreamSignal};

/// Dials upstream sockets with `tokio_tungstenite::connect_async`.
///
/// Each call spawns one connection task. The task answers pings, forwards
/// text frames as [`UpstreamSignal::Message`] and ends when either side
/// closes or the link is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

impl UpstreamConnector for WebSocketConnector {
    fn connect(
        &self,
        request: Request,
        signals: mpsc::UnboundedSender<UpstreamSignal>,
    ) -> RealtimeResult<UpstreamLink> {
        let (tx, rx) = mpsc::unbounded_channel::<UpstreamFrame>();
        tokio::spawn(run_connection(request, rx, signals));
        Ok(UpstreamLink::new(tx))
    }
}

async fn run_connection(
    request: Request,
    mut rx: mpsc::UnboundedReceiver<UpstreamFrame>,
    signals: mpsc::UnboundedSender<UpstreamSignal>,
) {
    let host = request.uri().host().unwrap_or_default().to_string();

    // A close or a dropped link abandons the dial; text is held until the socket opens
    let dial = tokio_tungstenite::connect_async(request);
    tokio::pin!(dial);
    let mut pending = Vec::new();
    let dialed = loop {
        tokio::select! {
            result = &mut dial => break result,
            frame = rx.recv() => match frame {
                Some(UpstreamFrame::Text(text)) => pending.push(text),
                Some(UpstreamFrame::Close) | None => {
                    debug!(host = %host, "Upstream dial abandoned, link closed");
                    let _ = signals.send(UpstreamSignal::Closed { reason: None });
                    return;
                }
            },
        }
    };

    let ws_stream = match dialed {
        Ok((stream, _response)) => stream,
        Err(e) => {
            error!(host = %host, "Failed to connect upstream: {}", e);
            let _ = signals.send(UpstreamSignal::Closed {
                reason: Some(format!("Connection failed: {e}")),
            });
            return;
        }
    };

    info!(host = %host, "Upstream WebSocket connected");
    let _ = signals.send(UpstreamSignal::Opened);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    for text in pending {
        if let Err(e) = ws_sink.send(Message::Text(text.into())).await {
            error!("Failed to send upstream message: {}", e);
            let _ = signals.send(UpstreamSignal::Closed {
                reason: Some(format!("WebSocket error: {e}")),
            });
            return;
        }
    }

    let reason = loop {
        tokio::select! {
            frame = rx.recv() => {
                match frame {
                    Some(UpstreamFrame::Text(text)) => {
                        if let Err(e) = ws_sink.send(Message::Text(text.into())).await {
                            error!("Failed to send upstream message: {}", e);
                            break Some(format!("WebSocket error: {e}"));
                        }
                    }
                    Some(UpstreamFrame::Close) | None => {
                        debug!("Closing upstream WebSocket");
                        let _ = ws_sink.send(Message::Close(None)).await;
                        break None;
                    }
                }
            }

            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = signals.send(UpstreamSignal::Message(text.to_string()));
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                            warn!("Failed to send pong: {}", e);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!("Upstream WebSocket closed by server");
                        break frame.map(|f| f.reason.as_str().to_string()).filter(|r| !r.is_empty());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Upstream WebSocket error: {}", e);
                        break Some(format!("WebSocket error: {e}"));
                    }
                    None => break None,
                }
            }
        }
    };

    let _ = signals.send(UpstreamSignal::Closed { reason });
}
