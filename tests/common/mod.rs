//! Shared helpers for integration tests
//!
//! - A mock OpenAI Realtime server built on `tokio_tungstenite::accept_hdr_async`
//! - A gateway instance served on an ephemeral port

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, accept_hdr_async};

use interpreter_gateway::{ServerConfig, routes, state::AppState};

/// Upper bound for any single wait in these tests.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

pub type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How the mock upstream behaves after the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Answer `response.create` with audio, a malformed frame and text.
    Translate,
    /// Close the socket as soon as `session.update` arrives.
    CloseAfterSessionUpdate,
}

/// Observations reported by the mock upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    Connected {
        authorization: Option<String>,
        beta: Option<String>,
        uri: String,
    },
    Received(Value),
    Disconnected,
}

/// Mock OpenAI Realtime server.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub events: mpsc::UnboundedReceiver<MockEvent>,
}

impl MockUpstream {
    pub async fn start(behavior: MockBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, events) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, behavior, tx).await;
                });
            }
        });

        Self { addr, events }
    }

    /// Base URL to configure as the realtime endpoint.
    pub fn url(&self) -> String {
        format!("ws://{}/v1/realtime", self.addr)
    }

    pub async fn next_event(&mut self) -> MockEvent {
        tokio::time::timeout(STEP_TIMEOUT, self.events.recv())
            .await
            .expect("timed out waiting for mock upstream")
            .expect("mock upstream channel closed")
    }

    /// Wait for the next client event and return its `type`.
    pub async fn next_received(&mut self) -> Value {
        loop {
            match self.next_event().await {
                MockEvent::Received(value) => return value,
                MockEvent::Connected { .. } => continue,
                MockEvent::Disconnected => panic!("upstream disconnected unexpectedly"),
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    behavior: MockBehavior,
    tx: mpsc::UnboundedSender<MockEvent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut authorization = None;
    let mut beta = None;
    let mut uri = String::new();

    let ws_stream = accept_hdr_async(stream, |req: &Request, resp: Response| {
        authorization = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        beta = req
            .headers()
            .get("openai-beta")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        uri = req.uri().to_string();
        Ok(resp)
    })
    .await?;

    let _ = tx.send(MockEvent::Connected {
        authorization,
        beta,
        uri,
    });

    let (mut write, mut read) = ws_stream.split();

    let created = json!({"type": "session.created", "session": {"id": "sess_mock"}});
    write.send(Message::Text(created.to_string().into())).await?;

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let value: Value = serde_json::from_str(text.as_str())?;
                let kind = value["type"].as_str().unwrap_or_default().to_string();
                let _ = tx.send(MockEvent::Received(value));

                match (behavior, kind.as_str()) {
                    (MockBehavior::CloseAfterSessionUpdate, "session.update") => {
                        write.send(Message::Close(None)).await?;
                        break;
                    }
                    (MockBehavior::Translate, "response.create") => {
                        let frames = [
                            json!({"type": "response.audio.delta", "delta": "AAECAw=="}).to_string(),
                            "{not json".to_string(),
                            json!({"type": "response.text.delta", "delta": "Good morning"})
                                .to_string(),
                            json!({"type": "response.done"}).to_string(),
                        ];
                        for frame in frames {
                            write.send(Message::Text(frame.into())).await?;
                        }
                    }
                    _ => {}
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    let _ = tx.send(MockEvent::Disconnected);
    Ok(())
}

/// Configuration for a gateway on 127.0.0.1 talking to `realtime_url`.
pub fn test_config(api_key: Option<&str>, realtime_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        openai_api_key: api_key.map(str::to_string),
        realtime_url: realtime_url.to_string(),
        realtime_model: "gpt-4o-realtime-preview-2024-12-17".to_string(),
        interpreter_voice: "alloy".to_string(),
        target_language: "English".to_string(),
        transcription_model: "whisper-1".to_string(),
        interpreter_instructions: None,
        cors_allowed_origins: None,
        max_websocket_connections: Some(100),
        max_connections_per_ip: 100,
    }
}

/// Serve the full application on an ephemeral port.
pub async fn spawn_gateway(state: Arc<AppState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::create_app(state);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    addr
}

/// Open a browser-side socket to `/ws/translate`.
pub async fn connect_client(addr: SocketAddr) -> ClientSocket {
    let (socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/translate"))
        .await
        .unwrap();
    socket
}

/// Next JSON message from the gateway, or `None` once the socket closes.
pub async fn next_json(socket: &mut ClientSocket) -> Option<Value> {
    loop {
        let msg = tokio::time::timeout(STEP_TIMEOUT, socket.next())
            .await
            .expect("timed out waiting for gateway");
        match msg {
            Some(Ok(Message::Text(text))) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

/// Poll until `check` holds or the step timeout passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + STEP_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
