//! Shared application state.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::config::ServerConfig;
use crate::core::realtime::{InterpreterConfig, UpstreamConnector, WebSocketConnector};
use crate::core::relay::SessionRegistry;

/// Why a WebSocket upgrade was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLimitError {
    GlobalLimitReached,
    PerIpLimitReached,
}

/// State shared by every handler.
pub struct AppState {
    pub config: ServerConfig,
    /// Upstream session settings derived from `config`
    pub interpreter: InterpreterConfig,
    /// Live relay sessions
    pub sessions: SessionRegistry,
    /// Opens upstream sockets
    pub connector: Arc<dyn UpstreamConnector>,
    ws_connections: AtomicUsize,
    ip_connections: DashMap<IpAddr, u32>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Self::with_connector(config, Arc::new(WebSocketConnector::new()))
    }

    /// Build state with a custom upstream connector.
    pub fn with_connector(config: ServerConfig, connector: Arc<dyn UpstreamConnector>) -> Arc<Self> {
        let interpreter = config.interpreter_config();
        Arc::new(Self {
            config,
            interpreter,
            sessions: SessionRegistry::new(),
            connector,
            ws_connections: AtomicUsize::new(0),
            ip_connections: DashMap::new(),
        })
    }

    /// Reserve a WebSocket slot for `ip`, enforcing the global and per-IP limits.
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        match self.config.max_websocket_connections {
            Some(max) => {
                self.ws_connections
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                        (count < max).then_some(count + 1)
                    })
                    .map_err(|_| ConnectionLimitError::GlobalLimitReached)?;
            }
            None => {
                self.ws_connections.fetch_add(1, Ordering::SeqCst);
            }
        }

        let mut per_ip = self.ip_connections.entry(ip).or_insert(0);
        if *per_ip >= self.config.max_connections_per_ip {
            drop(per_ip);
            self.ws_connections.fetch_sub(1, Ordering::SeqCst);
            return Err(ConnectionLimitError::PerIpLimitReached);
        }
        *per_ip += 1;
        Ok(())
    }

    /// Give back a slot taken by [`Self::try_acquire_connection`].
    pub fn release_connection(&self, ip: IpAddr) {
        let _ = self
            .ws_connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_sub(1)
            });

        if let Some(mut per_ip) = self.ip_connections.get_mut(&ip) {
            *per_ip = per_ip.saturating_sub(1);
        }
        self.ip_connections.remove_if(&ip, |_, count| *count == 0);
    }

    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }

    pub fn ip_connection_count(&self, ip: &IpAddr) -> u32 {
        self.ip_connections.get(ip).map(|c| *c).unwrap_or(0)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}
