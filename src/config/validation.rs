//! Configuration validation logic.

use url::Url;

use super::TlsConfig;

/// The Realtime endpoint must be a ws:// or wss:// URL.
pub(super) fn validate_realtime_url(realtime_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse(realtime_url)
        .map_err(|e| format!("Invalid realtime URL '{realtime_url}': {e}"))?;

    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(format!(
            "Realtime URL must use ws:// or wss://, got '{realtime_url}'"
        )
        .into());
    }

    Ok(())
}

/// Certificate and key files must exist when TLS is configured.
pub(super) fn validate_tls_config(tls: &Option<TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(tls) = tls {
        if !tls.cert_path.exists() {
            return Err(format!(
                "TLS certificate file not found: {}",
                tls.cert_path.display()
            )
            .into());
        }
        if !tls.key_path.exists() {
            return Err(format!("TLS key file not found: {}", tls.key_path.display()).into());
        }
    }
    Ok(())
}

pub(super) fn validate_connection_limits(
    max_websocket_connections: Option<usize>,
    max_connections_per_ip: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if max_websocket_connections == Some(0) {
        return Err("max_websocket_connections must be greater than 0".into());
    }
    if max_connections_per_ip == 0 {
        return Err("max_connections_per_ip must be greater than 0".into());
    }
    Ok(())
}
