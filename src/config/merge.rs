//! Merging YAML values over environment values and defaults.

use super::env::{env_parse, env_path, env_string};
use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig};
use crate::core::realtime::openai::{
    DEFAULT_REALTIME_MODEL, DEFAULT_TARGET_LANGUAGE, DEFAULT_TRANSCRIPTION_MODEL, DEFAULT_VOICE,
    OPENAI_REALTIME_URL,
};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS_PER_IP: u32 = 100;

/// Build the final configuration. YAML wins over ENV, ENV over defaults.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml.unwrap_or_default();
    let server = yaml.server.unwrap_or_default();
    let providers = yaml.providers.unwrap_or_default();
    let interpreter = yaml.interpreter.unwrap_or_default();
    let security = yaml.security.unwrap_or_default();

    let host = server
        .host
        .or_else(|| env_string("HOST"))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = match server.port {
        Some(port) => port,
        None => env_parse::<u16>("PORT")?.unwrap_or(DEFAULT_PORT),
    };

    let tls_yaml = server.tls.unwrap_or_default();
    let cert_path = tls_yaml.cert_path.or_else(|| env_path("TLS_CERT_PATH"));
    let key_path = tls_yaml.key_path.or_else(|| env_path("TLS_KEY_PATH"));
    let tls = match (cert_path, key_path) {
        (Some(cert_path), Some(key_path)) => Some(TlsConfig {
            cert_path,
            key_path,
        }),
        (None, None) => None,
        _ => {
            return Err(
                "TLS requires both a certificate path and a key path (TLS_CERT_PATH, TLS_KEY_PATH)"
                    .into(),
            );
        }
    };

    let openai_api_key = providers
        .openai_api_key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| env_string("OPENAI_API_KEY"));

    let realtime_url = interpreter
        .realtime_url
        .or_else(|| env_string("OPENAI_REALTIME_URL"))
        .unwrap_or_else(|| OPENAI_REALTIME_URL.to_string());
    let realtime_model = interpreter
        .model
        .or_else(|| env_string("OPENAI_REALTIME_MODEL"))
        .unwrap_or_else(|| DEFAULT_REALTIME_MODEL.to_string());
    let interpreter_voice = interpreter
        .voice
        .or_else(|| env_string("INTERPRETER_VOICE"))
        .unwrap_or_else(|| DEFAULT_VOICE.to_string());
    let target_language = interpreter
        .target_language
        .or_else(|| env_string("INTERPRETER_TARGET_LANGUAGE"))
        .unwrap_or_else(|| DEFAULT_TARGET_LANGUAGE.to_string());
    let transcription_model = interpreter
        .transcription_model
        .or_else(|| env_string("INTERPRETER_TRANSCRIPTION_MODEL"))
        .unwrap_or_else(|| DEFAULT_TRANSCRIPTION_MODEL.to_string());
    let interpreter_instructions = interpreter
        .instructions
        .or_else(|| env_string("INTERPRETER_INSTRUCTIONS"));

    let cors_allowed_origins = security
        .cors_allowed_origins
        .or_else(|| env_string("CORS_ALLOWED_ORIGINS"));
    let max_websocket_connections = match security.max_websocket_connections {
        Some(max) => Some(max),
        None => env_parse::<usize>("MAX_WEBSOCKET_CONNECTIONS")?,
    };
    let max_connections_per_ip = match security.max_connections_per_ip {
        Some(max) => max,
        None => env_parse::<u32>("MAX_CONNECTIONS_PER_IP")?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS_PER_IP),
    };

    Ok(ServerConfig {
        host,
        port,
        tls,
        openai_api_key,
        realtime_url,
        realtime_model,
        interpreter_voice,
        target_language,
        transcription_model,
        interpreter_instructions,
        cors_allowed_origins,
        max_websocket_connections,
        max_connections_per_ip,
    })
}
