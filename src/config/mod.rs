//! Configuration module for the interpreter gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use interpreter_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

use crate::core::realtime::InterpreterConfig;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port, TLS)
/// - The OpenAI API key and Realtime session settings
/// - Security settings (CORS, connection limits)
///
/// A missing `openai_api_key` is not a startup error. Each translation
/// session reports it to the browser instead.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// OpenAI API key for the Realtime API
    pub openai_api_key: Option<String>,

    // Interpreter settings
    /// Realtime WebSocket endpoint without the model query parameter
    pub realtime_url: String,
    pub realtime_model: String,
    pub interpreter_voice: String,
    /// Language all speech is translated into
    pub target_language: String,
    pub transcription_model: String,
    /// Replaces the generated interpreter prompt
    pub interpreter_instructions: Option<String>,

    // Security settings
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
    /// Maximum concurrent WebSocket connections (None = unlimited)
    pub max_websocket_connections: Option<usize>,
    /// Maximum WebSocket connections per IP address
    pub max_connections_per_ip: u32,
}

/// Zeroize the provider key when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values (loaded in main.rs)
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_realtime_url(&self.realtime_url)?;
        validation::validate_tls_config(&self.tls)?;
        validation::validate_connection_limits(
            self.max_websocket_connections,
            self.max_connections_per_ip,
        )?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Session settings for the upstream client.
    ///
    /// The key is copied as-is (empty when unset); the relay's credential
    /// check decides whether a session may start.
    pub fn interpreter_config(&self) -> InterpreterConfig {
        InterpreterConfig {
            api_key: self.openai_api_key.clone().unwrap_or_default(),
            url: self.realtime_url.clone(),
            model: self.realtime_model.clone(),
            voice: self.interpreter_voice.clone(),
            target_language: self.target_language.clone(),
            transcription_model: self.transcription_model.clone(),
            instructions: self.interpreter_instructions.clone(),
        }
    }
}
