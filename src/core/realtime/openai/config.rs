//! OpenAI Realtime API configuration for the interpreter session.

use url::Url;

use crate::core::realtime::base::{RealtimeError, RealtimeResult};

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Model used when none is configured.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-12-17";

/// Voice used for translated speech.
pub const DEFAULT_VOICE: &str = "alloy";

/// Language everything is translated into.
pub const DEFAULT_TARGET_LANGUAGE: &str = "English";

/// Model used to transcribe the speaker's input audio.
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Audio sample rate expected on both directions (PCM16 mono, little-endian).
pub const OPENAI_REALTIME_SAMPLE_RATE: u32 = 24000;

/// Beta header value required by the Realtime API.
pub const OPENAI_BETA_HEADER: &str = "realtime=v1";

/// Settings for one interpreter session against the Realtime API.
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Provider API key (Bearer token)
    pub api_key: String,
    /// Base WebSocket URL, without the model query parameter
    pub url: String,
    pub model: String,
    pub voice: String,
    pub target_language: String,
    pub transcription_model: String,
    /// Overrides the generated interpreter prompt
    pub instructions: Option<String>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            url: OPENAI_REALTIME_URL.to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            instructions: None,
        }
    }
}

/// Zeroize the provider key when the session settings are dropped.
impl Drop for InterpreterConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.api_key.zeroize();
    }
}

impl InterpreterConfig {
    /// Full endpoint URL including `?model=`.
    pub fn build_ws_url(&self) -> RealtimeResult<String> {
        let mut url = Url::parse(&self.url).map_err(|e| {
            RealtimeError::InvalidConfiguration(format!("Invalid realtime URL '{}': {e}", self.url))
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(RealtimeError::InvalidConfiguration(format!(
                "Realtime URL must use ws:// or wss://, got '{}'",
                url.scheme()
            )));
        }

        url.query_pairs_mut().append_pair("model", &self.model);
        Ok(url.to_string())
    }

    /// System prompt sent with `session.update`.
    pub fn instructions(&self) -> String {
        match &self.instructions {
            Some(custom) if !custom.trim().is_empty() => custom.clone(),
            _ => format!(
                "You are a simultaneous interpreter. Translate every incoming utterance into {} and answer with audio.",
                self.target_language
            ),
        }
    }
}
