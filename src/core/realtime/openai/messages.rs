//! OpenAI Realtime API WebSocket message types.
//!
//! Only the subset of the protocol the interpreter relay speaks is modelled.
//!
//! Client events (sent to server):
//! - session.update - Configure instructions, voice and modalities
//! - input_audio_buffer.append - Append audio to buffer
//! - input_audio_buffer.commit - Commit audio buffer
//! - input_audio_buffer.clear - Clear audio buffer
//! - response.create - Generate a response
//!
//! Server events (received from server):
//! - session.created / session.updated - Logged only
//! - response.audio.delta - Audio data chunk
//! - response.text.delta - Text chunk
//! - response.done - Logged only
//! - error - Error occurred
//!
//! Everything else decodes to [`ServerEvent::Unknown`].

use base64::prelude::*;
use serde::{Deserialize, Serialize};

/// Output modality names.
pub const MODALITY_AUDIO: &str = "audio";
pub const MODALITY_TEXT: &str = "text";

/// Modalities requested for every session and response.
pub fn audio_and_text() -> Vec<String> {
    vec![MODALITY_AUDIO.to_string(), MODALITY_TEXT.to_string()]
}

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration for OpenAI Realtime API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// System instructions for the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Response modalities (text, audio)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,

    /// Voice for audio output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Input audio transcription configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,
}

/// Input audio transcription configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputAudioTranscription {
    /// Transcription model (e.g., "whisper-1")
    pub model: String,
}

/// Response creation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResponseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the OpenAI Realtime API.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: SessionConfig,
    },

    /// Append audio to input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded audio data
        audio: String,
    },

    /// Commit the input audio buffer
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit,

    /// Clear the input audio buffer
    #[serde(rename = "input_audio_buffer.clear")]
    InputAudioBufferClear,

    /// Create a response
    #[serde(rename = "response.create")]
    ResponseCreate {
        /// Response configuration
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<ResponseConfig>,
    },
}

impl ClientEvent {
    /// Create an audio append event from raw bytes.
    pub fn audio_append(data: &[u8]) -> Self {
        ClientEvent::InputAudioBufferAppend {
            audio: BASE64_STANDARD.encode(data),
        }
    }

    /// `response.create` asking for both audio and text.
    pub fn response_create() -> Self {
        ClientEvent::ResponseCreate {
            response: Some(ResponseConfig {
                modalities: Some(audio_and_text()),
            }),
        }
    }

    /// Wire name of the event, used in logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::SessionUpdate { .. } => "session.update",
            ClientEvent::InputAudioBufferAppend { .. } => "input_audio_buffer.append",
            ClientEvent::InputAudioBufferCommit => "input_audio_buffer.commit",
            ClientEvent::InputAudioBufferClear => "input_audio_buffer.clear",
            ClientEvent::ResponseCreate { .. } => "response.create",
        }
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events received from the OpenAI Realtime API.
///
/// Payload fields are optional so that a well-tagged event with a missing or
/// null field still decodes.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Error occurred
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        error: Option<ApiError>,
    },

    #[serde(rename = "session.created")]
    SessionCreated {
        #[serde(default)]
        session: Option<SessionInfo>,
    },

    #[serde(rename = "session.updated")]
    SessionUpdated {
        #[serde(default)]
        session: Option<SessionInfo>,
    },

    /// Audio data chunk (base64 PCM16)
    #[serde(rename = "response.audio.delta")]
    ResponseAudioDelta {
        #[serde(default)]
        delta: Option<String>,
    },

    /// Text chunk
    #[serde(rename = "response.text.delta")]
    ResponseTextDelta {
        #[serde(default)]
        delta: Option<String>,
    },

    #[serde(rename = "response.done")]
    ResponseDone,

    /// Any event type the relay does not act on
    #[serde(other)]
    Unknown,
}

/// Error payload of an `error` event.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ApiError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// String or numeric depending on the error class
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Session identity reported by the server.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SessionInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_client_event_serialization() {
        let event = ClientEvent::InputAudioBufferCommit;
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"input_audio_buffer.commit"}"#);

        let event = ClientEvent::InputAudioBufferClear;
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"input_audio_buffer.clear"}"#);
    }

    #[test]
    fn test_audio_append() {
        let data = vec![0u8, 1, 2, 3];
        let event = ClientEvent::audio_append(&data);
        match event {
            ClientEvent::InputAudioBufferAppend { audio } => {
                let decoded = BASE64_STANDARD.decode(&audio).unwrap();
                assert_eq!(decoded, data);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_response_create_requests_audio_and_text() {
        let value = serde_json::to_value(ClientEvent::response_create()).unwrap();
        assert_eq!(
            value,
            json!({"type": "response.create", "response": {"modalities": ["audio", "text"]}})
        );
    }

    #[test]
    fn test_session_update_serialization() {
        let event = ClientEvent::SessionUpdate {
            session: SessionConfig {
                instructions: Some("translate".to_string()),
                modalities: Some(audio_and_text()),
                voice: Some("alloy".to_string()),
                input_audio_transcription: Some(InputAudioTranscription {
                    model: "whisper-1".to_string(),
                }),
            },
        };
        let value: Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "session.update");
        assert_eq!(value["session"]["voice"], "alloy");
        assert_eq!(value["session"]["modalities"], json!(["audio", "text"]));
        assert_eq!(
            value["session"]["input_audio_transcription"]["model"],
            "whisper-1"
        );
    }

    #[test]
    fn test_server_event_deserialization() {
        let json = r#"{
            "type": "error",
            "error": {
                "type": "invalid_request_error",
                "message": "Test error"
            }
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        match event {
            ServerEvent::Error { error: Some(error) } => {
                assert_eq!(error.message.as_deref(), Some("Test error"));
                assert_eq!(error.error_type.as_deref(), Some("invalid_request_error"));
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_error_with_numeric_code() {
        let json = r#"{"type":"error","error":{"code":429,"message":"Slow down"}}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        match event {
            ServerEvent::Error { error: Some(error) } => {
                assert_eq!(error.code, Some(json!(429)));
                assert_eq!(error.message.as_deref(), Some("Slow down"));
            }
            other => panic!("Wrong event type: {:?}", other),
        }
    }

    #[test]
    fn test_error_without_payload() {
        let event: ServerEvent = serde_json::from_str(r#"{"type":"error"}"#).unwrap();
        assert_eq!(event, ServerEvent::Error { error: None });
    }

    #[test]
    fn test_delta_events() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"type":"response.audio.delta","delta":"AAEC"}"#).unwrap();
        assert_eq!(
            event,
            ServerEvent::ResponseAudioDelta {
                delta: Some("AAEC".to_string())
            }
        );

        let event: ServerEvent =
            serde_json::from_str(r#"{"type":"response.text.delta","delta":null}"#).unwrap();
        assert_eq!(event, ServerEvent::ResponseTextDelta { delta: None });
    }

    #[test]
    fn test_unknown_event_type() {
        let event: ServerEvent = serde_json::from_str(
            r#"{"type":"input_audio_buffer.speech_started","audio_start_ms":10}"#,
        )
        .unwrap();
        assert_eq!(event, ServerEvent::Unknown);
    }
}
