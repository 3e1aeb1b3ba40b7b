//! Downstream frame interpreter.
//!
//! Text frames carry `{"type":"start"}` or `{"type":"stop"}`. Binary frames
//! carry PCM16 little-endian mono samples at 24kHz and are passed through
//! as base64 `input_audio_buffer.append` events.

use serde::Deserialize;
use tracing::debug;

use crate::core::realtime::openai::ClientEvent;

/// Control message sent by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlIntent {
    /// Discard whatever audio the provider has buffered.
    Start,
    /// Commit buffered audio and ask for a translation.
    Stop,
}

#[derive(Deserialize)]
struct ControlEnvelope {
    #[serde(rename = "type")]
    kind: String,
}

impl ControlIntent {
    /// Parse a text frame. Unknown types and invalid JSON yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let envelope: ControlEnvelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Ignoring malformed control frame: {}", e);
                return None;
            }
        };

        match envelope.kind.as_str() {
            "start" => Some(ControlIntent::Start),
            "stop" => Some(ControlIntent::Stop),
            other => {
                debug!(kind = other, "Ignoring unknown control frame");
                None
            }
        }
    }

    /// Upstream events this intent expands to, in send order.
    pub fn to_upstream(self) -> Vec<ClientEvent> {
        match self {
            ControlIntent::Start => vec![ClientEvent::InputAudioBufferClear],
            ControlIntent::Stop => vec![
                ClientEvent::InputAudioBufferCommit,
                ClientEvent::response_create(),
            ],
        }
    }
}

/// Interpret a downstream text frame.
pub fn interpret_text(text: &str) -> Vec<ClientEvent> {
    ControlIntent::parse(text)
        .map(ControlIntent::to_upstream)
        .unwrap_or_default()
}

/// Interpret a downstream binary frame.
pub fn interpret_binary(audio: &[u8]) -> ClientEvent {
    ClientEvent::audio_append(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::*;

    #[test]
    fn test_start_clears_buffer() {
        let events = interpret_text(r#"{"type":"start"}"#);
        assert_eq!(events, vec![ClientEvent::InputAudioBufferClear]);
    }

    #[test]
    fn test_stop_commits_then_requests_response() {
        let events = interpret_text(r#"{"type":"stop"}"#);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ClientEvent::InputAudioBufferCommit);
        assert_eq!(events[1].event_type(), "response.create");
    }

    #[test]
    fn test_unknown_and_malformed_frames_are_ignored() {
        assert!(interpret_text(r#"{"type":"pause"}"#).is_empty());
        assert!(interpret_text("stop").is_empty());
        assert!(interpret_text(r#"{"kind":"stop"}"#).is_empty());
        assert!(interpret_text("").is_empty());
    }

    #[test]
    fn test_extra_fields_tolerated() {
        assert_eq!(
            ControlIntent::parse(r#"{"type":"stop","at":12345}"#),
            Some(ControlIntent::Stop)
        );
    }

    #[test]
    fn test_binary_becomes_append() {
        // 4 samples of PCM16 LE
        let samples: Vec<u8> = [0i16, 1000, -1000, i16::MAX]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();

        match interpret_binary(&samples) {
            ClientEvent::InputAudioBufferAppend { audio } => {
                assert_eq!(BASE64_STANDARD.decode(audio).unwrap(), samples);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
