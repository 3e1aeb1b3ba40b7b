pub mod realtime;
pub mod relay;

pub use realtime::{
    OpenAIRealtime, RealtimeError, RealtimeResult, UpstreamConnector, UpstreamEvent, UpstreamLink,
    UpstreamSignal, WebSocketConnector,
};
pub use relay::{RelaySession, SessionRegistry};
