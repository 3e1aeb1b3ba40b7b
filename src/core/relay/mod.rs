//! Browser-to-upstream relay.
//!
//! - `credential`: provider key check run before any upstream attempt
//! - `frames`: browser frame interpretation (`start`, `stop`, PCM16 audio)
//! - `messages`: browser wire messages and writer routes
//! - `session`: the per-connection state machine
//! - `registry`: process-wide table of live sessions

pub mod credential;
pub mod frames;
pub mod messages;
mod registry;
mod session;

pub use credential::{Credential, MISSING_CREDENTIAL_MESSAGE};
pub use frames::ControlIntent;
pub use messages::{DownstreamEvent, DownstreamRoute, RelayOutgoingMessage};
pub use registry::{ConnectionId, SessionHandle, SessionRegistry};
pub use session::{
    RelaySession, RelayStats, SessionEvent, SessionState, UPSTREAM_UNAVAILABLE_MESSAGE,
};
