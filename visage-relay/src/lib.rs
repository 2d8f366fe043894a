//! visage-relay: relay-consumption side of visage
//!
//! Keeps the most recent `MocapFrame` in a lock-protected single slot and
//! feeds it from background tasks:
//! - Line-delimited frame JSON from a local stream (stdin by default)
//! - A relay server, as a viewer, with capped exponential reconnect backoff
//!
//! The `relay` feature (on by default) adds the WebSocket client and the
//! producer-side `RelayPublisher`.

pub mod error;
pub mod backoff;
pub mod shutdown;
pub mod source;
pub mod receiver;
pub mod stream;
#[cfg(feature = "relay")]
pub mod client;
#[cfg(feature = "relay")]
pub mod publisher;

pub use error::RelayError;
pub use backoff::Backoff;
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use source::FrameSource;
pub use receiver::{FrameReceiver, FrameSlot};
pub use stream::{parse_line, LineStreamSource};
#[cfg(feature = "relay")]
pub use client::{connect_relay, parse_relay_message, parse_relay_url, RelayClient, RelayStream, Role};
#[cfg(feature = "relay")]
pub use publisher::{FramePublisher, RelayPublisher};
