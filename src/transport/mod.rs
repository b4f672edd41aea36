//! Transport capability: the seam between the client and the network.
//!
//! DESIGN
//! ======
//! The client never touches sockets. It drives a [`Transport`] through four
//! non-blocking calls (`subscribe`, `connect`, `disconnect`, `emit`) and
//! consumes [`Signal`]s from the channel handed over in `subscribe`.
//! Reconnection and backoff belong to the transport; the client only reacts
//! to the resulting signals.
//!
//! Implementations:
//! - [`ws::WsTransport`]: WebSocket over tokio-tungstenite.
//! - `mock::MockTransport` (tests only): records calls, injects signals.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::config::ReconnectPolicy;
use crate::event::Event;
use crate::wire::WireError;

#[cfg(test)]
pub(crate) mod mock;
pub mod ws;

/// Sending half of the signal channel, owned by the transport.
pub type SignalSender = mpsc::UnboundedSender<Signal>;

/// Receiving half of the signal channel, owned by the client.
pub type SignalReceiver = mpsc::UnboundedReceiver<Signal>;

/// Something the transport observed, in delivery order.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    /// A connection was (re)established.
    Connected,
    /// The connection dropped or was closed.
    Disconnected { reason: String },
    /// A transport-level error. Does not imply a state change.
    Error { message: String },
    /// A live event from the counterpart.
    Event(Event),
    /// Bulk catch-up of previously emitted events, oldest first.
    History(Vec<Event>),
    /// A reconnect attempt is scheduled.
    Reconnecting { attempt: u32 },
    /// The reconnect policy is exhausted; no further automatic retries.
    ReconnectFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("no tokio runtime available to drive the connection")]
    NoRuntime,
    #[error("transport has no signal subscriber")]
    NotSubscribed,
    #[error("transport is not connected")]
    NotConnected,
    #[error("transport session closed")]
    SessionClosed,
    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] WireError),
}

/// Narrow interface the client consumes.
///
/// All methods must return promptly; long-running work (handshakes, retries)
/// happens on the transport's own task and is reported through signals.
pub trait Transport: Send {
    /// Hand the transport the channel it reports signals on.
    fn subscribe(&mut self, signals: SignalSender);

    /// Start connecting to `endpoint`, retrying according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot even be attempted.
    fn connect(&mut self, endpoint: &str, policy: &ReconnectPolicy) -> Result<(), TransportError>;

    /// Tear down the current session, if any. No reconnect follows.
    fn disconnect(&mut self);

    /// Send a named message to the counterpart.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session to send on or the payload
    /// cannot be encoded.
    fn emit(&mut self, name: &str, payload: &Value) -> Result<(), TransportError>;
}
