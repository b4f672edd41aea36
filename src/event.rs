//! Event envelope and event-type tags.
//!
//! DESIGN
//! ======
//! Every event delivered by the transport is an [`Event`] with a free-form
//! string type, a timestamp, and an opaque JSON payload. Handlers subscribe by
//! [`EventType`], a tagged set that reserves the client's own lifecycle names
//! (`connected`, `disconnected`, `error`) and falls back to [`EventType::Named`]
//! for everything the counterpart emits.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved name of the lifecycle event fired after a successful (re)connect.
pub const CONNECTED: &str = "connected";
/// Reserved name of the lifecycle event fired when the connection drops.
pub const DISCONNECTED: &str = "disconnected";
/// Reserved name of the lifecycle event fired for transport errors.
pub const ERROR: &str = "error";

/// A single event as delivered by the transport and recorded in history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type name, e.g. `"matched"`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Producer timestamp. Missing timestamps decode as `0.0`.
    #[serde(default)]
    pub timestamp: f64,
    /// Opaque payload, passed through to handlers untouched.
    #[serde(rename = "data", alias = "payload", default)]
    pub payload: Value,
}

impl Event {
    #[must_use]
    pub fn new(event_type: impl Into<String>, timestamp: f64, payload: Value) -> Self {
        Self { event_type: event_type.into(), timestamp, payload }
    }

    /// Handler key this event dispatches to.
    #[must_use]
    pub fn kind(&self) -> EventType {
        EventType::from(self.event_type.as_str())
    }
}

/// Key under which handlers are registered.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    /// The transport (re)established its connection.
    Connected,
    /// The transport lost its connection.
    Disconnected,
    /// The transport reported an error. Payload: `{"message": ...}`.
    Error,
    /// Any other event type emitted by the counterpart.
    Named(String),
}

impl EventType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connected => CONNECTED,
            Self::Disconnected => DISCONNECTED,
            Self::Error => ERROR,
            Self::Named(name) => name,
        }
    }

    /// Whether this tag names one of the client's own lifecycle events.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        !matches!(self, Self::Named(_))
    }
}

impl From<&str> for EventType {
    fn from(value: &str) -> Self {
        match value {
            CONNECTED => Self::Connected,
            DISCONNECTED => Self::Disconnected,
            ERROR => Self::Error,
            other => Self::Named(other.to_owned()),
        }
    }
}

impl From<String> for EventType {
    fn from(value: String) -> Self {
        match value.as_str() {
            CONNECTED | DISCONNECTED | ERROR => Self::from(value.as_str()),
            _ => Self::Named(value),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "event_test.rs"]
mod tests;
