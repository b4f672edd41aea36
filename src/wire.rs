//! JSON named-message envelope used by the WebSocket transport.
//!
//! Every text message is `{"event": <name>, "data": <value>}`. The counterpart
//! pushes live events as `event`, catch-up batches as `event_history`, and
//! errors as `error`; everything the client sends uses the action name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::Event;
use crate::transport::Signal;

/// Inbound name carrying a single event envelope.
pub const EVENT: &str = "event";
/// Inbound name carrying an ordered batch of past events.
pub const EVENT_HISTORY: &str = "event_history";
/// Inbound name carrying an error description.
pub const ERROR: &str = "error";

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WireMessage {
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self { event: event.into(), data }
    }
}

/// Encode an outbound named message.
///
/// # Errors
///
/// Returns [`WireError::Json`] if the payload cannot be serialized.
pub fn encode(name: &str, data: &Value) -> Result<String, WireError> {
    Ok(serde_json::to_string(&WireMessage::new(name, data.clone()))?)
}

/// Decode one inbound text message into the signal it represents.
///
/// Returns `Ok(None)` for well-formed messages with a name the client does
/// not consume.
///
/// # Errors
///
/// Returns [`WireError::Json`] for malformed JSON or payloads that do not
/// match the named message's shape.
pub fn decode(text: &str) -> Result<Option<Signal>, WireError> {
    let msg: WireMessage = serde_json::from_str(text)?;
    let signal = match msg.event.as_str() {
        EVENT => Some(Signal::Event(serde_json::from_value::<Event>(msg.data)?)),
        EVENT_HISTORY => Some(Signal::History(serde_json::from_value::<Vec<Event>>(msg.data)?)),
        ERROR => Some(Signal::Error { message: error_message(&msg.data) }),
        _ => None,
    };
    Ok(signal)
}

fn error_message(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| other.to_string(), ToOwned::to_owned),
    }
}

#[cfg(test)]
#[path = "wire_test.rs"]
mod tests;
