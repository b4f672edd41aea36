//! Offline action queue.
//!
//! DESIGN
//! ======
//! Outbound actions issued while disconnected are captured as
//! [`OfflineAction`]s: the action name and payload plus a one-shot replay
//! closure that performs exactly the send the connected path would have
//! done. The client flushes the queue once per successful reconnection.
//!
//! POLICY
//! ======
//! - Strict FIFO, no de-duplication: the same action queued twice is sent
//!   twice, in call order.
//! - Each action is replayed once. A replay that fails is logged and dropped;
//!   it is not re-queued and does not stop the flush.

use std::collections::VecDeque;
use std::fmt;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::transport::{Transport, TransportError};

type Replay = Box<dyn FnOnce(&mut dyn Transport) -> Result<(), TransportError> + Send>;

/// A deferred outbound send.
pub struct OfflineAction {
    pub id: Uuid,
    pub name: String,
    pub payload: Value,
    /// Milliseconds since the Unix epoch when the action was queued.
    pub queued_at: i64,
    replay: Replay,
}

impl OfflineAction {
    /// Capture a named emit for later replay.
    #[must_use]
    pub fn emit(name: impl Into<String>, payload: Value, queued_at: i64) -> Self {
        let name = name.into();
        let replay_name = name.clone();
        let replay_payload = payload.clone();
        Self {
            id: Uuid::new_v4(),
            name,
            payload,
            queued_at,
            replay: Box::new(move |transport: &mut dyn Transport| transport.emit(&replay_name, &replay_payload)),
        }
    }

    /// Perform the deferred send, consuming the action.
    ///
    /// # Errors
    ///
    /// Propagates whatever the transport returns for the send.
    pub fn replay(self, transport: &mut dyn Transport) -> Result<(), TransportError> {
        (self.replay)(transport)
    }
}

impl fmt::Debug for OfflineAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfflineAction")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("payload", &self.payload)
            .field("queued_at", &self.queued_at)
            .finish_non_exhaustive()
    }
}

/// Tally of one flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub replayed: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct OfflineQueue {
    actions: VecDeque<OfflineAction>,
}

impl OfflineQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, action: OfflineAction) {
        info!(id = %action.id, action = %action.name, pending = self.actions.len() + 1, "queueing action for offline mode");
        self.actions.push_back(action);
    }

    /// Replay every queued action once, oldest first, until empty.
    pub fn flush(&mut self, transport: &mut dyn Transport) -> FlushReport {
        let mut report = FlushReport::default();
        while let Some(action) = self.actions.pop_front() {
            let id = action.id;
            let name = action.name.clone();
            info!(%id, action = %name, "replaying queued action");
            match action.replay(transport) {
                Ok(()) => report.replayed += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(%id, action = %name, error = %e, "queued action replay failed; dropping");
                }
            }
        }
        report
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Queued actions, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &OfflineAction> {
        self.actions.iter()
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
