//! Connection manager: the public event client.
//!
//! DESIGN
//! ======
//! `EventClient` owns the handler registry, the history buffer, the offline
//! queue, and the transport. The transport reports what happened through a
//! signal channel; the client applies those signals one at a time on the task
//! that owns it, so none of its state needs a lock.
//!
//! LIFECYCLE
//! =========
//! 1. `connect()` asks the transport to open a session (no-op while one is
//!    active). Call-time failures are logged and swallowed.
//! 2. `Connected` → state = Connected, attempt counter reset, offline queue
//!    flushed, `connected` lifecycle handlers run. A `Connected` left over
//!    from a session torn down by `disconnect()` is dropped.
//! 3. `Event` / `History` → each event recorded in history, then dispatched.
//! 4. `Disconnected` → state = Disconnected, `disconnected` handlers run.
//!    The transport retries on its own; actions sent meanwhile are queued.
//! 5. `ReconnectFailed` → the session is over; a later `connect()` starts a
//!    new one.
//!
//! Only `connect()`, `disconnect()` and `ReconnectFailed` change whether a
//! session is active. Signals still in flight from a closed session never
//! revive it.

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::event::{Event, EventType};
use crate::history::HistoryBuffer;
use crate::queue::{OfflineAction, OfflineQueue};
use crate::registry::{DispatchOutcome, HandlerRegistry, HandlerResult};
use crate::transport::{Signal, SignalReceiver, Transport, TransportError};

/// Number of events `recent_events` callers typically ask for.
pub const DEFAULT_RECENT_COUNT: usize = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// What happened to an outbound action.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Handed to the transport immediately.
    Delivered,
    /// Held in the offline queue until the next successful reconnect.
    Queued,
}

impl SendOutcome {
    #[must_use]
    pub fn is_delivered(self) -> bool {
        self == Self::Delivered
    }
}

pub struct EventClient {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    signals: SignalReceiver,
    clock: Box<dyn Clock>,
    state: ConnectionState,
    /// A transport session was requested and has not ended for good.
    session_active: bool,
    /// `disconnect()` was called and the transport has not confirmed yet.
    closing: bool,
    reconnect_attempts: u32,
    registry: HandlerRegistry,
    history: HistoryBuffer,
    queue: OfflineQueue,
}

impl EventClient {
    /// Build a client and subscribe it to `transport`'s signals.
    pub fn new(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        let mut transport: Box<dyn Transport> = Box::new(transport);
        let (tx, rx) = mpsc::unbounded_channel();
        transport.subscribe(tx);

        let history = HistoryBuffer::new(config.history_capacity);
        Self {
            config,
            transport,
            signals: rx,
            clock: Box::new(SystemClock),
            state: ConnectionState::Disconnected,
            session_active: false,
            closing: false,
            reconnect_attempts: 0,
            registry: HandlerRegistry::new(),
            history,
            queue: OfflineQueue::new(),
        }
    }

    /// Replace the clock used for lifecycle and queue timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // =========================================================================
    // CONNECTION
    // =========================================================================

    /// Open a transport session. Never fails; see module docs.
    pub fn connect(&mut self) {
        if self.session_active {
            debug!(endpoint = %self.config.endpoint, "connect ignored; session already active");
            return;
        }

        match self.transport.connect(&self.config.endpoint, &self.config.reconnect) {
            Ok(()) => {
                self.session_active = true;
                self.closing = false;
                info!(endpoint = %self.config.endpoint, "connecting");
            }
            Err(e) => {
                warn!(endpoint = %self.config.endpoint, error = %e, "connection failed");
            }
        }
    }

    /// Tear down the transport session. No-op without one.
    pub fn disconnect(&mut self) {
        if !self.session_active {
            return;
        }
        self.session_active = false;
        self.closing = true;
        self.transport.disconnect();
        info!(endpoint = %self.config.endpoint, "disconnect requested");
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnect attempts since the last successful connection.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Whether a session is open or the transport is still retrying.
    #[must_use]
    pub fn is_session_active(&self) -> bool {
        self.session_active
    }

    // =========================================================================
    // HANDLERS & DISPATCH
    // =========================================================================

    /// Register `handler` for `event_type`. Handlers receive `(payload, timestamp)`.
    pub fn on<F>(&mut self, event_type: impl Into<EventType>, handler: F)
    where
        F: FnMut(&Value, f64) -> HandlerResult + Send + 'static,
    {
        self.registry.on(event_type, handler);
    }

    /// Record `event` in history, then run its handlers.
    pub fn dispatch(&mut self, event: Event) -> DispatchOutcome {
        debug!(event_type = %event.event_type, "event");
        let kind = event.kind();
        self.history.push(event.clone());
        self.registry.invoke(&kind, &event.payload, event.timestamp)
    }

    #[allow(clippy::cast_precision_loss)]
    fn emit_lifecycle(&mut self, kind: EventType, payload: Value) {
        let now = self.clock.now_ms() as f64;
        self.registry.invoke(&kind, &payload, now);
    }

    // =========================================================================
    // OUTBOUND
    // =========================================================================

    /// Send an action now if connected, otherwise queue it.
    ///
    /// # Errors
    ///
    /// Returns the transport's error when an immediate send fails. Queuing
    /// never fails.
    pub fn send_action(&mut self, name: &str, payload: Value) -> Result<SendOutcome, TransportError> {
        if self.state == ConnectionState::Connected {
            self.transport.emit(name, &payload)?;
            debug!(action = %name, "action sent");
            return Ok(SendOutcome::Delivered);
        }

        let action = OfflineAction::emit(name, payload, self.clock.now_ms());
        self.queue.enqueue(action);
        Ok(SendOutcome::Queued)
    }

    #[must_use]
    pub fn queue_size(&self) -> usize {
        self.queue.size()
    }

    /// Names of queued actions, oldest first.
    #[must_use]
    pub fn pending_actions(&self) -> Vec<String> {
        self.queue.pending().map(|a| a.name.clone()).collect()
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    #[must_use]
    pub fn recent_events(&self, n: usize) -> Vec<Event> {
        self.history.recent(n)
    }

    #[must_use]
    pub fn all_history(&self) -> Vec<Event> {
        self.history.all()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // =========================================================================
    // SIGNALS
    // =========================================================================

    /// Apply one transport signal.
    pub fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Connected => {
                if self.closing {
                    debug!(endpoint = %self.config.endpoint, "ignoring connected from a closing session");
                    return;
                }
                info!(endpoint = %self.config.endpoint, "connected");
                self.state = ConnectionState::Connected;
                self.reconnect_attempts = 0;
                if !self.queue.is_empty() {
                    let report = self.queue.flush(&mut *self.transport);
                    info!(replayed = report.replayed, failed = report.failed, "offline queue flushed");
                }
                self.emit_lifecycle(EventType::Connected, json!({}));
            }
            Signal::Disconnected { reason } => {
                info!(endpoint = %self.config.endpoint, %reason, "disconnected");
                self.state = ConnectionState::Disconnected;
                self.closing = false;
                self.emit_lifecycle(EventType::Disconnected, json!({ "reason": reason }));
            }
            Signal::Error { message } => {
                warn!(endpoint = %self.config.endpoint, %message, "transport error");
                self.emit_lifecycle(EventType::Error, json!({ "message": message }));
            }
            Signal::Event(event) => {
                self.dispatch(event);
            }
            Signal::History(events) => {
                info!(count = events.len(), "received history events");
                for event in events {
                    self.dispatch(event);
                }
            }
            Signal::Reconnecting { attempt } => {
                debug!(attempt, max_attempts = self.config.reconnect.max_attempts, "reconnecting");
                self.reconnect_attempts = attempt;
            }
            Signal::ReconnectFailed => {
                warn!(
                    endpoint = %self.config.endpoint,
                    attempts = self.reconnect_attempts,
                    "reconnect attempts exhausted"
                );
                self.state = ConnectionState::Disconnected;
                self.session_active = false;
                self.closing = false;
            }
        }
    }

    /// Apply every signal already delivered, without waiting. Returns the
    /// number handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(signal) = self.signals.try_recv() {
            self.handle_signal(signal);
            handled += 1;
        }
        handled
    }

    /// Wait for the next signal. `None` once the transport has dropped its
    /// sender, which `WsTransport` only does when it is dropped itself.
    pub async fn next_signal(&mut self) -> Option<Signal> {
        self.signals.recv().await
    }

    /// Apply signals as they arrive.
    ///
    /// `WsTransport` holds its sender for as long as the client owns it, so
    /// with that transport this runs until the surrounding task is cancelled,
    /// e.g. by racing it against a shutdown signal in `tokio::select!`. It
    /// returns on its own only when a transport drops its sender.
    pub async fn run(&mut self) {
        while let Some(signal) = self.signals.recv().await {
            self.handle_signal(signal);
        }
    }
}

impl std::fmt::Debug for EventClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventClient")
            .field("endpoint", &self.config.endpoint)
            .field("state", &self.state)
            .field("session_active", &self.session_active)
            .field("closing", &self.closing)
            .field("reconnect_attempts", &self.reconnect_attempts)
            .field("history", &self.history.len())
            .field("queued", &self.queue.size())
            .field("handlers", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
