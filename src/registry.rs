//! Handler registry. Ordered callbacks per event type.
//!
//! DESIGN
//! ======
//! Handlers are boxed `FnMut(&Value, f64)` closures stored per [`EventType`]
//! in registration order. Registering the same closure logic twice yields two
//! independent entries, and both run.
//!
//! Every invocation is isolated: a handler that returns `Err` or panics is
//! logged and skipped, and the remaining handlers still run. Nothing a
//! handler does can propagate out of [`HandlerRegistry::invoke`].

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde_json::Value;
use tracing::error;

use crate::event::EventType;

/// Error type handlers may return to report a failure.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by every handler.
pub type HandlerResult = Result<(), HandlerError>;

type Handler = Box<dyn FnMut(&Value, f64) -> HandlerResult + Send>;

/// Tally of one invocation round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Handlers that were called.
    pub invoked: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventType, Vec<Handler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `event_type`.
    pub fn on<F>(&mut self, event_type: impl Into<EventType>, handler: F)
    where
        F: FnMut(&Value, f64) -> HandlerResult + Send + 'static,
    {
        self.handlers
            .entry(event_type.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// Number of handlers registered for `event_type`.
    #[must_use]
    pub fn count(&self, event_type: &EventType) -> usize {
        self.handlers.get(event_type).map_or(0, Vec::len)
    }

    /// Call every handler for `event_type` in registration order.
    pub fn invoke(&mut self, event_type: &EventType, payload: &Value, timestamp: f64) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let Some(handlers) = self.handlers.get_mut(event_type) else {
            return outcome;
        };

        for (index, handler) in handlers.iter_mut().enumerate() {
            outcome.invoked += 1;
            match catch_unwind(AssertUnwindSafe(|| handler(payload, timestamp))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    outcome.failed += 1;
                    error!(event_type = %event_type, index, error = %e, "handler failed");
                }
                Err(panic) => {
                    outcome.failed += 1;
                    error!(event_type = %event_type, index, panic = panic_message(panic.as_ref()), "handler panicked");
                }
            }
        }

        outcome
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (event_type, handlers) in &self.handlers {
            map.entry(&event_type.as_str(), &handlers.len());
        }
        map.finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
