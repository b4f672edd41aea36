use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::{Signal, SignalSender, Transport, TransportError};
use crate::config::ReconnectPolicy;

#[derive(Default)]
pub(crate) struct MockState {
    pub signals: Option<SignalSender>,
    pub connect_calls: Vec<String>,
    pub disconnect_calls: usize,
    pub emitted: Vec<(String, Value)>,
    pub fail_connect: bool,
    pub fail_emit_names: Vec<String>,
}

/// In-memory transport double. Clones share state so a test can keep a
/// handle after moving one into the client.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    pub state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self, signal: Signal) {
        let state = self.state.lock().expect("mock state lock");
        state
            .signals
            .as_ref()
            .expect("client should have subscribed")
            .send(signal)
            .expect("client should hold the receiver");
    }

    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.state.lock().expect("mock state lock").emitted.clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.state.lock().expect("mock state lock").connect_calls.len()
    }

    pub fn disconnect_calls(&self) -> usize {
        self.state.lock().expect("mock state lock").disconnect_calls
    }

    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().expect("mock state lock").fail_connect = fail;
    }

    pub fn fail_emit(&self, name: &str) {
        self.state
            .lock()
            .expect("mock state lock")
            .fail_emit_names
            .push(name.to_owned());
    }
}

impl Transport for MockTransport {
    fn subscribe(&mut self, signals: SignalSender) {
        self.state.lock().expect("mock state lock").signals = Some(signals);
    }

    fn connect(&mut self, endpoint: &str, _policy: &ReconnectPolicy) -> Result<(), TransportError> {
        let mut state = self.state.lock().expect("mock state lock");
        state.connect_calls.push(endpoint.to_owned());
        if state.fail_connect {
            return Err(TransportError::InvalidEndpoint {
                endpoint: endpoint.to_owned(),
                reason: "mock refused".to_owned(),
            });
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.state.lock().expect("mock state lock").disconnect_calls += 1;
    }

    fn emit(&mut self, name: &str, payload: &Value) -> Result<(), TransportError> {
        let mut state = self.state.lock().expect("mock state lock");
        if state.fail_emit_names.iter().any(|n| n == name) {
            return Err(TransportError::SessionClosed);
        }
        state.emitted.push((name.to_owned(), payload.clone()));
        Ok(())
    }
}
