//! WebSocket transport over tokio-tungstenite.
//!
//! DESIGN
//! ======
//! `connect` spawns one session task per call. The task owns the socket and
//! runs a `select!` loop:
//! - Inbound text messages → `wire::decode` → signal to the client
//! - Outbound commands from `emit` / `disconnect` → socket
//!
//! LIFECYCLE
//! =========
//! 1. Dial → `Connected` (backoff reset) or `Error`
//! 2. Relay until the socket drops → `Disconnected`
//! 3. Retry: `Reconnecting { attempt }`, sleep `Backoff::next_delay()`, dial
//!    again. After `max_attempts` consecutive failures → `ReconnectFailed`.
//! 4. `disconnect` (or dropping the transport) closes the socket; no retry.
//!
//! Emits that arrive while the socket is down are buffered and written first
//! on the next session.

use std::collections::VecDeque;
use std::pin::pin;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use super::{Signal, SignalSender, Transport, TransportError};
use crate::backoff::Backoff;
use crate::config::ReconnectPolicy;
use crate::wire;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Command {
    Emit(String),
    Close,
}

enum SessionEnd {
    /// Closed on request; do not reconnect.
    Closed,
    /// Lost; reconnect per policy.
    Dropped(String),
}

#[derive(Default)]
pub struct WsTransport {
    signals: Option<SignalSender>,
    session: Option<mpsc::UnboundedSender<Command>>,
}

impl WsTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for WsTransport {
    fn subscribe(&mut self, signals: SignalSender) {
        self.signals = Some(signals);
    }

    fn connect(&mut self, endpoint: &str, policy: &ReconnectPolicy) -> Result<(), TransportError> {
        let signals = self.signals.clone().ok_or(TransportError::NotSubscribed)?;
        validate_endpoint(endpoint)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TransportError::NoRuntime)?;

        if let Some(previous) = self.session.take() {
            let _ = previous.send(Command::Close);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(session_loop(endpoint.to_owned(), *policy, signals, rx));
        self.session = Some(tx);
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = session.send(Command::Close);
        }
    }

    fn emit(&mut self, name: &str, payload: &Value) -> Result<(), TransportError> {
        let session = self.session.as_ref().ok_or(TransportError::NotConnected)?;
        let text = wire::encode(name, payload)?;
        session
            .send(Command::Emit(text))
            .map_err(|_| TransportError::SessionClosed)
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), TransportError> {
    let invalid = |reason: &str| TransportError::InvalidEndpoint {
        endpoint: endpoint.to_owned(),
        reason: reason.to_owned(),
    };

    let uri: Uri = endpoint.parse().map_err(|_| invalid("not a valid URI"))?;
    match uri.scheme_str() {
        Some("ws" | "wss") => {}
        _ => return Err(invalid("scheme must be ws or wss")),
    }
    if uri.host().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(())
}

// =============================================================================
// SESSION TASK
// =============================================================================

async fn session_loop(
    endpoint: String,
    policy: ReconnectPolicy,
    signals: SignalSender,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let mut backoff = Backoff::new(policy);
    let mut pending: VecDeque<String> = VecDeque::new();

    loop {
        let Some(dialed) = dial(&endpoint, &mut commands, &mut pending).await else {
            debug!(%endpoint, "ws: closed while dialing");
            return;
        };

        match dialed {
            Ok(stream) => {
                backoff.reset();
                info!(%endpoint, "ws: connected");
                if signals.send(Signal::Connected).is_err() {
                    return;
                }

                let end = run_session(stream, &signals, &mut commands, &mut pending).await;
                let reason = match &end {
                    SessionEnd::Closed => "client closed".to_owned(),
                    SessionEnd::Dropped(reason) => reason.clone(),
                };
                info!(%endpoint, %reason, "ws: disconnected");
                let _ = signals.send(Signal::Disconnected { reason });
                if matches!(end, SessionEnd::Closed) {
                    return;
                }
            }
            Err(message) => {
                warn!(%endpoint, error = %message, "ws: connect failed");
                if signals.send(Signal::Error { message }).is_err() {
                    return;
                }
            }
        }

        if backoff.attempts() >= policy.max_attempts {
            warn!(%endpoint, attempts = backoff.attempts(), "ws: giving up");
            let _ = signals.send(Signal::ReconnectFailed);
            return;
        }

        let delay = backoff.next_delay();
        let attempt = backoff.attempts();
        debug!(%endpoint, attempt, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "ws: scheduling reconnect");
        if signals.send(Signal::Reconnecting { attempt }).is_err() {
            return;
        }
        if !wait_before_retry(delay, &mut commands, &mut pending).await {
            debug!(%endpoint, "ws: closed while waiting to reconnect");
            return;
        }
    }
}

/// Dial `endpoint`, buffering emits meanwhile. `None` if closed first.
async fn dial(
    endpoint: &str,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    pending: &mut VecDeque<String>,
) -> Option<Result<WsStream, String>> {
    let mut connecting = pin!(connect_async(endpoint));
    loop {
        tokio::select! {
            result = &mut connecting => {
                return Some(result.map(|(stream, _)| stream).map_err(|e| e.to_string()));
            }
            cmd = commands.recv() => match cmd {
                Some(Command::Emit(text)) => pending.push_back(text),
                Some(Command::Close) | None => return None,
            }
        }
    }
}

/// Sleep `delay`, buffering emits meanwhile. `false` if closed first.
async fn wait_before_retry(
    delay: Duration,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    pending: &mut VecDeque<String>,
) -> bool {
    let mut sleep = pin!(tokio::time::sleep(delay));
    loop {
        tokio::select! {
            () = &mut sleep => return true,
            cmd = commands.recv() => match cmd {
                Some(Command::Emit(text)) => pending.push_back(text),
                Some(Command::Close) | None => return false,
            }
        }
    }
}

async fn run_session(
    stream: WsStream,
    signals: &SignalSender,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    pending: &mut VecDeque<String>,
) -> SessionEnd {
    let (mut write, mut read) = stream.split();

    while let Some(text) = pending.pop_front() {
        if let Err(e) = write.send(Message::Text(text.clone().into())).await {
            pending.push_front(text);
            return SessionEnd::Dropped(e.to_string());
        }
    }

    loop {
        tokio::select! {
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => deliver(text.as_str(), signals),
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.as_str().to_owned())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".to_owned());
                    return SessionEnd::Dropped(reason);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Dropped(e.to_string()),
                None => return SessionEnd::Dropped("stream ended".to_owned()),
            },
            cmd = commands.recv() => match cmd {
                Some(Command::Emit(text)) => {
                    if let Err(e) = write.send(Message::Text(text.clone().into())).await {
                        pending.push_back(text);
                        return SessionEnd::Dropped(e.to_string());
                    }
                }
                Some(Command::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    return SessionEnd::Closed;
                }
            }
        }
    }
}

fn deliver(text: &str, signals: &SignalSender) {
    match wire::decode(text) {
        Ok(Some(signal)) => {
            let _ = signals.send(signal);
        }
        Ok(None) => debug!(len = text.len(), "ws: ignoring unconsumed message"),
        Err(e) => {
            warn!(error = %e, "ws: invalid inbound message");
            let _ = signals.send(Signal::Error { message: e.to_string() });
        }
    }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
