//! Reconnecting real-time event client.
//!
//! `livefeed` keeps a dashboard-style consumer attached to a push feed:
//! it dispatches incoming events to registered handlers, keeps a bounded
//! history of what it saw, and queues outbound actions while the connection
//! is down so they are replayed once it comes back.
//!
//! ```no_run
//! use livefeed::{ClientConfig, EventClient, WsTransport};
//!
//! # async fn demo() {
//! let mut client = EventClient::new(ClientConfig::new("ws://127.0.0.1:5000/ws"), WsTransport::new());
//! client.on("matched", |payload, ts| {
//!     println!("{ts}: {payload}");
//!     Ok(())
//! });
//! client.connect();
//! client.run().await;
//! # }
//! ```

pub mod backoff;
pub mod client;
pub mod clock;
pub mod config;
pub mod event;
pub mod history;
pub mod queue;
pub mod registry;
pub mod transport;
pub mod wire;

pub use client::{ConnectionState, DEFAULT_RECENT_COUNT, EventClient, SendOutcome};
pub use config::{ClientConfig, ConfigError, ReconnectPolicy};
pub use event::{Event, EventType};
pub use registry::{DispatchOutcome, HandlerError, HandlerResult};
pub use transport::ws::WsTransport;
pub use transport::{Signal, Transport, TransportError};
