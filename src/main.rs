use std::pin::pin;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use livefeed::{ClientConfig, ConfigError, EventClient, EventType, Signal, TransportError, WsTransport};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("could not start connection to {0}")]
    ConnectFailed(String),
    #[error("send failed: {0}")]
    Transport(#[from] TransportError),
    #[error("timed out after {0}s waiting for delivery")]
    Timeout(u64),
    #[error("reconnect attempts exhausted")]
    ReconnectFailed,
}

#[derive(Parser, Debug)]
#[command(name = "livefeed", about = "Reconnecting real-time event feed client")]
struct Cli {
    /// Feed endpoint; overrides `LIVEFEED_URL`.
    #[arg(long)]
    url: Option<String>,

    /// Events kept in history; overrides `LIVEFEED_HISTORY_CAPACITY`.
    #[arg(long)]
    history_capacity: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print events of the given types as JSON lines until Ctrl-C.
    Tail(TailArgs),
    /// Send one action, waiting for a connection if needed.
    Send(SendArgs),
}

#[derive(Args, Debug)]
struct TailArgs {
    #[arg(long = "type", required = true)]
    types: Vec<String>,

    /// On exit, print this many of the most recent events to stderr.
    #[arg(long, default_value_t = 0)]
    recent: usize,
}

#[derive(Args, Debug)]
struct SendArgs {
    action: String,

    #[arg(long, default_value = "{}")]
    data: String,

    #[arg(long, default_value_t = 10)]
    wait_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.url {
        config.endpoint = url;
    }
    if let Some(capacity) = cli.history_capacity {
        config.history_capacity = capacity;
    }
    config.validate()?;

    match cli.command {
        Command::Tail(args) => run_tail(config, args).await,
        Command::Send(args) => run_send(config, args).await,
    }
}

async fn run_tail(config: ClientConfig, args: TailArgs) -> Result<(), CliError> {
    let mut client = EventClient::new(config, WsTransport::new());
    for event_type in &args.types {
        let label = event_type.clone();
        client.on(event_type.as_str(), move |payload, ts| {
            let line = serde_json::json!({ "type": label, "timestamp": ts, "data": payload });
            println!("{line}");
            Ok(())
        });
    }
    client.on(EventType::Connected, |_, _| {
        eprintln!("● live");
        Ok(())
    });
    client.on(EventType::Disconnected, |payload, _| {
        let reason = payload.get("reason").and_then(Value::as_str).unwrap_or("unknown");
        eprintln!("● reconnecting ({reason})");
        Ok(())
    });

    start(&mut client)?;

    let mut shutdown = pin!(tokio::signal::ctrl_c());
    let result = loop {
        tokio::select! {
            _ = &mut shutdown => break Ok(()),
            signal = client.next_signal() => {
                let Some(signal) = signal else { break Ok(()) };
                let exhausted = signal == Signal::ReconnectFailed;
                client.handle_signal(signal);
                if exhausted {
                    break Err(CliError::ReconnectFailed);
                }
            }
        }
    };

    shutdown_client(&mut client).await;
    for event in client.recent_events(args.recent) {
        eprintln!("{} {} {}", event.timestamp, event.event_type, event.payload);
    }
    result
}

async fn run_send(config: ClientConfig, args: SendArgs) -> Result<(), CliError> {
    let payload: Value = serde_json::from_str(&args.data)?;
    let mut client = EventClient::new(config, WsTransport::new());
    start(&mut client)?;

    if !client.send_action(&args.action, payload)?.is_delivered() {
        eprintln!("queued `{}`; waiting for connection", args.action);
    }

    let result = match tokio::time::timeout(Duration::from_secs(args.wait_secs), wait_for_delivery(&mut client)).await {
        Ok(result) => result,
        Err(_) => Err(CliError::Timeout(args.wait_secs)),
    };
    if result.is_ok() {
        eprintln!("delivered `{}`", args.action);
    }

    shutdown_client(&mut client).await;
    result
}

fn start(client: &mut EventClient) -> Result<(), CliError> {
    client.connect();
    if client.is_session_active() {
        Ok(())
    } else {
        Err(CliError::ConnectFailed(client.config().endpoint.clone()))
    }
}

async fn wait_for_delivery(client: &mut EventClient) -> Result<(), CliError> {
    while client.queue_size() > 0 || !client.is_connected() {
        let Some(signal) = client.next_signal().await else {
            return Err(CliError::ReconnectFailed);
        };
        let exhausted = signal == Signal::ReconnectFailed;
        client.handle_signal(signal);
        if exhausted {
            return Err(CliError::ReconnectFailed);
        }
    }
    Ok(())
}

/// Close the session and give the transport a moment to write the close frame.
async fn shutdown_client(client: &mut EventClient) {
    if !client.is_session_active() {
        return;
    }
    client.disconnect();
    let _ = tokio::time::timeout(Duration::from_secs(1), async {
        while let Some(signal) = client.next_signal().await {
            let done = matches!(signal, Signal::Disconnected { .. });
            client.handle_signal(signal);
            if done {
                break;
            }
        }
    })
    .await;
}
