//! Tether operator console: entry point.
//!
//! ```text
//! tether-console <host> <port>                  Connect and drive
//! tether-console <host> <port> --config <path>  Load a custom config TOML
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tether_console::config::ConsoleConfig;
use tether_console::display::{print_raw, render};
use tether_console::input::{RawModeGuard, spawn_key_reader};
use tether_core::{ConnectionInfo, ConsoleEvent, KeyMap, Relay, SessionHandle, handshake, split};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tether-console", about = "Drive the platform from the keyboard")]
struct Cli {
    /// Bridge host name or address.
    host: String,

    /// Bridge TCP port.
    port: u16,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "tether-console.toml")]
    config: PathBuf,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ConsoleConfig::load(&cli.config);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let keymap = KeyMap::new(config.motion)?;
    let peer = ConnectionInfo::new(cli.host, cli.port);

    println!("Connecting to {peer}...");
    let stream = peer.connect(config.connect_timeout()).await?;
    let (mut reader, mut writer) = split(stream);

    let session = SessionHandle::new();
    handshake::initiate(&mut reader, &mut writer, &config.handshake, &session).await?;
    info!("session open with {peer}");
    println!("Connected. {}", KeyMap::help());

    let (key_tx, key_rx) = mpsc::channel(32);
    let (event_tx, mut events) = mpsc::unbounded_channel();

    let _raw = RawModeGuard::enable()?;
    let key_reader = spawn_key_reader(key_tx, session.token());

    let relay = tokio::spawn({
        let session = session.clone();
        async move {
            Relay::new(keymap)
                .run(reader, writer, key_rx, event_tx, session)
                .await
        }
    });

    let mut stdout = std::io::stdout();
    while let Some(event) = events.recv().await {
        print_raw(&mut stdout, &render(&event))?;
        if event == ConsoleEvent::Closed {
            break;
        }
    }

    relay.await?;
    key_reader.await?;
    Ok(())
}
