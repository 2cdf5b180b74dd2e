//! Tether bridge: entry point.
//!
//! ```text
//! tether-bridge                  Run in the foreground
//! tether-bridge --config <path>  Load a custom config TOML
//! tether-bridge --gen-config     Write default config to stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tether_bridge::config::BridgeConfig;
use tether_bridge::service::BridgeService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tether-bridge", about = "Tether serial-to-network bridge")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "tether-bridge.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&BridgeConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let config = BridgeConfig::load(&cli.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("tether-bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("serial: {} @ {} baud", config.serial.port, config.serial.baud_rate);
    info!("operator port: {}", config.network.listen_port);

    let service = BridgeService::new(config);
    let stop = service.shutdown_handle();

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.cancel();
    });

    service.run().await?;

    Ok(())
}
