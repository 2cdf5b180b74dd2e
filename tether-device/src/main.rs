//! Tether device: entry point.
//!
//! ```text
//! tether-device                  Run in the foreground
//! tether-device --config <path>  Load a custom config TOML
//! tether-device --gen-config     Write default config to stdout
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tether_device::config::{DeviceConfig, LinkMode};
use tether_device::service::DeviceService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tether-device", about = "Tether device command service")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "tether-device.toml")]
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
        let text = toml::to_string_pretty(&DeviceConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let config = DeviceConfig::load(&cli.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("tether-device v{}", env!("CARGO_PKG_VERSION"));
    match config.link.mode {
        LinkMode::Serial => info!(
            "link: serial {} @ {} baud",
            config.serial.port, config.serial.baud_rate
        ),
        LinkMode::Tcp => info!(
            "link: tcp {}:{}",
            config.link.bind_addr, config.link.listen_port
        ),
    }

    let service = DeviceService::new(config);
    let stop = service.shutdown_handle();

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.cancel();
    });

    service.run().await?;

    Ok(())
}
