//! Configuration for the bridge.

use std::path::Path;

use serde::{Deserialize, Serialize};

use tether_core::{HandshakeConfig, SerialConfig};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Network side, facing the operator.
    pub network: NetworkConfig,
    /// Serial side, facing the controller.
    pub serial: SerialConfig,
    /// Handshake timing, used on both sides.
    pub handshake: HandshakeConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind the operator listener on.
    pub bind_addr: String,
    /// TCP port operators connect to.
    pub listen_port: u16,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".into(),
            listen_port: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl BridgeConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// `bind_addr:listen_port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.network.bind_addr, self.network.listen_port)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = toml::to_string_pretty(&BridgeConfig::default()).unwrap();
        assert!(text.contains("listen_port"));
        assert!(text.contains("baud_rate"));
        assert!(text.contains("reply_timeout_ms"));
    }

    #[test]
    fn roundtrip_config() {
        let mut cfg = BridgeConfig::default();
        cfg.serial.port = "/dev/ttyUSB0".into();
        cfg.network.listen_port = 6000;
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: BridgeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.serial.port, "/dev/ttyUSB0");
        assert_eq!(parsed.listen_addr(), "0.0.0.0:6000");
    }
}
