//! Configuration for the device process.

use std::path::Path;

use serde::{Deserialize, Serialize};

use tether_core::{HandshakeConfig, SerialConfig};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Which transport carries the sessions.
    pub link: LinkConfig,
    /// Serial port, used when `link.mode = "serial"`.
    pub serial: SerialConfig,
    /// Handshake timing.
    pub handshake: HandshakeConfig,
    /// Simulated platform behaviour.
    pub platform: PlatformConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Sessions arrive over the serial port, one after another.
    Serial,
    /// Sessions arrive as TCP connections, for bench testing.
    Tcp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub mode: LinkMode,
    /// Address to bind in TCP mode.
    pub bind_addr: String,
    /// Port to listen on in TCP mode.
    pub listen_port: u16,
}

/// How the simulated platform turns motion into counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Encoder ticks per centimetre of straight travel.
    pub ticks_per_cm: u32,
    /// Encoder ticks per degree of rotation, per wheel.
    pub ticks_per_degree: u32,
    /// Distance assumed for a motion that runs until stopped (cm).
    pub unbounded_cm: u32,
    /// Reading returned by the distance sensor (cm).
    pub obstacle_cm: u32,
    /// Reading returned by the colour sensor: red, green, blue.
    pub colour_rgb: [i32; 3],
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            mode: LinkMode::Tcp,
            bind_addr: "0.0.0.0".into(),
            listen_port: 5001,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            ticks_per_cm: 4,
            ticks_per_degree: 1,
            unbounded_cm: 10,
            obstacle_cm: 50,
            colour_rgb: [30, 200, 40],
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

impl DeviceConfig {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = toml::to_string_pretty(&DeviceConfig::default()).unwrap();
        assert!(text.contains("listen_port"));
        assert!(text.contains("ticks_per_cm"));
        assert!(text.contains("mode = \"tcp\""));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: DeviceConfig = toml::from_str(
            r#"
            [link]
            mode = "serial"

            [serial]
            port = "/dev/ttyUSB1"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.link.mode, LinkMode::Serial);
        assert_eq!(cfg.link.listen_port, 5001);
        assert_eq!(cfg.serial.port, "/dev/ttyUSB1");
        assert_eq!(cfg.serial.baud_rate, 9600);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = DeviceConfig::load(Path::new("/nonexistent/tether-device.toml"));
        assert_eq!(cfg.logging.level, "info");
    }
}
