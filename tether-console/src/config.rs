//! Configuration for the operator console.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tether_core::{HandshakeConfig, MotionDefaults};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// How long to wait for the TCP connection (ms).
    pub connect_timeout_ms: u64,
    /// Handshake timing.
    pub handshake: HandshakeConfig,
    /// Parameters sent with the motion keys.
    pub motion: MotionDefaults,
    /// Log level for stderr. Kept quiet so it does not bury replies.
    pub log_level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            handshake: HandshakeConfig::default(),
            motion: MotionDefaults::default(),
            log_level: "warn".into(),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_section_overrides_defaults() {
        let cfg: ConsoleConfig = toml::from_str(
            r#"
            [motion]
            distance_cm = 20
            "#,
        )
        .unwrap();
        assert_eq!(cfg.motion.distance_cm, 20);
        assert_eq!(cfg.motion.drive_power, 50);
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(5));
    }
}
