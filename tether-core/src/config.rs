//! Configuration sections shared by the bridge, device and console.
//!
//! Each binary embeds the sections it needs in its own TOML file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TetherError;

/// Handshake timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// How long the accepting side waits for a valid HELLO (ms).
    pub accept_timeout_ms: u64,
    /// How long the initiating side waits for OK after each HELLO (ms).
    pub reply_timeout_ms: u64,
    /// HELLO transmissions before the initiating side gives up.
    pub attempts: u32,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            accept_timeout_ms: 30_000,
            reply_timeout_ms: 2_000,
            attempts: 5,
        }
    }
}

impl HandshakeConfig {
    pub fn accept_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_timeout_ms)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

/// Serial port settings for the controller link. Framing is 8N1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0`.
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout of the blocking port (ms). Bounds how long a pump
    /// thread takes to notice shutdown.
    pub read_timeout_ms: u64,
    /// Open attempts before giving up.
    pub attempts: u32,
    /// Pause between failed open attempts (ms).
    pub retry_interval_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".into(),
            baud_rate: 9600,
            read_timeout_ms: 100,
            attempts: 5,
            retry_interval_ms: 5_000,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

/// Parameters baked into the operator's motion keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionDefaults {
    /// Forward/reverse distance in cm. Zero means "until stopped".
    pub distance_cm: i32,
    /// Forward/reverse power in percent.
    pub drive_power: i32,
    /// Turn angle in degrees. Zero means "until stopped".
    pub angle_deg: i32,
    /// Turn power in percent.
    pub turn_power: i32,
}

impl Default for MotionDefaults {
    fn default() -> Self {
        Self {
            distance_cm: 5,
            drive_power: 50,
            angle_deg: 90,
            turn_power: 100,
        }
    }
}

impl MotionDefaults {
    /// Reject values the device would answer with BAD_COMMAND.
    pub fn validate(&self) -> Result<(), TetherError> {
        if self.distance_cm < 0 || self.angle_deg < 0 {
            return Err(TetherError::Config("distance and angle must not be negative".into()));
        }
        for power in [self.drive_power, self.turn_power] {
            if !(0..=100).contains(&power) {
                return Err(TetherError::Config(format!("power {power} outside 0..=100")));
            }
        }
        Ok(())
    }
}
