//! Domain-specific error types for the Tether protocol.
//!
//! Fallible operations return `Result<T, TetherError>`. Per-frame decode
//! outcomes use the separate [`FrameError`] so a corrupt frame can be
//! answered and skipped without ending the stream.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the Tether protocol.
#[derive(Debug, Error)]
pub enum TetherError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u64 },

    /// A packet or state transition violated protocol rules.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// The peer never acknowledged our HELLO.
    #[error("handshake failed after {attempts} attempts")]
    HandshakeFailed { attempts: u32 },

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The peer closed the byte stream.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The serial port could not be opened or configured.
    #[error("serial link error: {0}")]
    Serial(String),

    // ── Configuration Errors ─────────────────────────────────────
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

// ── FrameError ────────────────────────────────────────────────────

/// Outcome of decoding a single frame that did not yield a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Fewer bytes than one frame are available. Keep accumulating.
    #[error("incomplete frame: {available} of {needed} bytes")]
    Incomplete { available: usize, needed: usize },

    /// The transmitted check does not match the recomputed one.
    #[error("integrity mismatch: expected {expected:#010x}, got {actual:#010x}")]
    IntegrityMismatch { expected: u32, actual: u32 },

    /// The kind byte is outside the defined enumeration.
    #[error("unknown packet kind: {0:#04x}")]
    UnknownKind(u8),
}

// ── Convenient From implementations ──────────────────────────────

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for TetherError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        TetherError::ChannelClosed
    }
}

impl From<serialport::Error> for TetherError {
    fn from(e: serialport::Error) -> Self {
        TetherError::Serial(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = TetherError::HandshakeFailed { attempts: 3 };
        assert!(e.to_string().contains('3'));

        let e = FrameError::IntegrityMismatch {
            expected: 0xdead_beef,
            actual: 0x1234_5678,
        };
        assert!(e.to_string().contains("0xdeadbeef"));
        assert!(e.to_string().contains("0x12345678"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: TetherError = io_err.into();
        assert!(matches!(e, TetherError::Connection(_)));
    }

    #[test]
    fn unknown_kind_is_displayed_in_hex() {
        assert_eq!(FrameError::UnknownKind(0x2a).to_string(), "unknown packet kind: 0x2a");
    }
}
