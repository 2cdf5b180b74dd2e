//! # tether-core
//!
//! Packet protocol and command dispatch for remotely driving a small
//! mobile platform over a serial link and a network link.
//!
//! This crate contains:
//! - **Wire format**: `Packet`, fixed 102-byte frames with a BLAKE3 check
//! - **Codes**: `PacketKind`, `CommandCode`, `ResponseCode`
//! - **Codec**: `FrameCodec` for framed I/O via `tokio_util`
//! - **Network**: framed reader/writer halves, TCP connect, serial link
//! - **Handshake**: HELLO/OK session opening, both sides
//! - **Dispatch**: `DeviceCommand`, `Platform` and the device command loop
//! - **Telemetry**: tick and distance counters and their RESPONSE layout
//! - **Relay**: the operator's inbound/outbound task pair and key bindings
//! - **State**: session lifecycle and the shared cancellation handle
//! - **Error**: `TetherError` and per-frame `FrameError`

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handshake;
pub mod message;
pub mod network;
pub mod packet;
pub mod relay;
pub mod state;
pub mod telemetry;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use codec::{Decoded, FrameCodec};
pub use config::{HandshakeConfig, MotionDefaults, SerialConfig};
pub use dispatch::{DeviceCommand, Dispatcher, Extent, Motion, Platform, Power};
pub use error::{FrameError, TetherError};
pub use message::{CommandCode, PacketKind, ResponseCode};
pub use network::{ConnectionInfo, FrameReader, FrameWriter, PacketSink, SerialLink, split};
pub use packet::{FRAME_SIZE, PARAM_COUNT, Packet, TEXT_LEN};
pub use relay::{ConsoleEvent, KeyAction, KeyMap, Relay, Report};
pub use state::{SessionHandle, SessionPhase};
pub use telemetry::{
    ColourClass, ColourReading, DirectionClass, Telemetry, TelemetryRecord, Travel, Wheel,
};
