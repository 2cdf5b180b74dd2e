//! # tether-device: device-side session service
//!
//! Waits for HELLO on the serial link (or on a TCP port for bench
//! testing), then executes commands against the platform and answers
//! with acknowledgments and readings.
//!
//! Real actuation lives outside this crate. [`platform::SimulatedPlatform`]
//! stands in for it and keeps the telemetry counters moving.

pub mod config;
pub mod platform;
pub mod service;
