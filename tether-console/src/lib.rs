//! # tether-console: operator console
//!
//! Connects to a bridge, opens a session and drives the platform with
//! single key presses. Replies are printed as they arrive.

pub mod config;
pub mod display;
pub mod input;
