//! # tether-bridge: serial to network relay
//!
//! Holds the serial link to the on-board controller for the lifetime of
//! the process and serves one network operator at a time:
//!
//! - **Startup**: open the serial port with bounded retries, then send
//!   HELLO to the controller until it answers OK.
//! - **Per operator**: accept the operator's HELLO, then forward its
//!   COMMAND frames to the controller and every controller frame back.
//! - **Teardown**: an operator leaving ends only that session. Losing
//!   the serial link ends the process.

pub mod config;
pub mod service;
