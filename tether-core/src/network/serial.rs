//! Serial link to the on-board controller.
//!
//! `serialport` is blocking, so the port is bridged onto an in-memory
//! tokio duplex pipe by two pump threads:
//!
//! ```text
//!   port.read  ──► reader pump ──► duplex ──► FrameReader
//!   port.write ◄── writer pump ◄── duplex ◄── FrameWriter
//! ```
//!
//! Dropping the returned stream stops the writer pump, which cancels
//! the reader pump on its next read timeout. A port that reports EOF or
//! a hard error shuts the pipe, so the framed side reads end-of-stream,
//! and stops the writer pump.

use std::io::{ErrorKind, Read, Write};

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::TetherError;
use crate::packet::FRAME_SIZE;

/// Pipe capacity between the pumps and the framed side.
const PIPE_CAPACITY: usize = FRAME_SIZE * 16;

pub struct SerialLink;

impl SerialLink {
    /// Open the configured port, retrying up to `config.attempts` times.
    pub async fn open(config: &SerialConfig) -> Result<DuplexStream, TetherError> {
        let attempts = config.attempts.max(1);
        let mut attempt = 1;
        let port = loop {
            info!("opening serial port {} (attempt {attempt} of {attempts})", config.port);
            let opened = serialport::new(config.port.as_str(), config.baud_rate)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::None)
                .stop_bits(serialport::StopBits::One)
                .timeout(config.read_timeout())
                .open();
            match opened {
                Ok(port) => break port,
                Err(e) if attempt < attempts => {
                    warn!("failed to open {}: {e}; retrying in {:?}", config.port, config.retry_interval());
                    attempt += 1;
                    tokio::time::sleep(config.retry_interval()).await;
                }
                Err(e) => return Err(e.into()),
            }
        };
        info!("connected to serial port {}", config.port);

        let reader = port.try_clone()?;
        Ok(Self::spawn_pumps(reader, port))
    }

    /// Bridge a blocking reader/writer pair onto a tokio duplex stream.
    pub fn spawn_pumps<R, W>(mut port_rx: R, mut port_tx: W) -> DuplexStream
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let (local, remote) = tokio::io::duplex(PIPE_CAPACITY);
        let (mut pipe_rx, mut pipe_tx) = tokio::io::split(remote);
        let cancel = CancellationToken::new();
        let handle = Handle::current();

        // Port -> pipe
        let reader_cancel = cancel.clone();
        let reader_handle = handle.clone();
        tokio::task::spawn_blocking(move || {
            let mut buf = [0u8; FRAME_SIZE];
            while !reader_cancel.is_cancelled() {
                match port_rx.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if reader_handle.block_on(pipe_tx.write_all(&buf[..n])).is_err() {
                            break;
                        }
                    }
                    Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => continue,
                    Err(e) => {
                        warn!("serial read error: {e}");
                        break;
                    }
                }
            }
            reader_cancel.cancel();
            let _ = reader_handle.block_on(pipe_tx.shutdown());
            debug!("serial reader pump stopped");
        });

        // Pipe -> port
        tokio::task::spawn_blocking(move || {
            let mut buf = [0u8; FRAME_SIZE];
            loop {
                let read = handle.block_on(async {
                    tokio::select! {
                        _ = cancel.cancelled() => Ok(0),
                        read = pipe_rx.read(&mut buf) => read,
                    }
                });
                match read {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Err(e) = port_tx.write_all(&buf[..n]).and_then(|_| port_tx.flush()) {
                            warn!("serial write error: {e}");
                            break;
                        }
                    }
                }
            }
            cancel.cancel();
            debug!("serial writer pump stopped");
        });

        local
    }
}
