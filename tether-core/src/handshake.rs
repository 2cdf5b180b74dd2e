//! Session opening.
//!
//! The accepting side answers every frame that is not a well-formed HELLO
//! with an ERROR and keeps waiting; the first HELLO is acknowledged with
//! exactly one RESPONSE OK. The initiating side sends HELLO and waits for
//! that OK, resending a bounded number of times.

use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::codec::Decoded;
use crate::config::HandshakeConfig;
use crate::error::{FrameError, TetherError};
use crate::message::{PacketKind, ResponseCode};
use crate::network::{FrameReader, PacketSink};
use crate::packet::Packet;
use crate::state::SessionHandle;

/// The ERROR packet that answers a frame which failed to decode.
pub fn rejection(err: &FrameError) -> Packet {
    match err {
        FrameError::IntegrityMismatch { .. } => Packet::error(ResponseCode::BadChecksum),
        FrameError::UnknownKind(_) | FrameError::Incomplete { .. } => {
            Packet::error(ResponseCode::BadPacket)
        }
    }
}

/// What the accepting side does with one frame while awaiting HELLO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelloStep {
    /// Not a HELLO. Send this and keep waiting.
    Reject(Packet),
    /// A HELLO. Acknowledge and move to established.
    Established,
}

pub fn screen(frame: &Decoded) -> HelloStep {
    match frame {
        Ok(packet) if packet.kind() == PacketKind::Hello => HelloStep::Established,
        Ok(_) => HelloStep::Reject(Packet::error(ResponseCode::BadResponse)),
        Err(e) => HelloStep::Reject(rejection(e)),
    }
}

// ── Accepting side ───────────────────────────────────────────────

/// Wait for HELLO under the configured deadline, then send OK once.
///
/// Returns `Timeout` when no HELLO arrives in time and `ConnectionClosed`
/// on EOF or cancellation. On success the session is `Active`.
pub async fn accept<R, S>(
    reader: &mut FrameReader<R>,
    sink: &mut S,
    config: &HandshakeConfig,
    session: &SessionHandle,
) -> Result<(), TetherError>
where
    R: AsyncRead + Unpin,
    S: PacketSink + ?Sized,
{
    session.begin_handshake()?;
    let deadline = config.accept_timeout();

    match tokio::time::timeout(deadline, await_hello(reader, sink, session)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(?deadline, "no HELLO before the deadline");
            return Err(TetherError::Timeout(deadline));
        }
    }

    session.complete_handshake()?;
    info!("handshake accepted");
    Ok(())
}

async fn await_hello<R, S>(
    reader: &mut FrameReader<R>,
    sink: &mut S,
    session: &SessionHandle,
) -> Result<(), TetherError>
where
    R: AsyncRead + Unpin,
    S: PacketSink + ?Sized,
{
    loop {
        let frame = tokio::select! {
            _ = session.cancelled() => return Err(TetherError::ConnectionClosed),
            frame = reader.recv() => frame?,
        };
        let Some(frame) = frame else {
            return Err(TetherError::ConnectionClosed);
        };

        match screen(&frame) {
            HelloStep::Established => {
                sink.send_packet(Packet::ok()).await?;
                return Ok(());
            }
            HelloStep::Reject(reply) => {
                debug!(?frame, "rejected before HELLO");
                sink.send_packet(reply).await?;
            }
        }
    }
}

// ── Initiating side ──────────────────────────────────────────────

/// Send HELLO and wait for OK, up to `config.attempts` times.
pub async fn initiate<R, S>(
    reader: &mut FrameReader<R>,
    sink: &mut S,
    config: &HandshakeConfig,
    session: &SessionHandle,
) -> Result<(), TetherError>
where
    R: AsyncRead + Unpin,
    S: PacketSink + ?Sized,
{
    session.begin_handshake()?;

    for attempt in 1..=config.attempts {
        sink.send_packet(Packet::hello()).await?;

        match tokio::time::timeout(config.reply_timeout(), await_ok(reader, session)).await {
            Ok(Ok(true)) => {
                session.complete_handshake()?;
                info!(attempt, "handshake established");
                return Ok(());
            }
            Ok(Ok(false)) => debug!(attempt, "HELLO rejected"),
            Ok(Err(e)) => return Err(e),
            Err(_) => debug!(attempt, "no reply to HELLO"),
        }
    }

    warn!(attempts = config.attempts, "handshake failed");
    Err(TetherError::HandshakeFailed {
        attempts: config.attempts,
    })
}

/// `true` on RESPONSE OK, `false` on a rejection or a corrupt reply.
async fn await_ok<R>(reader: &mut FrameReader<R>, session: &SessionHandle) -> Result<bool, TetherError>
where
    R: AsyncRead + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = session.cancelled() => return Err(TetherError::ConnectionClosed),
            frame = reader.recv() => frame?,
        };
        match frame {
            None => return Err(TetherError::ConnectionClosed),
            Some(Ok(packet)) if packet.is_ok() => return Ok(true),
            Some(Ok(packet)) if packet.kind() == PacketKind::Error => return Ok(false),
            Some(Ok(packet)) => debug!(?packet, "ignored while awaiting OK"),
            Some(Err(e)) => {
                debug!(error = %e, "corrupt reply to HELLO");
                return Ok(false);
            }
        }
    }
}
