//! Device-side command handling.
//!
//! Every accepted command is acknowledged with RESPONSE OK before the
//! platform acts on it. Queries follow the acknowledgment with a second
//! RESPONSE carrying the reading. Nothing a peer sends ends the loop;
//! only the transport or the session token does.

pub mod command;

pub use command::{DeviceCommand, Extent, Motion, Power};

use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::codec::Decoded;
use crate::error::TetherError;
use crate::handshake::rejection;
use crate::message::{PacketKind, ResponseCode};
use crate::network::{FrameReader, PacketSink};
use crate::packet::Packet;
use crate::state::SessionHandle;
use crate::telemetry::{ColourReading, Telemetry, distance_packet};

// ── Platform ─────────────────────────────────────────────────────

/// Actuators and sensors of the device.
///
/// Calls are synchronous and return once the platform has taken the
/// command on. Motion is expected to update the shared [`Telemetry`].
pub trait Platform: Send {
    fn drive(&mut self, motion: Motion, extent: Extent, power: Power);
    fn stop(&mut self);
    fn grab(&mut self);
    fn release(&mut self);
    fn deliver(&mut self);
    fn read_colour(&mut self) -> ColourReading;
    /// Distance to the nearest obstacle in cm.
    fn read_distance(&mut self) -> u32;
}

// ── Dispatcher ───────────────────────────────────────────────────

pub struct Dispatcher<P> {
    platform: P,
    telemetry: Telemetry,
}

impl<P: Platform> Dispatcher<P> {
    pub fn new(platform: P, telemetry: Telemetry) -> Self {
        Self {
            platform,
            telemetry,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Execute one command and write its replies.
    pub async fn dispatch<S>(&mut self, command: DeviceCommand, sink: &mut S) -> Result<(), TetherError>
    where
        S: PacketSink + ?Sized,
    {
        match command {
            DeviceCommand::Unknown(code) => {
                warn!(code, "unknown command");
                return sink.send_packet(Packet::error(ResponseCode::BadCommand)).await;
            }
            DeviceCommand::Invalid { code, reason } => {
                warn!(%code, reason, "rejected command");
                return sink.send_packet(Packet::error(ResponseCode::BadCommand)).await;
            }
            _ => {}
        }

        sink.send_packet(Packet::ok()).await?;
        debug!(%command, "dispatching");

        let reply = match command {
            DeviceCommand::Move {
                motion,
                extent,
                power,
            } => {
                self.platform.drive(motion, extent, power);
                None
            }
            DeviceCommand::Stop => {
                self.platform.stop();
                None
            }
            DeviceCommand::GetStats => Some(self.telemetry.snapshot().to_packet()),
            DeviceCommand::ClearStats => {
                self.telemetry.clear();
                None
            }
            DeviceCommand::Grab => {
                self.platform.grab();
                None
            }
            DeviceCommand::Release => {
                self.platform.release();
                None
            }
            DeviceCommand::Deliver => {
                self.platform.deliver();
                None
            }
            DeviceCommand::QueryColour => Some(self.platform.read_colour().to_packet()),
            DeviceCommand::QueryDistance => Some(distance_packet(self.platform.read_distance())),
            DeviceCommand::Unknown(_) | DeviceCommand::Invalid { .. } => None,
        };

        match reply {
            Some(packet) => sink.send_packet(packet).await,
            None => Ok(()),
        }
    }

    /// Handle one frame received on an established session.
    pub async fn handle_frame<S>(&mut self, frame: Decoded, sink: &mut S) -> Result<(), TetherError>
    where
        S: PacketSink + ?Sized,
    {
        let packet = match frame {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "bad frame");
                return sink.send_packet(rejection(&e)).await;
            }
        };

        match packet.kind() {
            PacketKind::Command => self.dispatch(DeviceCommand::parse(&packet), sink).await,
            // A restarted peer may open again without tearing down.
            PacketKind::Hello => sink.send_packet(Packet::ok()).await,
            PacketKind::Response | PacketKind::Error | PacketKind::Message => {
                debug!(kind = %packet.kind(), "unexpected packet");
                sink.send_packet(Packet::error(ResponseCode::BadResponse)).await
            }
        }
    }

    /// Run the command loop until EOF or cancellation.
    ///
    /// Returns `Ok(())` when the peer closes the stream or the session is
    /// cancelled; transport failures are returned as errors.
    pub async fn serve<R, S>(
        &mut self,
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
                _ = session.cancelled() => break,
                frame = reader.recv() => frame?,
            };
            let Some(frame) = frame else {
                info!("peer closed the session");
                break;
            };
            self.handle_frame(frame, sink).await?;
        }
        session.close();
        Ok(())
    }
}
