//! Operator-side relay.
//!
//! Two tasks share one session. The inbound task turns frames from the
//! peer into [`ConsoleEvent`]s; the outbound task turns key presses into
//! COMMAND packets. Either one ending cancels the session, which ends the
//! other at its next suspension point.

pub mod keymap;

pub use keymap::{KeyAction, KeyMap};

use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dispatch::DeviceCommand;
use crate::message::{PacketKind, ResponseCode};
use crate::network::{FrameReader, FrameWriter};
use crate::packet::Packet;
use crate::state::SessionHandle;
use crate::telemetry::{ColourReading, TelemetryRecord};

// ── Report ───────────────────────────────────────────────────────

/// A packet from the peer, classified for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Ack,
    Status(TelemetryRecord),
    Colour(ColourReading),
    /// Distance in cm.
    Distance(i32),
    Message(String),
    Failure(ResponseCode),
    Unexpected(Packet),
}

impl Report {
    pub fn classify(packet: Packet) -> Self {
        match (packet.kind(), packet.response_code()) {
            (PacketKind::Response, Some(ResponseCode::Ok)) => Report::Ack,
            (PacketKind::Response, Some(ResponseCode::Status)) => {
                Report::Status(TelemetryRecord::from_params(packet.params()))
            }
            (PacketKind::Response, Some(ResponseCode::Colour)) => {
                Report::Colour(ColourReading::from_params(packet.params()))
            }
            (PacketKind::Response, Some(ResponseCode::Ultrasonic)) => {
                Report::Distance(packet.param(0))
            }
            (PacketKind::Error, Some(code)) => Report::Failure(code),
            (PacketKind::Message, _) => Report::Message(packet.text()),
            _ => Report::Unexpected(packet),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Ack => write!(f, "Command / Status OK"),
            Report::Status(record) => write!(f, "{record}"),
            Report::Colour(reading) => write!(f, "{reading}"),
            Report::Distance(cm) => write!(f, "Ultrasonic distance: {cm}cm"),
            Report::Message(text) => write!(f, "MESSAGE FROM DEVICE: {text}"),
            Report::Failure(ResponseCode::BadPacket) => write!(f, "BAD PACKET FROM DEVICE"),
            Report::Failure(ResponseCode::BadChecksum) => write!(f, "BAD CHECKSUM FROM DEVICE"),
            Report::Failure(ResponseCode::BadCommand) => write!(f, "DEVICE REJECTED THE COMMAND"),
            Report::Failure(ResponseCode::BadResponse) => write!(f, "BAD RESPONSE FROM DEVICE"),
            Report::Failure(code) => write!(f, "DEVICE ERROR {code:?}"),
            Report::Unexpected(packet) => write!(f, "UNEXPECTED PACKET {packet:?}"),
        }
    }
}

// ── ConsoleEvent ─────────────────────────────────────────────────

/// Everything the relay tells the operator's display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Report(Report),
    Sent(DeviceCommand),
    BadKey(char),
    /// Both relay tasks have ended.
    Closed,
}

// ── Relay ────────────────────────────────────────────────────────

/// How long a closing writer may spend flushing to a stalled peer.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, Default)]
pub struct Relay {
    keymap: KeyMap,
}

impl Relay {
    pub fn new(keymap: KeyMap) -> Self {
        Self { keymap }
    }

    /// Relay until either side ends the session.
    ///
    /// Returns after both tasks have stopped and dropped their halves.
    /// [`ConsoleEvent::Closed`] is the last event sent.
    pub async fn run<R, W>(
        &self,
        reader: FrameReader<R>,
        writer: FrameWriter<W>,
        keys: mpsc::Receiver<char>,
        events: mpsc::UnboundedSender<ConsoleEvent>,
        session: SessionHandle,
    ) where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let inbound = tokio::spawn(inbound(reader, events.clone(), session.clone()));
        let outbound = tokio::spawn(outbound(
            writer,
            keys,
            self.keymap,
            events.clone(),
            session.clone(),
        ));

        let (a, b) = tokio::join!(inbound, outbound);
        for result in [a, b] {
            if let Err(e) = result {
                error!(error = %e, "relay task failed");
            }
        }

        session.close();
        session.finish();
        let _ = events.send(ConsoleEvent::Closed);
        info!("relay stopped");
    }
}

async fn inbound<R>(
    mut reader: FrameReader<R>,
    events: mpsc::UnboundedSender<ConsoleEvent>,
    session: SessionHandle,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = session.cancelled() => break,
            frame = reader.recv() => frame,
        };

        match frame {
            Ok(Some(Ok(packet))) => {
                let report = Report::classify(packet);
                if events.send(ConsoleEvent::Report(report)).is_err() {
                    break;
                }
            }
            Ok(Some(Err(e))) => warn!(error = %e, "corrupt frame skipped"),
            Ok(None) => {
                info!("peer closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, "read failed");
                break;
            }
        }
    }
    session.close();
    debug!("inbound relay stopped");
}

async fn outbound<W>(
    mut writer: FrameWriter<W>,
    mut keys: mpsc::Receiver<char>,
    keymap: KeyMap,
    events: mpsc::UnboundedSender<ConsoleEvent>,
    session: SessionHandle,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let key = tokio::select! {
            _ = session.cancelled() => break,
            key = keys.recv() => key,
        };
        let Some(key) = key else {
            debug!("key source closed");
            break;
        };

        match keymap.translate(key) {
            Some(KeyAction::Quit) => {
                info!("quit requested");
                break;
            }
            Some(KeyAction::Send(command)) => {
                if !session.is_active() {
                    break;
                }
                let Some(packet) = command.to_packet() else {
                    if events.send(ConsoleEvent::BadKey(key)).is_err() {
                        break;
                    }
                    continue;
                };
                let sent = tokio::select! {
                    _ = session.cancelled() => break,
                    sent = writer.send(packet) => sent,
                };
                if let Err(e) = sent {
                    warn!(error = %e, "send failed");
                    break;
                }
                if events.send(ConsoleEvent::Sent(command)).is_err() {
                    break;
                }
            }
            None => {
                if events.send(ConsoleEvent::BadKey(key)).is_err() {
                    break;
                }
            }
        }
    }
    session.close();
    if tokio::time::timeout(CLOSE_GRACE, writer.close()).await.is_err() {
        debug!("writer close timed out");
    }
    debug!("outbound relay stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::split;
    use crate::telemetry::ColourClass;
    use tokio::io::AsyncWriteExt;

    fn active_session() -> SessionHandle {
        let session = SessionHandle::new();
        session.begin_handshake().unwrap();
        session.complete_handshake().unwrap();
        session
    }

    #[test]
    fn classify_responses() {
        assert_eq!(Report::classify(Packet::ok()), Report::Ack);
        assert_eq!(
            Report::classify(Packet::error(ResponseCode::BadChecksum)),
            Report::Failure(ResponseCode::BadChecksum)
        );
        assert_eq!(
            Report::classify(Packet::message("low battery")),
            Report::Message("low battery".into())
        );
        assert!(matches!(Report::classify(Packet::hello()), Report::Unexpected(_)));

        let colour = ColourReading {
            red: 1,
            green: 2,
            blue: 3,
            class: ColourClass::White,
        };
        assert_eq!(Report::classify(colour.to_packet()), Report::Colour(colour));
    }

    #[test]
    fn report_text() {
        assert_eq!(Report::Ack.to_string(), "Command / Status OK");
        assert_eq!(Report::Distance(12).to_string(), "Ultrasonic distance: 12cm");
        assert!(Report::Status(TelemetryRecord::default())
            .to_string()
            .contains("Forward Distance:"));
    }

    #[tokio::test]
    async fn stalled_peer_cannot_block_teardown() {
        // Smaller than one frame, and the peer never reads.
        let (near, far) = tokio::io::duplex(64);
        let (reader, writer) = split(near);
        let (_far_rx, mut far_tx) = tokio::io::split(far);

        let (key_tx, key_rx) = mpsc::channel(4);
        let (event_tx, _events) = mpsc::unbounded_channel();
        let session = active_session();
        let relay = tokio::spawn({
            let session = session.clone();
            async move {
                Relay::default()
                    .run(reader, writer, key_rx, event_tx, session)
                    .await
            }
        });

        key_tx.send('f').await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        far_tx.shutdown().await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), relay)
            .await
            .expect("relay should stop once the peer hangs up")
            .unwrap();
        assert!(session.is_cancelled());
    }

    #[tokio::test]
    async fn closed_display_ends_the_session() {
        let (near, _far) = tokio::io::duplex(4096);
        let (reader, writer) = split(near);
        let (key_tx, key_rx) = mpsc::channel(4);
        let (event_tx, events) = mpsc::unbounded_channel();
        drop(events);
        let session = active_session();

        key_tx.send('z').await.unwrap();
        tokio::time::timeout(
            Duration::from_secs(2),
            Relay::default().run(reader, writer, key_rx, event_tx, session.clone()),
        )
        .await
        .expect("relay should stop without a display");
        assert!(session.is_cancelled());
    }
}
