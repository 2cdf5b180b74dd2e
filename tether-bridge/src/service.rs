//! Bridge service core logic.
//!
//! The controller link is opened once. Operators are served strictly
//! one after another; while one is connected, further connections wait
//! in the listener backlog.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tether_core::handshake::{self, rejection};
use tether_core::{
    FrameReader, FrameWriter, Packet, PacketKind, ResponseCode, SerialLink, SessionHandle,
    TetherError, split,
};

use crate::config::BridgeConfig;

/// How long closing an operator connection may spend flushing.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

// ── BridgeService ────────────────────────────────────────────────

pub struct BridgeService {
    config: BridgeConfig,
    shutdown: CancellationToken,
}

impl BridgeService {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the service when cancelled.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Open both sides and relay until shutdown or serial failure.
    pub async fn run(&self) -> Result<(), TetherError> {
        let controller = SerialLink::open(&self.config.serial).await?;
        let listener = TcpListener::bind(self.config.listen_addr()).await?;
        info!("bridge listening on {}", self.config.listen_addr());
        self.run_with(controller, listener).await
    }

    /// Relay between an already-open controller stream and operators
    /// arriving on `listener`.
    pub async fn run_with<C>(&self, controller: C, listener: TcpListener) -> Result<(), TetherError>
    where
        C: AsyncRead + AsyncWrite + Send,
    {
        let (mut ctl_rx, mut ctl_tx) = split(controller);
        let link = SessionHandle::with_parent(&self.shutdown);
        handshake::initiate(&mut ctl_rx, &mut ctl_tx, &self.config.handshake, &link).await?;
        info!("controller link established");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accept = listener.accept() => match accept {
                    Ok((stream, peer)) => {
                        info!("operator connected from {peer}");
                        self.operator_session(stream, &mut ctl_rx, &mut ctl_tx).await?;
                        info!("operator {peer} disconnected");
                    }
                    Err(e) => warn!("accept error: {e}"),
                },
                frame = ctl_rx.recv() => match frame? {
                    None => return Err(TetherError::ConnectionClosed),
                    Some(frame) => debug!(?frame, "no operator; dropping controller frame"),
                },
            }
        }

        link.close();
        link.finish();
        info!("bridge service stopped");
        Ok(())
    }

    /// Serve one operator. Only controller-side failures are returned.
    async fn operator_session<R, W>(
        &self,
        stream: TcpStream,
        ctl_rx: &mut FrameReader<R>,
        ctl_tx: &mut FrameWriter<W>,
    ) -> Result<(), TetherError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("set_nodelay failed: {e}");
        }
        let (mut op_rx, mut op_tx) = split(stream);
        let session = SessionHandle::with_parent(&self.shutdown);

        if let Err(e) =
            handshake::accept(&mut op_rx, &mut op_tx, &self.config.handshake, &session).await
        {
            warn!("operator handshake failed: {e}");
            session.close();
            session.finish();
            return Ok(());
        }

        let result = loop {
            tokio::select! {
                _ = session.cancelled() => break Ok(()),

                frame = op_rx.recv() => {
                    let reply = match frame {
                        Ok(Some(Ok(packet))) => match packet.kind() {
                            PacketKind::Command => {
                                let sent = tokio::select! {
                                    _ = session.cancelled() => break Ok(()),
                                    sent = ctl_tx.send(packet) => sent,
                                };
                                if let Err(e) = sent {
                                    break Err(e);
                                }
                                None
                            }
                            PacketKind::Hello => Some(Packet::ok()),
                            _ => Some(Packet::error(ResponseCode::BadResponse)),
                        },
                        Ok(Some(Err(e))) => {
                            debug!(error = %e, "bad frame from operator");
                            Some(rejection(&e))
                        }
                        Ok(None) => break Ok(()),
                        Err(e) => {
                            warn!("operator read failed: {e}");
                            break Ok(());
                        }
                    };
                    if let Some(reply) = reply {
                        let sent = tokio::select! {
                            _ = session.cancelled() => break Ok(()),
                            sent = op_tx.send(reply) => sent,
                        };
                        if let Err(e) = sent {
                            warn!("operator write failed: {e}");
                            break Ok(());
                        }
                    }
                }

                frame = ctl_rx.recv() => {
                    let packet = match frame {
                        Ok(Some(Ok(packet))) => packet,
                        Ok(Some(Err(e))) => {
                            warn!(error = %e, "bad frame from controller");
                            Packet::error(ResponseCode::BadResponse)
                        }
                        Ok(None) => break Err(TetherError::ConnectionClosed),
                        Err(e) => break Err(e),
                    };
                    let sent = tokio::select! {
                        _ = session.cancelled() => break Ok(()),
                        sent = op_tx.send(packet) => sent,
                    };
                    if let Err(e) = sent {
                        warn!("operator write failed: {e}");
                        break Ok(());
                    }
                }
            }
        };

        session.close();
        if tokio::time::timeout(CLOSE_GRACE, op_tx.close()).await.is_err() {
            debug!("operator close timed out");
        }
        session.finish();
        result
    }
}

// ── Tests ────────────────────────────────────────────────────────
