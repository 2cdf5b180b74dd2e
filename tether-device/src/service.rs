//! Device service core logic.
//!
//! Accepts one session at a time, runs the accepting handshake and then
//! the command loop against the platform. A session ending for any
//! reason leads straight back to waiting for the next HELLO.

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tether_core::{
    Dispatcher, FrameReader, FrameWriter, SerialLink, SessionHandle, Telemetry, TetherError,
    handshake, split,
};

use crate::config::{DeviceConfig, LinkMode};
use crate::platform::SimulatedPlatform;

// ── DeviceService ────────────────────────────────────────────────

pub struct DeviceService {
    config: DeviceConfig,
    telemetry: Telemetry,
    shutdown: CancellationToken,
}

impl DeviceService {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            telemetry: Telemetry::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the service when cancelled.
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn dispatcher(&self) -> Dispatcher<SimulatedPlatform> {
        let platform = SimulatedPlatform::new(self.config.platform.clone(), self.telemetry.clone());
        Dispatcher::new(platform, self.telemetry.clone())
    }

    /// Run the service until the shutdown token is cancelled.
    pub async fn run(&self) -> Result<(), TetherError> {
        match self.config.link.mode {
            LinkMode::Serial => {
                let stream = SerialLink::open(&self.config.serial).await?;
                self.run_stream(stream).await
            }
            LinkMode::Tcp => {
                let addr: SocketAddr = format!(
                    "{}:{}",
                    self.config.link.bind_addr, self.config.link.listen_port
                )
                .parse()
                .map_err(|e| TetherError::Config(format!("bad listen address: {e}")))?;
                let listener = TcpListener::bind(addr).await?;
                info!("device listening on {addr}");
                self.run_listener(listener).await
            }
        }
    }

    /// Serve consecutive sessions over one long-lived stream.
    pub async fn run_stream<S>(&self, stream: S) -> Result<(), TetherError>
    where
        S: AsyncRead + AsyncWrite + Send,
    {
        let (mut reader, mut writer) = split(stream);
        let mut dispatcher = self.dispatcher();

        while !self.shutdown.is_cancelled() {
            match self.session(&mut reader, &mut writer, &mut dispatcher).await {
                Ok(()) => {}
                // The link itself is gone; nothing more will arrive on it.
                Err(TetherError::ConnectionClosed) | Err(TetherError::Connection(_)) => {
                    warn!("link closed");
                    break;
                }
                Err(e) => warn!("session ended: {e}"),
            }
        }
        info!("device service stopped");
        Ok(())
    }

    /// Accept TCP peers one at a time until shut down.
    pub async fn run_listener(&self, listener: TcpListener) -> Result<(), TetherError> {
        let mut dispatcher = self.dispatcher();

        loop {
            let accept = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = listener.accept() => result,
            };
            let (stream, peer) = match accept {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("accept error: {e}");
                    continue;
                }
            };
            info!("peer connected from {peer}");
            if let Err(e) = stream.set_nodelay(true) {
                warn!("set_nodelay failed for {peer}: {e}");
            }

            let (mut reader, mut writer) = split(stream);
            match self.session(&mut reader, &mut writer, &mut dispatcher).await {
                Ok(()) => info!("session with {peer} ended"),
                Err(e) => warn!("session with {peer} ended: {e}"),
            }
        }

        info!("device service stopped");
        Ok(())
    }

    /// One session: handshake, then commands until EOF or shutdown.
    async fn session<R, W>(
        &self,
        reader: &mut FrameReader<R>,
        writer: &mut FrameWriter<W>,
        dispatcher: &mut Dispatcher<SimulatedPlatform>,
    ) -> Result<(), TetherError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send,
    {
        let session = SessionHandle::with_parent(&self.shutdown);
        let result = async {
            handshake::accept(reader, writer, &self.config.handshake, &session).await?;
            dispatcher.serve(reader, writer, &session).await
        }
        .await;
        session.close();
        session.finish();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tether_core::{CommandCode, Packet, ResponseCode};

    fn service() -> DeviceService {
        let mut config = DeviceConfig::default();
        config.handshake.accept_timeout_ms = 1_000;
        DeviceService::new(config)
    }

    #[tokio::test]
    async fn serves_sessions_back_to_back_on_one_stream() {
        let svc = service();
        let shutdown = svc.shutdown_handle();
        let (peer, local) = tokio::io::duplex(4096);
        let (mut rx, mut tx) = split(peer);

        let client = async {
            tx.send(Packet::hello()).await.unwrap();
            assert!(rx.recv().await.unwrap().unwrap().unwrap().is_ok());

            tx.send(Packet::command(CommandCode::Forward, &[5, 50])).await.unwrap();
            assert!(rx.recv().await.unwrap().unwrap().unwrap().is_ok());

            // A second HELLO on the same link is acknowledged again.
            tx.send(Packet::hello()).await.unwrap();
            assert!(rx.recv().await.unwrap().unwrap().unwrap().is_ok());

            tx.send(Packet::command(CommandCode::GetStats, &[])).await.unwrap();
            assert!(rx.recv().await.unwrap().unwrap().unwrap().is_ok());
            let status = rx.recv().await.unwrap().unwrap().unwrap();
            assert_eq!(status.response_code(), Some(ResponseCode::Status));
            assert_eq!(status.param(8), 5);

            shutdown.cancel();
        };

        let (result, ()) = tokio::time::timeout(
            Duration::from_secs(5),
            async { tokio::join!(svc.run_stream(local), client) },
        )
        .await
        .unwrap();
        result.unwrap();
        assert_eq!(svc.telemetry().snapshot().forward_distance, 5);
    }

    #[tokio::test]
    async fn listener_outlives_a_disconnecting_peer() {
        let svc = service();
        let shutdown = svc.shutdown_handle();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = async {
            for _ in 0..2 {
                let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
                let (mut rx, mut tx) = split(stream);
                tx.send(Packet::hello()).await.unwrap();
                assert!(rx.recv().await.unwrap().unwrap().unwrap().is_ok());
            }
            shutdown.cancel();
        };

        let (result, ()) = tokio::time::timeout(
            Duration::from_secs(5),
            async { tokio::join!(svc.run_listener(listener), client) },
        )
        .await
        .unwrap();
        result.unwrap();
    }
}
