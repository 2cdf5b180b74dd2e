//! Framed transport over any byte stream.
//!
//! A serial link, a TCP socket or a TLS stream all look the same once
//! wrapped here: [`FrameReader::recv`] yields whole frames and
//! [`FrameWriter::send`] writes one. [`split`] hands out independent
//! read and write halves so two tasks can use one connection without
//! locking around each call.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::codec::{Decoded, FrameCodec};
use crate::error::TetherError;
use crate::packet::Packet;

/// Reading half of a framed transport.
pub struct FrameReader<R> {
    inner: FramedRead<R, FrameCodec>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: FramedRead::new(reader, FrameCodec),
        }
    }

    /// Wait for the next frame.
    ///
    /// `Ok(None)` means the peer closed the stream. Cancel-safe: a frame
    /// is never half-consumed when the future is dropped.
    pub async fn recv(&mut self) -> Result<Option<Decoded>, TetherError> {
        self.inner.next().await.transpose()
    }
}

/// Writing half of a framed transport.
pub struct FrameWriter<W> {
    inner: FramedWrite<W, FrameCodec>,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: FramedWrite::new(writer, FrameCodec),
        }
    }

    /// Write one frame and flush it.
    pub async fn send(&mut self, packet: Packet) -> Result<(), TetherError> {
        self.inner.send(packet).await
    }

    /// Flush and shut down the write side.
    pub async fn close(&mut self) -> Result<(), TetherError> {
        SinkExt::<Packet>::close(&mut self.inner).await
    }
}

/// Split a duplex byte stream into framed halves.
pub fn split<S>(stream: S) -> (FrameReader<ReadHalf<S>>, FrameWriter<WriteHalf<S>>)
where
    S: AsyncRead + AsyncWrite,
{
    let (r, w) = tokio::io::split(stream);
    (FrameReader::new(r), FrameWriter::new(w))
}

// ── PacketSink ───────────────────────────────────────────────────

/// Anything that outgoing packets can be pushed into.
///
/// The dispatcher and the handshake write through this so they work
/// the same over a real transport and over an in-memory channel.
#[async_trait]
pub trait PacketSink: Send {
    async fn send_packet(&mut self, packet: Packet) -> Result<(), TetherError>;
}

#[async_trait]
impl<W> PacketSink for FrameWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_packet(&mut self, packet: Packet) -> Result<(), TetherError> {
        self.send(packet).await
    }
}

#[async_trait]
impl PacketSink for mpsc::UnboundedSender<Packet> {
    async fn send_packet(&mut self, packet: Packet) -> Result<(), TetherError> {
        self.send(packet)?;
        Ok(())
    }
}
