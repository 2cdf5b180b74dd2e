//! `tokio_util` framing for fixed-size packets.
//!
//! Integrity and kind failures are yielded as items rather than decoder
//! errors: a `Framed` stream stops after the first `Err`, and a single
//! corrupt frame must not end a session.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{FrameError, TetherError};
use crate::packet::{FRAME_SIZE, Packet};

/// One decoded frame: a packet, or the reason it was rejected.
pub type Decoded = Result<Packet, FrameError>;

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Decoded;
    type Error = TetherError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < FRAME_SIZE {
            src.reserve(FRAME_SIZE - src.len());
            return Ok(None);
        }

        // The frame is consumed whatever its verdict.
        let decoded = Packet::decode(&src[..FRAME_SIZE]);
        src.advance(FRAME_SIZE);
        Ok(Some(decoded))
    }
}

impl Encoder<Packet> for FrameCodec {
    type Error = TetherError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item.encode());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{CommandCode, ResponseCode};

    #[test]
    fn waits_for_a_full_frame() {
        let mut codec = FrameCodec;
        let frame = Packet::hello().encode();
        let mut buf = BytesMut::new();

        for byte in &frame[..FRAME_SIZE - 1] {
            buf.extend_from_slice(&[*byte]);
            assert!(codec.decode(&mut buf).unwrap().is_none());
        }
        buf.extend_from_slice(&frame[FRAME_SIZE - 1..]);
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.unwrap(), Packet::hello());
        assert!(buf.is_empty());
    }

    #[test]
    fn corrupt_frame_is_consumed_and_next_frame_decodes() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();

        let mut bad = Packet::command(CommandCode::Stop, &[]).encode();
        bad[10] ^= 0x40;
        buf.extend_from_slice(&bad);
        codec.encode(Packet::ok(), &mut buf).unwrap();

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert!(matches!(first, Err(FrameError::IntegrityMismatch { .. })));

        let second = codec.decode(&mut buf).unwrap().unwrap().unwrap();
        assert_eq!(second.response_code(), Some(ResponseCode::Ok));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn back_to_back_frames_keep_their_order() {
        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        for code in CommandCode::ALL {
            codec.encode(Packet::command(code, &[]), &mut buf).unwrap();
        }
        for code in CommandCode::ALL {
            let p = codec.decode(&mut buf).unwrap().unwrap().unwrap();
            assert_eq!(p.command_code(), Some(code));
        }
    }
}
