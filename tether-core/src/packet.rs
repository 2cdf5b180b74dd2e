//! The fixed-size packet and its wire encoding.
//!
//! ```text
//! offset  size  field
//!      0     1  kind
//!      1     1  code
//!      2    64  params   (16 × i32, little-endian)
//!     66    32  text     (nul-padded, MESSAGE only)
//!     98     4  check    (u32 LE, first 4 bytes of BLAKE3 over 0..98)
//! ```

use std::fmt;

use crate::error::FrameError;
use crate::message::{CommandCode, PacketKind, ResponseCode};

// ── Constants ────────────────────────────────────────────────────

/// Number of signed parameter slots in every packet.
pub const PARAM_COUNT: usize = 16;

/// Capacity of the MESSAGE text field in bytes.
pub const TEXT_LEN: usize = 32;

const PARAMS_OFFSET: usize = 2;
const TEXT_OFFSET: usize = PARAMS_OFFSET + PARAM_COUNT * 4;
const CHECK_OFFSET: usize = TEXT_OFFSET + TEXT_LEN;

/// Total size of one frame on the wire.
pub const FRAME_SIZE: usize = CHECK_OFFSET + 4;

pub type FrameBytes = [u8; FRAME_SIZE];

/// Integrity check over the bytes that precede the check field.
pub fn checksum(body: &[u8]) -> u32 {
    let hash = blake3::hash(body);
    let b = hash.as_bytes();
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

// ── Packet ───────────────────────────────────────────────────────

/// One protocol message. Every constructor fills every field.
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    kind: PacketKind,
    code: u8,
    params: [i32; PARAM_COUNT],
    text: [u8; TEXT_LEN],
}

impl Packet {
    pub fn new(kind: PacketKind, code: u8, params: [i32; PARAM_COUNT]) -> Self {
        Self {
            kind,
            code,
            params,
            text: [0; TEXT_LEN],
        }
    }

    pub fn hello() -> Self {
        Self::new(PacketKind::Hello, 0, [0; PARAM_COUNT])
    }

    /// A COMMAND packet. Missing trailing parameters are zero.
    pub fn command(code: CommandCode, args: &[i32]) -> Self {
        let mut params = [0; PARAM_COUNT];
        for (slot, arg) in params.iter_mut().zip(args) {
            *slot = *arg;
        }
        Self::new(PacketKind::Command, code as u8, params)
    }

    /// A RESPONSE packet carrying query results.
    pub fn response(code: ResponseCode, params: [i32; PARAM_COUNT]) -> Self {
        Self::new(PacketKind::Response, code as u8, params)
    }

    /// The plain acknowledgment sent for every accepted command.
    pub fn ok() -> Self {
        Self::response(ResponseCode::Ok, [0; PARAM_COUNT])
    }

    pub fn error(code: ResponseCode) -> Self {
        Self::new(PacketKind::Error, code as u8, [0; PARAM_COUNT])
    }

    /// A MESSAGE packet. Text longer than [`TEXT_LEN`] is truncated.
    pub fn message(text: &str) -> Self {
        let mut packet = Self::new(PacketKind::Message, 0, [0; PARAM_COUNT]);
        let bytes = text.as_bytes();
        let n = bytes.len().min(TEXT_LEN);
        packet.text[..n].copy_from_slice(&bytes[..n]);
        packet
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn params(&self) -> &[i32; PARAM_COUNT] {
        &self.params
    }

    pub fn param(&self, slot: usize) -> i32 {
        self.params.get(slot).copied().unwrap_or(0)
    }

    pub fn text_bytes(&self) -> &[u8; TEXT_LEN] {
        &self.text
    }

    /// The MESSAGE text up to the first nul, lossily decoded.
    pub fn text(&self) -> String {
        let end = self.text.iter().position(|b| *b == 0).unwrap_or(TEXT_LEN);
        String::from_utf8_lossy(&self.text[..end]).into_owned()
    }

    /// Typed command code, for COMMAND packets with a defined code.
    pub fn command_code(&self) -> Option<CommandCode> {
        match self.kind {
            PacketKind::Command => CommandCode::try_from(self.code).ok(),
            _ => None,
        }
    }

    /// Typed response code, for RESPONSE and ERROR packets.
    pub fn response_code(&self) -> Option<ResponseCode> {
        match self.kind {
            PacketKind::Response | PacketKind::Error => ResponseCode::try_from(self.code).ok(),
            _ => None,
        }
    }

    /// Returns `true` for RESPONSE(OK).
    pub fn is_ok(&self) -> bool {
        self.kind == PacketKind::Response && self.code == ResponseCode::Ok as u8
    }

    // ── Wire format ──────────────────────────────────────────────

    pub fn encode(&self) -> FrameBytes {
        let mut frame: FrameBytes = [0; FRAME_SIZE];
        frame[0] = self.kind as u8;
        frame[1] = self.code;
        for (i, value) in self.params.iter().enumerate() {
            let at = PARAMS_OFFSET + i * 4;
            frame[at..at + 4].copy_from_slice(&value.to_le_bytes());
        }
        frame[TEXT_OFFSET..CHECK_OFFSET].copy_from_slice(&self.text);
        let check = checksum(&frame[..CHECK_OFFSET]);
        frame[CHECK_OFFSET..].copy_from_slice(&check.to_le_bytes());
        frame
    }

    /// Decode the first [`FRAME_SIZE`] bytes of `bytes`.
    ///
    /// The check is verified before the kind byte is interpreted, so a
    /// corrupted kind reports `IntegrityMismatch`, never `UnknownKind`.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < FRAME_SIZE {
            return Err(FrameError::Incomplete {
                available: bytes.len(),
                needed: FRAME_SIZE,
            });
        }
        let frame = &bytes[..FRAME_SIZE];

        let mut check = [0u8; 4];
        check.copy_from_slice(&frame[CHECK_OFFSET..]);
        let actual = u32::from_le_bytes(check);
        let expected = checksum(&frame[..CHECK_OFFSET]);
        if actual != expected {
            return Err(FrameError::IntegrityMismatch { expected, actual });
        }

        let kind = PacketKind::try_from(frame[0]).map_err(|_| FrameError::UnknownKind(frame[0]))?;

        let mut params = [0i32; PARAM_COUNT];
        for (i, slot) in params.iter_mut().enumerate() {
            let at = PARAMS_OFFSET + i * 4;
            let mut word = [0u8; 4];
            word.copy_from_slice(&frame[at..at + 4]);
            *slot = i32::from_le_bytes(word);
        }

        let mut text = [0u8; TEXT_LEN];
        text.copy_from_slice(&frame[TEXT_OFFSET..CHECK_OFFSET]);

        Ok(Self {
            kind,
            code: frame[1],
            params,
            text,
        })
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Packet");
        s.field("kind", &self.kind).field("code", &self.code);
        match self.kind {
            PacketKind::Message => s.field("text", &self.text()),
            _ => s.field("params", &self.params),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_is_fixed() {
        assert_eq!(FRAME_SIZE, 102);
        assert_eq!(Packet::hello().encode().len(), FRAME_SIZE);
        assert_eq!(Packet::message("hi").encode().len(), FRAME_SIZE);
    }

    #[test]
    fn roundtrip_preserves_every_field() {
        let mut params = [0; PARAM_COUNT];
        for (i, p) in params.iter_mut().enumerate() {
            *p = (i as i32 - 8) * 1_000_003;
        }
        let packets = [
            Packet::hello(),
            Packet::command(CommandCode::Forward, &[50, 75]),
            Packet::response(ResponseCode::Status, params),
            Packet::error(ResponseCode::BadChecksum),
            Packet::message("battery low"),
            Packet::new(PacketKind::Command, 200, [i32::MIN; PARAM_COUNT]),
        ];
        for p in packets {
            assert_eq!(Packet::decode(&p.encode()).unwrap(), p);
        }
    }

    #[test]
    fn params_are_little_endian() {
        let frame = Packet::command(CommandCode::TurnLeft, &[0x0102_0304]).encode();
        assert_eq!(&frame[2..6], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn every_strict_prefix_is_incomplete() {
        let frame = Packet::command(CommandCode::Reverse, &[10, 20]).encode();
        for len in 0..FRAME_SIZE {
            assert_eq!(
                Packet::decode(&frame[..len]),
                Err(FrameError::Incomplete {
                    available: len,
                    needed: FRAME_SIZE
                })
            );
        }
    }

    #[test]
    fn every_single_bit_flip_is_an_integrity_error() {
        let frame = Packet::command(CommandCode::Forward, &[50, 75]).encode();
        for byte in 0..CHECK_OFFSET {
            for bit in 0..8 {
                let mut corrupt = frame;
                corrupt[byte] ^= 1 << bit;
                assert!(
                    matches!(
                        Packet::decode(&corrupt),
                        Err(FrameError::IntegrityMismatch { .. })
                    ),
                    "flip at byte {byte} bit {bit} went undetected"
                );
            }
        }
    }

    #[test]
    fn unknown_kind_with_valid_check() {
        let mut frame = Packet::hello().encode();
        frame[0] = 9;
        let check = checksum(&frame[..CHECK_OFFSET]);
        frame[CHECK_OFFSET..].copy_from_slice(&check.to_le_bytes());
        assert_eq!(Packet::decode(&frame), Err(FrameError::UnknownKind(9)));
    }

    #[test]
    fn message_text_is_truncated_and_nul_padded() {
        let long = "x".repeat(TEXT_LEN + 10);
        let p = Packet::message(&long);
        assert_eq!(p.text().len(), TEXT_LEN);

        let p = Packet::message("ok");
        assert_eq!(p.text(), "ok");
        assert!(p.text_bytes()[2..].iter().all(|b| *b == 0));
    }

    #[test]
    fn typed_code_views() {
        let cmd = Packet::command(CommandCode::Grab, &[]);
        assert_eq!(cmd.command_code(), Some(CommandCode::Grab));
        assert_eq!(cmd.response_code(), None);

        assert_eq!(Packet::ok().response_code(), Some(ResponseCode::Ok));
        assert!(Packet::ok().is_ok());
        assert!(!Packet::error(ResponseCode::Ok).is_ok());
        assert_eq!(
            Packet::error(ResponseCode::BadCommand).response_code(),
            Some(ResponseCode::BadCommand)
        );
    }
}
