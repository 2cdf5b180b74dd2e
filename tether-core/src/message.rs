//! Packet kinds, command codes and response codes.
//!
//! Unknown byte values convert to errors through `TryFrom`.

use crate::error::TetherError;
use std::fmt;

// ── PacketKind ───────────────────────────────────────────────────

/// Top-level packet category, carried in the first byte of a frame.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// A request for the device to act.
    Command = 0,
    /// An acknowledgment or a query result.
    Response = 1,
    /// A failure notice; `code` says which.
    Error = 2,
    /// Human-readable diagnostic text.
    Message = 3,
    /// Session opener.
    Hello = 4,
}

impl TryFrom<u8> for PacketKind {
    type Error = TetherError;

    fn try_from(value: u8) -> Result<Self, TetherError> {
        match value {
            0 => Ok(PacketKind::Command),
            1 => Ok(PacketKind::Response),
            2 => Ok(PacketKind::Error),
            3 => Ok(PacketKind::Message),
            4 => Ok(PacketKind::Hello),
            _ => Err(TetherError::UnknownVariant {
                type_name: "PacketKind",
                value: value as u64,
            }),
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketKind::Command => write!(f, "COMMAND"),
            PacketKind::Response => write!(f, "RESPONSE"),
            PacketKind::Error => write!(f, "ERROR"),
            PacketKind::Message => write!(f, "MESSAGE"),
            PacketKind::Hello => write!(f, "HELLO"),
        }
    }
}

// ── CommandCode ──────────────────────────────────────────────────

/// Every command the device understands.
///
/// Motion commands carry a distance (cm) or angle (degrees) in slot 0
/// and a power percentage in slot 1. The rest take no parameters.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    Forward = 0,
    Reverse = 1,
    TurnLeft = 2,
    TurnRight = 3,
    Stop = 4,
    GetStats = 5,
    ClearStats = 6,
    Grab = 7,
    Release = 8,
    /// Deliver the carried payload.
    Med = 9,
    Colour = 10,
    Ultrasonic = 11,
}

impl CommandCode {
    /// All defined command codes, in wire order.
    pub const ALL: [CommandCode; 12] = [
        CommandCode::Forward,
        CommandCode::Reverse,
        CommandCode::TurnLeft,
        CommandCode::TurnRight,
        CommandCode::Stop,
        CommandCode::GetStats,
        CommandCode::ClearStats,
        CommandCode::Grab,
        CommandCode::Release,
        CommandCode::Med,
        CommandCode::Colour,
        CommandCode::Ultrasonic,
    ];

    /// Returns `true` if the device answers this command with a
    /// RESPONSE carrying data, on top of the OK acknowledgment.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            CommandCode::GetStats | CommandCode::Colour | CommandCode::Ultrasonic
        )
    }
}

impl TryFrom<u8> for CommandCode {
    type Error = TetherError;

    fn try_from(value: u8) -> Result<Self, TetherError> {
        CommandCode::ALL
            .get(value as usize)
            .copied()
            .ok_or(TetherError::UnknownVariant {
                type_name: "CommandCode",
                value: value as u64,
            })
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ── ResponseCode ─────────────────────────────────────────────────

/// Subtype of RESPONSE and ERROR packets.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    Ok = 0,
    Status = 1,
    BadPacket = 2,
    BadChecksum = 3,
    BadCommand = 4,
    BadResponse = 5,
    Colour = 6,
    Ultrasonic = 7,
}

impl ResponseCode {
    /// Returns `true` for the codes that travel in ERROR packets.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ResponseCode::BadPacket
                | ResponseCode::BadChecksum
                | ResponseCode::BadCommand
                | ResponseCode::BadResponse
        )
    }
}

impl TryFrom<u8> for ResponseCode {
    type Error = TetherError;

    fn try_from(value: u8) -> Result<Self, TetherError> {
        match value {
            0 => Ok(ResponseCode::Ok),
            1 => Ok(ResponseCode::Status),
            2 => Ok(ResponseCode::BadPacket),
            3 => Ok(ResponseCode::BadChecksum),
            4 => Ok(ResponseCode::BadCommand),
            5 => Ok(ResponseCode::BadResponse),
            6 => Ok(ResponseCode::Colour),
            7 => Ok(ResponseCode::Ultrasonic),
            _ => Err(TetherError::UnknownVariant {
                type_name: "ResponseCode",
                value: value as u64,
            }),
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_kind_roundtrip() {
        for kind in [
            PacketKind::Command,
            PacketKind::Response,
            PacketKind::Error,
            PacketKind::Message,
            PacketKind::Hello,
        ] {
            assert_eq!(PacketKind::try_from(kind as u8).unwrap(), kind);
        }
    }

    #[test]
    fn packet_kind_invalid() {
        assert!(PacketKind::try_from(5).is_err());
        assert!(PacketKind::try_from(0xFF).is_err());
    }

    #[test]
    fn command_codes_match_their_position() {
        for (i, code) in CommandCode::ALL.iter().enumerate() {
            assert_eq!(*code as usize, i);
            assert_eq!(CommandCode::try_from(i as u8).unwrap(), *code);
        }
        assert!(CommandCode::try_from(12).is_err());
    }

    #[test]
    fn only_three_commands_are_queries() {
        let queries: Vec<_> = CommandCode::ALL.iter().filter(|c| c.is_query()).collect();
        assert_eq!(
            queries,
            [&CommandCode::GetStats, &CommandCode::Colour, &CommandCode::Ultrasonic]
        );
    }

    #[test]
    fn response_code_classification() {
        assert!(!ResponseCode::Ok.is_error());
        assert!(!ResponseCode::Status.is_error());
        assert!(ResponseCode::BadChecksum.is_error());
        assert!(ResponseCode::try_from(8).is_err());
    }
}
