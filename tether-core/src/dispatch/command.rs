//! Typed view of COMMAND packets.

use std::fmt;

use crate::message::CommandCode;
use crate::packet::Packet;

/// How far a motion runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Distance in cm, or angle in degrees for turns.
    Bounded(u32),
    /// Keep going until a STOP.
    Unbounded,
}

impl Extent {
    fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(Extent::Unbounded),
            v => u32::try_from(v).ok().map(Extent::Bounded),
        }
    }

    fn to_wire(self) -> i32 {
        match self {
            Extent::Unbounded => 0,
            Extent::Bounded(v) => i32::try_from(v).unwrap_or(i32::MAX),
        }
    }
}

/// Motor power as a percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Power(u8);

impl Power {
    pub const MAX: Power = Power(100);

    pub fn new(percent: i32) -> Option<Self> {
        u8::try_from(percent).ok().filter(|p| *p <= 100).map(Power)
    }

    pub fn percent(&self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motion {
    Forward,
    Reverse,
    TurnLeft,
    TurnRight,
}

impl Motion {
    pub fn is_turn(&self) -> bool {
        matches!(self, Motion::TurnLeft | Motion::TurnRight)
    }

    fn code(&self) -> CommandCode {
        match self {
            Motion::Forward => CommandCode::Forward,
            Motion::Reverse => CommandCode::Reverse,
            Motion::TurnLeft => CommandCode::TurnLeft,
            Motion::TurnRight => CommandCode::TurnRight,
        }
    }
}

/// Every outcome of parsing a command code and its parameters.
///
/// Unknown codes and rejected parameters are variants rather than errors,
/// so a dispatcher matching on this enum handles every byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Move {
        motion: Motion,
        extent: Extent,
        power: Power,
    },
    Stop,
    GetStats,
    ClearStats,
    Grab,
    Release,
    /// Drop the carried payload.
    Deliver,
    QueryColour,
    QueryDistance,
    /// The code is not a defined command.
    Unknown(u8),
    /// A defined command whose parameters are out of range.
    Invalid {
        code: CommandCode,
        reason: &'static str,
    },
}

impl DeviceCommand {
    pub fn parse(packet: &Packet) -> Self {
        Self::from_wire(packet.code(), packet.param(0), packet.param(1))
    }

    /// Build from the code byte and the first two parameter slots.
    pub fn from_wire(code: u8, target: i32, power: i32) -> Self {
        let Ok(code) = CommandCode::try_from(code) else {
            return DeviceCommand::Unknown(code);
        };

        let motion = match code {
            CommandCode::Forward => Motion::Forward,
            CommandCode::Reverse => Motion::Reverse,
            CommandCode::TurnLeft => Motion::TurnLeft,
            CommandCode::TurnRight => Motion::TurnRight,
            CommandCode::Stop => return DeviceCommand::Stop,
            CommandCode::GetStats => return DeviceCommand::GetStats,
            CommandCode::ClearStats => return DeviceCommand::ClearStats,
            CommandCode::Grab => return DeviceCommand::Grab,
            CommandCode::Release => return DeviceCommand::Release,
            CommandCode::Med => return DeviceCommand::Deliver,
            CommandCode::Colour => return DeviceCommand::QueryColour,
            CommandCode::Ultrasonic => return DeviceCommand::QueryDistance,
        };

        let Some(extent) = Extent::from_wire(target) else {
            return DeviceCommand::Invalid {
                code,
                reason: "negative distance or angle",
            };
        };
        let Some(power) = Power::new(power) else {
            return DeviceCommand::Invalid {
                code,
                reason: "power outside 0..=100",
            };
        };
        DeviceCommand::Move {
            motion,
            extent,
            power,
        }
    }

    /// The wire code, if this is a well-formed command.
    pub fn code(&self) -> Option<CommandCode> {
        match self {
            DeviceCommand::Move { motion, .. } => Some(motion.code()),
            DeviceCommand::Stop => Some(CommandCode::Stop),
            DeviceCommand::GetStats => Some(CommandCode::GetStats),
            DeviceCommand::ClearStats => Some(CommandCode::ClearStats),
            DeviceCommand::Grab => Some(CommandCode::Grab),
            DeviceCommand::Release => Some(CommandCode::Release),
            DeviceCommand::Deliver => Some(CommandCode::Med),
            DeviceCommand::QueryColour => Some(CommandCode::Colour),
            DeviceCommand::QueryDistance => Some(CommandCode::Ultrasonic),
            DeviceCommand::Unknown(_) | DeviceCommand::Invalid { .. } => None,
        }
    }

    /// Encode as a COMMAND packet. `None` for unknown or invalid commands.
    pub fn to_packet(&self) -> Option<Packet> {
        let code = self.code()?;
        let packet = match self {
            DeviceCommand::Move { extent, power, .. } => {
                Packet::command(code, &[extent.to_wire(), i32::from(power.percent())])
            }
            _ => Packet::command(code, &[]),
        };
        Some(packet)
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCommand::Move {
                motion,
                extent: Extent::Bounded(n),
                power,
            } => write!(f, "{motion:?} {n} at {}%", power.percent()),
            DeviceCommand::Move {
                motion,
                extent: Extent::Unbounded,
                power,
            } => write!(f, "{motion:?} until stopped at {}%", power.percent()),
            DeviceCommand::Unknown(code) => write!(f, "unknown command {code}"),
            DeviceCommand::Invalid { code, reason } => write!(f, "invalid {code}: {reason}"),
            other => write!(f, "{other:?}"),
        }
    }
}
