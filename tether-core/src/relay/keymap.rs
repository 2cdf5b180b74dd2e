//! Single-key operator bindings.

use crate::config::MotionDefaults;
use crate::dispatch::DeviceCommand;
use crate::error::TetherError;
use crate::message::CommandCode;

/// What one key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Send(DeviceCommand),
    Quit,
}

/// Key bindings with the motion parameters baked in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyMap {
    defaults: MotionDefaults,
}

impl KeyMap {
    pub fn new(defaults: MotionDefaults) -> Result<Self, TetherError> {
        defaults.validate()?;
        Ok(Self { defaults })
    }

    pub fn defaults(&self) -> &MotionDefaults {
        &self.defaults
    }

    /// `None` for keys with no binding. Letters match in either case.
    pub fn translate(&self, key: char) -> Option<KeyAction> {
        let d = &self.defaults;
        let (code, target, power) = match key.to_ascii_lowercase() {
            'f' => (CommandCode::Forward, d.distance_cm, d.drive_power),
            'b' => (CommandCode::Reverse, d.distance_cm, d.drive_power),
            'l' => (CommandCode::TurnLeft, d.angle_deg, d.turn_power),
            'r' => (CommandCode::TurnRight, d.angle_deg, d.turn_power),
            's' => (CommandCode::Stop, 0, 0),
            'c' => (CommandCode::ClearStats, 0, 0),
            'g' => (CommandCode::GetStats, 0, 0),
            'p' => (CommandCode::Grab, 0, 0),
            'o' => (CommandCode::Release, 0, 0),
            't' => (CommandCode::Med, 0, 0),
            'h' => (CommandCode::Colour, 0, 0),
            'v' => (CommandCode::Ultrasonic, 0, 0),
            'q' => return Some(KeyAction::Quit),
            _ => return None,
        };
        Some(KeyAction::Send(DeviceCommand::from_wire(code as u8, target, power)))
    }

    /// One-line help for the console prompt.
    pub fn help() -> &'static str {
        "f=forward b=reverse l=left r=right s=stop c=clear stats g=get stats \
         p=grab o=release t=deliver h=colour v=distance q=quit"
    }
}
