//! Device counters and their packing into RESPONSE parameters.
//!
//! The slot order below is part of the wire contract:
//!
//! ```text
//! slot  value
//!    0  left  forward ticks
//!    1  right forward ticks
//!    2  left  reverse ticks
//!    3  right reverse ticks
//!    4  left  forward-turn ticks
//!    5  right forward-turn ticks
//!    6  left  reverse-turn ticks
//!    7  right reverse-turn ticks
//!    8  forward distance (cm)
//!    9  reverse distance (cm)
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::message::ResponseCode;
use crate::packet::{PARAM_COUNT, Packet};

// ── Wheel / DirectionClass ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Wheel {
    Left,
    Right,
}

/// Which way a wheel was turning, and whether the platform was turning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionClass {
    Forward,
    Reverse,
    ForwardTurn,
    ReverseTurn,
}

/// Straight-line travel direction for distance accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Travel {
    Forward,
    Reverse,
}

// ── TelemetryRecord ──────────────────────────────────────────────

/// A frozen copy of the device counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryRecord {
    /// Indexed by `[wheel][class]`.
    ticks: [[u32; 4]; 2],
    pub forward_distance: u32,
    pub reverse_distance: u32,
}

impl TelemetryRecord {
    fn wheel_index(wheel: Wheel) -> usize {
        match wheel {
            Wheel::Left => 0,
            Wheel::Right => 1,
        }
    }

    fn class_index(class: DirectionClass) -> usize {
        match class {
            DirectionClass::Forward => 0,
            DirectionClass::Reverse => 1,
            DirectionClass::ForwardTurn => 2,
            DirectionClass::ReverseTurn => 3,
        }
    }

    pub fn ticks(&self, wheel: Wheel, class: DirectionClass) -> u32 {
        self.ticks[Self::wheel_index(wheel)][Self::class_index(class)]
    }

    pub fn set_ticks(&mut self, wheel: Wheel, class: DirectionClass, value: u32) {
        self.ticks[Self::wheel_index(wheel)][Self::class_index(class)] = value;
    }

    /// Pack into the sixteen parameter slots. Values above `i32::MAX`
    /// saturate.
    pub fn to_params(&self) -> [i32; PARAM_COUNT] {
        let wide = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);
        let mut params = [0; PARAM_COUNT];
        for class in 0..4 {
            for wheel in 0..2 {
                params[class * 2 + wheel] = wide(self.ticks[wheel][class]);
            }
        }
        params[8] = wide(self.forward_distance);
        params[9] = wide(self.reverse_distance);
        params
    }

    /// Inverse of [`to_params`](Self::to_params). Negative slots read as zero.
    pub fn from_params(params: &[i32; PARAM_COUNT]) -> Self {
        let narrow = |v: i32| u32::try_from(v).unwrap_or(0);
        let mut record = Self::default();
        for class in 0..4 {
            for wheel in 0..2 {
                record.ticks[wheel][class] = narrow(params[class * 2 + wheel]);
            }
        }
        record.forward_distance = narrow(params[8]);
        record.reverse_distance = narrow(params[9]);
        record
    }

    /// RESPONSE(STATUS) carrying this snapshot.
    pub fn to_packet(&self) -> Packet {
        Packet::response(ResponseCode::Status, self.to_params())
    }
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use DirectionClass::*;
        use Wheel::*;
        writeln!(f, "------- STATUS REPORT -------")?;
        writeln!(f, "Left Forward Ticks:\t\t{}", self.ticks(Left, Forward))?;
        writeln!(f, "Right Forward Ticks:\t\t{}", self.ticks(Right, Forward))?;
        writeln!(f, "Left Reverse Ticks:\t\t{}", self.ticks(Left, Reverse))?;
        writeln!(f, "Right Reverse Ticks:\t\t{}", self.ticks(Right, Reverse))?;
        writeln!(f, "Left Forward Ticks Turns:\t{}", self.ticks(Left, ForwardTurn))?;
        writeln!(f, "Right Forward Ticks Turns:\t{}", self.ticks(Right, ForwardTurn))?;
        writeln!(f, "Left Reverse Ticks Turns:\t{}", self.ticks(Left, ReverseTurn))?;
        writeln!(f, "Right Reverse Ticks Turns:\t{}", self.ticks(Right, ReverseTurn))?;
        writeln!(f, "Forward Distance:\t\t{}", self.forward_distance)?;
        write!(f, "Reverse Distance:\t\t{}", self.reverse_distance)
    }
}

// ── Telemetry ────────────────────────────────────────────────────

/// Live counters owned by the device process.
///
/// The tick source mutates through [`record_tick`](Self::record_tick)
/// and [`add_distance`](Self::add_distance); readers only ever see a
/// consistent [`snapshot`](Self::snapshot).
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    inner: Arc<Mutex<TelemetryRecord>>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TelemetryRecord> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_tick(&self, wheel: Wheel, class: DirectionClass) {
        self.record_ticks(wheel, class, 1);
    }

    pub fn record_ticks(&self, wheel: Wheel, class: DirectionClass, n: u32) {
        let mut record = self.lock();
        let current = record.ticks(wheel, class);
        record.set_ticks(wheel, class, current.saturating_add(n));
    }

    pub fn add_distance(&self, travel: Travel, cm: u32) {
        let mut record = self.lock();
        match travel {
            Travel::Forward => record.forward_distance = record.forward_distance.saturating_add(cm),
            Travel::Reverse => record.reverse_distance = record.reverse_distance.saturating_add(cm),
        }
    }

    pub fn clear(&self) {
        *self.lock() = TelemetryRecord::default();
    }

    pub fn snapshot(&self) -> TelemetryRecord {
        *self.lock()
    }
}

// ── ColourReading ────────────────────────────────────────────────

/// Colour classes reported in slot 3 of RESP_COLOUR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourClass {
    Red,
    Green,
    White,
}

impl ColourClass {
    pub fn index(&self) -> i32 {
        match self {
            ColourClass::Red => 0,
            ColourClass::Green => 1,
            ColourClass::White => 2,
        }
    }

    pub fn from_index(index: i32) -> Self {
        match index {
            0 => ColourClass::Red,
            1 => ColourClass::Green,
            _ => ColourClass::White,
        }
    }
}

impl fmt::Display for ColourClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColourClass::Red => write!(f, "red"),
            ColourClass::Green => write!(f, "green"),
            ColourClass::White => write!(f, "white"),
        }
    }
}

/// One colour-sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColourReading {
    pub red: i32,
    pub green: i32,
    pub blue: i32,
    pub class: ColourClass,
}

impl ColourReading {
    pub fn to_packet(&self) -> Packet {
        let mut params = [0; PARAM_COUNT];
        params[..4].copy_from_slice(&[self.red, self.green, self.blue, self.class.index()]);
        Packet::response(ResponseCode::Colour, params)
    }

    pub fn from_params(params: &[i32; PARAM_COUNT]) -> Self {
        Self {
            red: params[0],
            green: params[1],
            blue: params[2],
            class: ColourClass::from_index(params[3]),
        }
    }
}

impl fmt::Display for ColourReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Colour detected: R={} G={} B={} (colour is {})",
            self.red, self.green, self.blue, self.class
        )
    }
}

/// RESP_ULTRASONIC carrying a distance in cm.
pub fn distance_packet(cm: u32) -> Packet {
    let mut params = [0; PARAM_COUNT];
    params[0] = i32::try_from(cm).unwrap_or(i32::MAX);
    Packet::response(ResponseCode::Ultrasonic, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_order_is_the_wire_contract() {
        let t = Telemetry::new();
        t.record_ticks(Wheel::Left, DirectionClass::Forward, 1);
        t.record_ticks(Wheel::Right, DirectionClass::Forward, 2);
        t.record_ticks(Wheel::Left, DirectionClass::Reverse, 3);
        t.record_ticks(Wheel::Right, DirectionClass::Reverse, 4);
        t.record_ticks(Wheel::Left, DirectionClass::ForwardTurn, 5);
        t.record_ticks(Wheel::Right, DirectionClass::ForwardTurn, 6);
        t.record_ticks(Wheel::Left, DirectionClass::ReverseTurn, 7);
        t.record_ticks(Wheel::Right, DirectionClass::ReverseTurn, 8);
        t.add_distance(Travel::Forward, 9);
        t.add_distance(Travel::Reverse, 10);

        let params = t.snapshot().to_params();
        assert_eq!(&params[..10], &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert!(params[10..].iter().all(|p| *p == 0));
    }

    #[test]
    fn params_unpack_to_the_same_record() {
        let t = Telemetry::new();
        t.record_ticks(Wheel::Right, DirectionClass::ReverseTurn, 42);
        t.add_distance(Travel::Forward, 120);
        let record = t.snapshot();
        assert_eq!(TelemetryRecord::from_params(&record.to_params()), record);
    }

    #[test]
    fn large_counters_saturate_on_the_wire() {
        let mut record = TelemetryRecord::default();
        record.forward_distance = u32::MAX;
        assert_eq!(record.to_params()[8], i32::MAX);
    }

    #[test]
    fn clear_resets_everything() {
        let t = Telemetry::new();
        t.record_tick(Wheel::Left, DirectionClass::Forward);
        t.add_distance(Travel::Reverse, 3);
        t.clear();
        assert_eq!(t.snapshot(), TelemetryRecord::default());
    }

    #[test]
    fn snapshot_is_frozen() {
        let t = Telemetry::new();
        let before = t.snapshot();
        t.record_tick(Wheel::Left, DirectionClass::Forward);
        assert_eq!(before.ticks(Wheel::Left, DirectionClass::Forward), 0);
        assert_eq!(t.snapshot().ticks(Wheel::Left, DirectionClass::Forward), 1);
    }

    #[test]
    fn colour_index_mapping() {
        let reading = ColourReading {
            red: 200,
            green: 40,
            blue: 30,
            class: ColourClass::Red,
        };
        let p = reading.to_packet();
        assert_eq!(&p.params()[..4], &[200, 40, 30, 0]);
        assert_eq!(ColourReading::from_params(p.params()), reading);
        assert_eq!(ColourClass::from_index(7), ColourClass::White);
    }

    #[test]
    fn distance_in_slot_zero() {
        let p = distance_packet(17);
        assert_eq!(p.response_code(), Some(ResponseCode::Ultrasonic));
        assert_eq!(p.param(0), 17);
    }
}
