//! A platform that moves nothing but keeps honest counters.
//!
//! Motion is converted into encoder ticks and travelled distance right
//! away, so STATUS reports are observable without hardware.

use tracing::{debug, info};

use tether_core::{
    ColourClass, ColourReading, DirectionClass, Extent, Motion, Platform, Power, Telemetry,
    Travel, Wheel,
};

use crate::config::PlatformConfig;

pub struct SimulatedPlatform {
    config: PlatformConfig,
    telemetry: Telemetry,
    holding: bool,
    deliveries: u32,
}

impl SimulatedPlatform {
    pub fn new(config: PlatformConfig, telemetry: Telemetry) -> Self {
        Self {
            config,
            telemetry,
            holding: false,
            deliveries: 0,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.holding
    }

    pub fn deliveries(&self) -> u32 {
        self.deliveries
    }

    fn classify(rgb: [i32; 3]) -> ColourClass {
        let [r, g, b] = rgb;
        if r > g && r > b {
            ColourClass::Red
        } else if g > r && g > b {
            ColourClass::Green
        } else {
            ColourClass::White
        }
    }
}

impl Platform for SimulatedPlatform {
    fn drive(&mut self, motion: Motion, extent: Extent, power: Power) {
        let amount = match extent {
            Extent::Bounded(n) => n,
            Extent::Unbounded => self.config.unbounded_cm,
        };
        debug!(?motion, amount, power = power.percent(), "drive");

        // Turning left spins the left wheel backwards and the right one forwards.
        let (left, right, ticks) = match motion {
            Motion::Forward => (
                DirectionClass::Forward,
                DirectionClass::Forward,
                amount.saturating_mul(self.config.ticks_per_cm),
            ),
            Motion::Reverse => (
                DirectionClass::Reverse,
                DirectionClass::Reverse,
                amount.saturating_mul(self.config.ticks_per_cm),
            ),
            Motion::TurnLeft => (
                DirectionClass::ReverseTurn,
                DirectionClass::ForwardTurn,
                amount.saturating_mul(self.config.ticks_per_degree),
            ),
            Motion::TurnRight => (
                DirectionClass::ForwardTurn,
                DirectionClass::ReverseTurn,
                amount.saturating_mul(self.config.ticks_per_degree),
            ),
        };
        self.telemetry.record_ticks(Wheel::Left, left, ticks);
        self.telemetry.record_ticks(Wheel::Right, right, ticks);

        match motion {
            Motion::Forward => self.telemetry.add_distance(Travel::Forward, amount),
            Motion::Reverse => self.telemetry.add_distance(Travel::Reverse, amount),
            Motion::TurnLeft | Motion::TurnRight => {}
        }
    }

    fn stop(&mut self) {
        debug!("stop");
    }

    fn grab(&mut self) {
        self.holding = true;
        debug!("gripper closed");
    }

    fn release(&mut self) {
        self.holding = false;
        debug!("gripper opened");
    }

    fn deliver(&mut self) {
        self.deliveries = self.deliveries.saturating_add(1);
        info!(deliveries = self.deliveries, "payload delivered");
    }

    fn read_colour(&mut self) -> ColourReading {
        let [red, green, blue] = self.config.colour_rgb;
        ColourReading {
            red,
            green,
            blue,
            class: Self::classify(self.config.colour_rgb),
        }
    }

    fn read_distance(&mut self) -> u32 {
        self.config.obstacle_cm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform() -> (SimulatedPlatform, Telemetry) {
        let telemetry = Telemetry::new();
        (
            SimulatedPlatform::new(PlatformConfig::default(), telemetry.clone()),
            telemetry,
        )
    }

    #[test]
    fn forward_counts_ticks_and_distance() {
        let (mut p, t) = platform();
        p.drive(Motion::Forward, Extent::Bounded(5), Power::MAX);

        let s = t.snapshot();
        assert_eq!(s.ticks(Wheel::Left, DirectionClass::Forward), 20);
        assert_eq!(s.ticks(Wheel::Right, DirectionClass::Forward), 20);
        assert_eq!(s.forward_distance, 5);
        assert_eq!(s.reverse_distance, 0);
    }

    #[test]
    fn left_turn_splits_wheel_directions() {
        let (mut p, t) = platform();
        p.drive(Motion::TurnLeft, Extent::Bounded(90), Power::MAX);

        let s = t.snapshot();
        assert_eq!(s.ticks(Wheel::Left, DirectionClass::ReverseTurn), 90);
        assert_eq!(s.ticks(Wheel::Right, DirectionClass::ForwardTurn), 90);
        assert_eq!(s.forward_distance, 0);
    }

    #[test]
    fn unbounded_uses_the_nominal_distance() {
        let (mut p, t) = platform();
        p.drive(Motion::Reverse, Extent::Unbounded, Power::MAX);
        assert_eq!(t.snapshot().reverse_distance, 10);
    }

    #[test]
    fn gripper_and_delivery() {
        let (mut p, _) = platform();
        p.grab();
        assert!(p.is_holding());
        p.release();
        p.deliver();
        assert!(!p.is_holding());
        assert_eq!(p.deliveries(), 1);
    }

    #[test]
    fn delivery_count_saturates() {
        let (mut p, _) = platform();
        p.deliveries = u32::MAX;
        p.deliver();
        assert_eq!(p.deliveries(), u32::MAX);
    }

    #[test]
    fn default_colour_is_green() {
        let (mut p, _) = platform();
        assert_eq!(p.read_colour().class, ColourClass::Green);
        assert_eq!(SimulatedPlatform::classify([255, 255, 255]), ColourClass::White);
    }
}
