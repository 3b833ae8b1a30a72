//! Hardware seams consumed by the drive commands.

use core::time::Duration;
use nalgebra::Vector2;
use uom::si::f64::{Angle, AngularVelocity, Velocity};

/// Left (`x`) and right (`y`) motor power, each in [-1, 1].
pub type TankPower = Vector2<f64>;

/// A two-sided drive base with wheel encoders and a gyro.
///
/// Implementations are shared by every command and outlive them; commands
/// only borrow the drive train for the duration of one tick.
pub trait DriveTrain {
    fn start_encoders(&mut self);
    fn left_encoder(&self) -> i32;
    fn right_encoder(&self) -> i32;

    /// Heading accumulated since the last [`Self::reset_angle`]. Positive is
    /// counter-clockwise.
    fn angle(&self) -> Angle;
    fn reset_angle(&mut self);

    fn tank_drive(&mut self, left: f64, right: f64);

    fn max_velocity(&self) -> Velocity;
    fn max_rotation_rate(&self) -> AngularVelocity;
    fn encoder_counts_per_meter(&self) -> f64;

    fn drive(&mut self, power: TankPower) {
        self.tank_drive(power.x, power.y);
    }
}

/// Monotonic time source. Only differences between readings matter.
pub trait Clock {
    fn now(&self) -> Duration;
}

impl<F: Fn() -> Duration> Clock for F {
    fn now(&self) -> Duration {
        self()
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use alloc::vec::Vec;
    use uom::si::angle::degree;
    use uom::si::angular_velocity::degree_per_second;
    use uom::si::velocity::meter_per_second;

    pub const COUNTS_PER_METER: f64 = 1000.0;

    #[derive(Debug, Default)]
    pub struct MockDriveTrain {
        pub left: i32,
        pub right: i32,
        pub heading_degrees: f64,
        pub encoders_started: bool,
        pub angle_resets: usize,
        pub outputs: Vec<(f64, f64)>,
    }

    impl MockDriveTrain {
        pub fn last_output(&self) -> Option<(f64, f64)> {
            self.outputs.last().copied()
        }
    }

    impl DriveTrain for MockDriveTrain {
        fn start_encoders(&mut self) {
            self.encoders_started = true;
        }

        fn left_encoder(&self) -> i32 {
            self.left
        }

        fn right_encoder(&self) -> i32 {
            self.right
        }

        fn angle(&self) -> Angle {
            Angle::new::<degree>(self.heading_degrees)
        }

        fn reset_angle(&mut self) {
            self.heading_degrees = 0.0;
            self.angle_resets += 1;
        }

        fn tank_drive(&mut self, left: f64, right: f64) {
            self.outputs.push((left, right));
        }

        fn max_velocity(&self) -> Velocity {
            Velocity::new::<meter_per_second>(1.0)
        }

        fn max_rotation_rate(&self) -> AngularVelocity {
            AngularVelocity::new::<degree_per_second>(90.0)
        }

        fn encoder_counts_per_meter(&self) -> f64 {
            COUNTS_PER_METER
        }
    }
}
