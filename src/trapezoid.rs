use crate::motion_profile::{MotionProfile, ProfilePoint};
use core::time::Duration;
use interp::interp;

/// Trapezoidal velocity curve covering `displacement` in exactly `duration`.
///
/// The first and last `ramp_fraction` of the duration are linear ramps
/// between zero and the plateau velocity. The plateau velocity is chosen so
/// that the area under the curve equals the displacement.
#[derive(Debug, Copy, Clone)]
pub struct Trapezoid {
    displacement: f64,
    duration: Duration,
    ramp_time: f64,
    peak_velocity: f64,
    knots: ([f64; 4], [f64; 4]),
}

impl Trapezoid {
    /// `ramp_fraction` must lie in (0, 0.5) and `duration` must be nonzero.
    pub fn new(displacement: f64, duration: Duration, ramp_fraction: f64) -> Self {
        let total = duration.as_secs_f64();
        let ramp_time = total * ramp_fraction;
        let peak_velocity = displacement / (total - ramp_time);

        Self {
            displacement,
            duration,
            ramp_time,
            peak_velocity,
            knots: (
                [0.0, ramp_time, total - ramp_time, total],
                [0.0, peak_velocity, peak_velocity, 0.0],
            ),
        }
    }

    pub fn displacement(&self) -> f64 {
        self.displacement
    }

    pub fn peak_velocity(&self) -> f64 {
        self.peak_velocity
    }

    pub fn velocity_at(&self, t: f64) -> f64 {
        if t <= 0.0 || t >= self.knots.0[3] {
            0.0
        } else {
            interp(&self.knots.0, &self.knots.1, t)
        }
    }

    /// Integral of [`Self::velocity_at`] from zero to `t`.
    pub fn position_at(&self, t: f64) -> f64 {
        let total = self.knots.0[3];
        let ramp = self.ramp_time;
        let peak = self.peak_velocity;

        if t <= 0.0 {
            0.0
        } else if t < ramp {
            0.5 * peak * t * t / ramp
        } else if t < total - ramp {
            0.5 * peak * ramp + peak * (t - ramp)
        } else if t < total {
            let left = total - t;
            self.displacement - 0.5 * peak * left * left / ramp
        } else {
            self.displacement
        }
    }
}

impl MotionProfile for Trapezoid {
    fn get_duration(&self) -> Duration {
        self.duration
    }

    fn get(&self, t: Duration) -> Option<ProfilePoint> {
        if t > self.duration {
            None
        } else {
            let t = t.as_secs_f64();
            Some(ProfilePoint {
                position: self.position_at(t),
                velocity: self.velocity_at(t),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_trapezoid_area_matches_displacement() {
        let profile = Trapezoid::new(2000.0, Duration::from_secs(4), 0.06);

        // plateau * (T - ramp) == displacement
        assert_relative_eq!(profile.peak_velocity() * (4.0 - 0.24), 2000.0);
        assert_relative_eq!(profile.position_at(4.0), 2000.0);

        let steps = 4000;
        let dt = 4.0 / steps as f64;
        let integral: f64 = (0..steps)
            .map(|i| profile.velocity_at((i as f64 + 0.5) * dt) * dt)
            .sum();
        assert_relative_eq!(integral, 2000.0, max_relative = 1e-4);
    }

    #[test]
    fn test_trapezoid_shape() {
        let profile = Trapezoid::new(10.0, Duration::from_secs(10), 0.1);
        let peak = profile.peak_velocity();

        assert_eq!(profile.velocity_at(0.0), 0.0);
        assert_relative_eq!(profile.velocity_at(0.5), peak * 0.5);
        assert_relative_eq!(profile.velocity_at(1.0), peak);
        assert_relative_eq!(profile.velocity_at(5.0), peak);
        assert_relative_eq!(profile.velocity_at(9.5), peak * 0.5);
        assert_eq!(profile.velocity_at(10.0), 0.0);
        assert_eq!(profile.velocity_at(12.0), 0.0);
    }

    #[test]
    fn test_trapezoid_position_is_continuous() {
        let profile = Trapezoid::new(3.0, Duration::from_millis(2500), 0.06);
        let ramp = 2.5 * 0.06;
        let eps = 1e-9;

        for knot in [ramp, 2.5 - ramp] {
            assert_relative_eq!(
                profile.position_at(knot - eps),
                profile.position_at(knot + eps),
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn test_trapezoid_negative_mirrors() {
        let forward = Trapezoid::new(5.0, Duration::from_secs(3), 0.06);
        let backward = Trapezoid::new(-5.0, Duration::from_secs(3), 0.06);

        for i in 0..=30 {
            let t = Duration::from_millis(i * 100);
            let a = forward.get(t).unwrap();
            let b = backward.get(t).unwrap();
            assert_relative_eq!(a.position, -b.position);
            assert_relative_eq!(a.velocity, -b.velocity);
        }
    }

    #[test]
    fn test_trapezoid_get_past_end() {
        let profile = Trapezoid::new(1.0, Duration::from_secs(1), 0.06);

        assert_eq!(profile.get_duration(), Duration::from_secs(1));
        assert!(profile.get(Duration::from_secs(1)).is_some());
        assert!(profile.get(Duration::from_millis(1001)).is_none());
    }
}
