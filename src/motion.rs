//! Closed-loop follower for a single axis.
//!
//! [`Motion`] plays a [`Trapezoid`] against the measured position of the axis
//! and turns the result into a normalized power. The power is never exactly
//! zero while the move is running, so a `0.0` return is the completion signal.

use crate::config::ProfileConfig;
use crate::motion_profile::{MotionProfile, ProfilePoint};
use crate::trapezoid::Trapezoid;
use core::time::Duration;
use log::warn;
use num_traits::Float;

/// Shortest duration a profile is allowed to have.
pub const MIN_DURATION: Duration = Duration::from_millis(1);

/// Smallest static power term; zero power is reserved for completion.
pub const MIN_STATIC_POWER: f64 = 0.01;

/// Slowest full-scale rate, in axis units per second.
pub const MIN_FULL_SCALE_RATE: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct Motion {
    config: ProfileConfig,
    full_scale_rate: f64,
    deadband: f64,
    start_position: f64,
    start_time: Duration,
    target_displacement: f64,
    profile: Option<Trapezoid>,
}

impl Motion {
    /// `full_scale_rate` is the axis speed, in axis units per second, that a
    /// power of `1.0` produces. `deadband` is in axis units.
    ///
    /// Values that would break the completion signal or produce non-finite
    /// power are clamped with a warning.
    pub fn new(mut config: ProfileConfig, full_scale_rate: f64, deadband: f64) -> Self {
        if !(config.static_power >= MIN_STATIC_POWER && config.static_power < 1.0) {
            let clamped = if config.static_power < 1.0 {
                MIN_STATIC_POWER
            } else {
                ProfileConfig::default().static_power
            };
            warn!(
                "static power {} out of range, using {}",
                config.static_power, clamped
            );
            config.static_power = clamped;
        }
        if !(config.ramp_fraction > 0.0 && config.ramp_fraction < 0.5) {
            let fallback = ProfileConfig::default().ramp_fraction;
            warn!(
                "ramp fraction {} out of range, using {}",
                config.ramp_fraction, fallback
            );
            config.ramp_fraction = fallback;
        }
        if !(config.position_gain >= 0.0 && config.position_gain.is_finite()) {
            warn!("position gain {} invalid, using 0", config.position_gain);
            config.position_gain = 0.0;
        }
        let full_scale_rate = if full_scale_rate >= MIN_FULL_SCALE_RATE && full_scale_rate.is_finite()
        {
            full_scale_rate
        } else {
            warn!(
                "full scale rate {} invalid, clamping to {}",
                full_scale_rate, MIN_FULL_SCALE_RATE
            );
            MIN_FULL_SCALE_RATE
        };
        let deadband = if deadband.is_finite() {
            Float::abs(deadband)
        } else {
            0.0
        };

        Self {
            config,
            full_scale_rate,
            deadband,
            start_position: 0.0,
            start_time: Duration::ZERO,
            target_displacement: 0.0,
            profile: None,
        }
    }

    pub fn reset(
        &mut self,
        start_position: f64,
        start_time: Duration,
        target_displacement: f64,
        duration: Duration,
    ) {
        let duration = if duration < MIN_DURATION {
            warn!(
                "profile duration {:?} too short, clamping to {:?}",
                duration, MIN_DURATION
            );
            MIN_DURATION
        } else {
            duration
        };

        self.start_position = start_position;
        self.start_time = start_time;
        self.target_displacement = target_displacement;
        self.profile = Some(Trapezoid::new(
            target_displacement,
            duration,
            self.config.ramp_fraction,
        ));
    }

    pub fn target_displacement(&self) -> f64 {
        self.target_displacement
    }

    pub fn profile(&self) -> Option<&Trapezoid> {
        self.profile.as_ref()
    }

    /// Power in [-1, 1] for the axis at `current_position` and `current_time`.
    ///
    /// Returns exactly `0.0` before the first [`Self::reset`], for a zero
    /// target, and once the profile has run out with the axis inside the
    /// deadband.
    pub fn adjust_velocity(&self, current_position: f64, current_time: Duration) -> f64 {
        let Some(profile) = &self.profile else {
            return 0.0;
        };
        if self.target_displacement == 0.0 {
            return 0.0;
        }

        let t = current_time.saturating_sub(self.start_time);
        let travelled = current_position - self.start_position;

        if t >= profile.get_duration()
            && Float::abs(self.target_displacement - travelled) <= self.deadband
        {
            return 0.0;
        }

        let point = profile.get(t).unwrap_or(ProfilePoint {
            position: self.target_displacement,
            velocity: 0.0,
        });
        let correction = self.config.position_gain * (point.position - travelled);
        let power = (point.velocity + correction) / self.full_scale_rate;
        // a NaN sensor reading only gets the static push toward the target
        let power = if power.is_finite() { power } else { 0.0 };

        let direction = if power != 0.0 {
            Float::signum(power)
        } else {
            Float::signum(self.target_displacement)
        };

        (power + self.config.static_power * direction).clamp(-1.0, 1.0)
    }
}
