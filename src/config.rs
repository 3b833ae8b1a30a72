//! Tunable constants for the profiled drive commands.
//!
//! Everything has a working default; with the `serde_support` feature a
//! partial JSON document can override individual fields.

use crate::motion::MIN_STATIC_POWER;
use alloc::string::String;
#[cfg(feature = "serde_support")]
use alloc::string::ToString;
#[cfg(feature = "serde_support")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Parse(String),
    #[error("ramp fraction {0} is outside (0, 0.5)")]
    RampFraction(f64),
    #[error("static power {0} is outside [0.01, 1)")]
    StaticPower(f64),
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
}

#[cfg(feature = "serde_support")]
impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

/// Shape and gains of a single profiled axis.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_support", serde(default))]
pub struct ProfileConfig {
    /// Fraction of the move spent accelerating, and again decelerating.
    pub ramp_fraction: f64,
    /// Velocity correction per unit of position error, in 1/s.
    pub position_gain: f64,
    /// Power added in the direction of travel while the move is running.
    pub static_power: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            ramp_fraction: 0.06,
            position_gain: 2.0,
            static_power: 0.05,
        }
    }
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ramp_fraction > 0.0 && self.ramp_fraction < 0.5) {
            return Err(ConfigError::RampFraction(self.ramp_fraction));
        }
        non_negative("position_gain", self.position_gain)?;
        if !(self.static_power >= MIN_STATIC_POWER && self.static_power < 1.0) {
            return Err(ConfigError::StaticPower(self.static_power));
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_support", serde(default))]
pub struct DistanceConfig {
    pub profile: ProfileConfig,
    /// How close to the target both sides must be once the profile has run out.
    pub deadband_meters: f64,
    /// Slack added to `target / max_velocity` when no duration is given.
    pub extra_seconds: f64,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            profile: ProfileConfig::default(),
            deadband_meters: 0.01,
            extra_seconds: 1.0,
        }
    }
}

impl DistanceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.profile.validate()?;
        positive("deadband_meters", self.deadband_meters)?;
        non_negative("extra_seconds", self.extra_seconds)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_support", serde(default))]
pub struct RotateConfig {
    pub profile: ProfileConfig,
    /// Deadband of the underlying profile once it has run out.
    pub settle_degrees: f64,
    /// The turn is finished while `|target - angle|` stays below this.
    pub tolerance_degrees: f64,
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            profile: ProfileConfig::default(),
            settle_degrees: 1.0,
            tolerance_degrees: 3.0,
        }
    }
}

impl RotateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.profile.validate()?;
        positive("settle_degrees", self.settle_degrees)?;
        positive("tolerance_degrees", self.tolerance_degrees)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde_support", serde(default))]
pub struct DriveConfig {
    pub distance: DistanceConfig,
    pub rotate: RotateConfig,
}

impl DriveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.distance.validate()?;
        self.rotate.validate()
    }

    /// Parses and validates a JSON document. Missing fields keep their defaults.
    #[cfg(feature = "serde_support")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}
