//! Profiled drive commands.
//!
//! A command is set up once ([`DriveCommand::command_init`]) and then stepped
//! every control tick ([`DriveCommand::command_update`]) until it reports that
//! it has finished. [`Command`] wraps a command and enforces that ordering.

use crate::config::{DistanceConfig, RotateConfig};
use crate::drivetrain::{Clock, DriveTrain, TankPower};
use crate::motion::Motion;
use alloc::boxed::Box;
use core::time::Duration;
use log::{debug, trace};
use num_traits::Float;
use uom::si::angle::degree;
use uom::si::angular_velocity::degree_per_second;
use uom::si::f64::{Angle, Length};
use uom::si::length::meter;
use uom::si::velocity::meter_per_second;

pub trait DriveCommand<D: DriveTrain + ?Sized> {
    /// Called exactly once, right before the first [`Self::command_update`].
    fn command_init(&mut self, drive: &mut D, now: Duration);

    /// Issues this tick's output and returns `true` once the command is done.
    fn command_update(&mut self, drive: &mut D, now: Duration) -> bool;
}

impl<D, C> DriveCommand<D> for Box<C>
where
    D: DriveTrain + ?Sized,
    C: DriveCommand<D> + ?Sized,
{
    fn command_init(&mut self, drive: &mut D, now: Duration) {
        (**self).command_init(drive, now)
    }

    fn command_update(&mut self, drive: &mut D, now: Duration) -> bool {
        (**self).command_update(drive, now)
    }
}

/// Runs a [`DriveCommand`], initializing it on the first update.
#[derive(Debug, Clone)]
pub struct Command<C> {
    command: C,
    first_update: bool,
}

impl<C> Command<C> {
    pub fn new(command: C) -> Self {
        Self {
            command,
            first_update: true,
        }
    }

    pub fn inner(&self) -> &C {
        &self.command
    }

    pub fn is_started(&self) -> bool {
        !self.first_update
    }

    /// Steps the command once. The clock is read a single time so that init
    /// and update see the same timestamp on the first tick.
    pub fn update<D, K>(&mut self, drive: &mut D, clock: &K) -> bool
    where
        D: DriveTrain + ?Sized,
        C: DriveCommand<D>,
        K: Clock + ?Sized,
    {
        let now = clock.now();
        if self.first_update {
            self.first_update = false;
            self.command.command_init(drive, now);
        }
        self.command.command_update(drive, now)
    }
}

impl<C> From<C> for Command<C> {
    fn from(command: C) -> Self {
        Self::new(command)
    }
}

/// Drives straight for a distance, profiling both sides independently.
#[derive(Debug, Clone)]
pub struct Distance {
    target: Length,
    duration: Duration,
    counts_per_meter: f64,
    left: Motion,
    right: Motion,
    finished: bool,
}

impl Distance {
    pub fn new<D: DriveTrain + ?Sized>(drive: &D, target: Length, duration: Duration) -> Self {
        Self::with_config(drive, target, Some(duration), &DistanceConfig::default())
    }

    /// Takes `target / max_velocity` plus a second of slack.
    pub fn at_max_velocity<D: DriveTrain + ?Sized>(drive: &D, target: Length) -> Self {
        Self::with_config(drive, target, None, &DistanceConfig::default())
    }

    pub fn with_config<D: DriveTrain + ?Sized>(
        drive: &D,
        target: Length,
        duration: Option<Duration>,
        config: &DistanceConfig,
    ) -> Self {
        let counts_per_meter = drive.encoder_counts_per_meter();
        let max_velocity = drive.max_velocity().get::<meter_per_second>();
        let duration = duration.unwrap_or_else(|| {
            seconds(Float::abs(target.get::<meter>()) / max_velocity + config.extra_seconds)
        });
        let full_scale_rate = max_velocity * counts_per_meter;
        let deadband = config.deadband_meters * counts_per_meter;

        Self {
            target,
            duration,
            counts_per_meter,
            left: Motion::new(config.profile, full_scale_rate, deadband),
            right: Motion::new(config.profile, full_scale_rate, deadband),
            finished: false,
        }
    }

    pub fn target(&self) -> Length {
        self.target
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl<D: DriveTrain + ?Sized> DriveCommand<D> for Distance {
    fn command_init(&mut self, drive: &mut D, now: Duration) {
        drive.start_encoders();
        let counts = self.target.get::<meter>() * self.counts_per_meter;

        self.left
            .reset(drive.left_encoder() as f64, now, counts, self.duration);
        self.right
            .reset(drive.right_encoder() as f64, now, counts, self.duration);
    }

    fn command_update(&mut self, drive: &mut D, now: Duration) -> bool {
        if self.finished {
            drive.drive(TankPower::zeros());
            return true;
        }

        let power = TankPower::new(
            self.left.adjust_velocity(drive.left_encoder() as f64, now),
            self.right.adjust_velocity(drive.right_encoder() as f64, now),
        );

        if power == TankPower::zeros() {
            self.finished = true;
            debug!("distance {} m reached", self.target.get::<meter>());
        }

        trace!(
            "distance target={} m left={} right={}",
            self.target.get::<meter>(),
            power.x,
            power.y
        );
        drive.drive(power);

        self.finished
    }
}

/// Turns in place by an angle, measured with the drive train's gyro.
#[derive(Debug, Clone)]
pub struct Rotate {
    target_degrees: f64,
    tolerance_degrees: f64,
    max_rotation_rate: f64,
    motion: Motion,
    finished: bool,
}

impl Rotate {
    pub fn new<D: DriveTrain + ?Sized>(drive: &D, target: Angle) -> Self {
        Self::with_config(drive, target, &RotateConfig::default())
    }

    pub fn with_config<D: DriveTrain + ?Sized>(
        drive: &D,
        target: Angle,
        config: &RotateConfig,
    ) -> Self {
        let max_rotation_rate = drive.max_rotation_rate().get::<degree_per_second>();

        Self {
            target_degrees: normalize_degrees(target.get::<degree>()),
            tolerance_degrees: config.tolerance_degrees,
            max_rotation_rate,
            motion: Motion::new(config.profile, max_rotation_rate, config.settle_degrees),
            finished: false,
        }
    }

    /// Target heading change in (-180, 180] degrees.
    pub fn target_degrees(&self) -> f64 {
        self.target_degrees
    }
}

impl<D: DriveTrain + ?Sized> DriveCommand<D> for Rotate {
    fn command_init(&mut self, drive: &mut D, now: Duration) {
        let duration = seconds(Float::abs(self.target_degrees) / self.max_rotation_rate);

        self.motion.reset(0.0, now, self.target_degrees, duration);
        drive.reset_angle();
    }

    fn command_update(&mut self, drive: &mut D, now: Duration) -> bool {
        if self.finished {
            drive.drive(TankPower::zeros());
            return true;
        }

        let angle = drive.angle().get::<degree>();
        let mut power = self.motion.adjust_velocity(angle, now);

        let error = self.target_degrees - angle;
        if Float::abs(error) < self.tolerance_degrees {
            power = 0.0;
            self.finished = true;
            debug!("rotate {} deg reached at {} deg", self.target_degrees, angle);
        }

        trace!(
            "rotate target={} deg angle={} power={}",
            self.target_degrees,
            angle,
            power
        );
        drive.drive(TankPower::new(-power, power));

        self.finished
    }
}

/// Wraps `degrees` into (-180, 180].
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }

    let mut degrees = degrees % 360.0;
    while degrees > 180.0 {
        degrees -= 360.0;
    }
    while degrees <= -180.0 {
        degrees += 360.0;
    }
    degrees
}

/// Negative or NaN inputs become zero; [`Motion::reset`] clamps from there.
fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}
