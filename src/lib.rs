//! Profiled drive commands and timed state sequencing for autonomous robot
//! routines.

#![no_std]

extern crate alloc;

pub mod autonomous;
pub mod config;
pub mod drive_commands;
pub mod drivetrain;
pub mod motion;
pub mod motion_profile;
pub mod timer;
pub mod trapezoid;

pub use autonomous::{
    AutonomousManager, AutonomousModes, AutonomousProgram, ModeChooser, ModeError, NextState,
    Robot, StateId, END_STATE,
};
pub use config::{ConfigError, DistanceConfig, DriveConfig, ProfileConfig, RotateConfig};
pub use drive_commands::{Command, Distance, DriveCommand, Rotate};
pub use drivetrain::{Clock, DriveTrain, TankPower};
pub use motion::Motion;
