//! Autonomous state sequencing.
//!
//! An autonomous routine is a table of numbered states. The integrator
//! supplies a state function that, given the state to enter, starts that
//! state's commands on the robot and returns where to go afterwards along
//! with two guards: how long the state must last at least, and how long it
//! may last at most. [`AutonomousManager::run`] is called every control tick
//! and moves on when the robot reports its commands finished and the minimum
//! dwell has passed, or unconditionally once the timeout has passed.

use crate::drivetrain::Clock;
use crate::timer::GuardTimer;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::time::Duration;
use log::info;
#[cfg(feature = "serde_support")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type StateId = i32;

/// Terminal state. Once entered, [`AutonomousManager::run`] only ticks the robot.
pub const END_STATE: StateId = -1;

/// Timeout used by [`NextState::after`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where to go once the current state is done, and when that may happen.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct NextState {
    next_state: StateId,
    min_dwell: Duration,
    timeout: Duration,
}

impl NextState {
    pub const fn new(next_state: StateId, min_dwell: Duration, timeout: Duration) -> Self {
        Self {
            next_state,
            min_dwell,
            timeout,
        }
    }

    /// Moves to `next_state` no sooner than `min_dwell`, with the default timeout.
    pub const fn after(next_state: StateId, min_dwell: Duration) -> Self {
        Self::new(next_state, min_dwell, DEFAULT_TIMEOUT)
    }

    pub const fn end() -> Self {
        Self::after(END_STATE, Duration::ZERO)
    }

    pub fn next_state_id(&self) -> StateId {
        self.next_state
    }

    pub fn min_dwell(&self) -> Duration {
        self.min_dwell
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_end(&self) -> bool {
        self.next_state == END_STATE
    }
}

pub trait Robot {
    /// Steps every active command; `true` when all of them have finished.
    fn update_subsystems(&mut self) -> bool;
}

pub type StateFunction<R> = Rc<dyn Fn(&mut R, StateId) -> NextState>;

/// A selectable autonomous routine: its state function and where it starts.
pub struct AutonomousProgram<R> {
    function: StateFunction<R>,
    initial_state: StateId,
}

impl<R> AutonomousProgram<R> {
    pub fn new<F>(function: F, initial_state: StateId) -> Self
    where
        F: Fn(&mut R, StateId) -> NextState + 'static,
    {
        Self {
            function: Rc::new(function),
            initial_state,
        }
    }

    pub fn function(&self) -> &StateFunction<R> {
        &self.function
    }

    pub fn initial_state(&self) -> StateId {
        self.initial_state
    }
}

impl<R> Clone for AutonomousProgram<R> {
    fn clone(&self) -> Self {
        Self {
            function: Rc::clone(&self.function),
            initial_state: self.initial_state,
        }
    }
}

impl<R> fmt::Debug for AutonomousProgram<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutonomousProgram")
            .field("initial_state", &self.initial_state)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("no autonomous mode named {0:?}")]
    UnknownMode(String),
    #[error("no autonomous modes registered")]
    NoModes,
}

/// Receives the registered mode names, e.g. a dashboard chooser.
pub trait ModeChooser {
    fn add_default(&mut self, name: &str);
    fn add_option(&mut self, name: &str);
}

/// Registered autonomous programs in registration order. The first one is
/// the default.
pub struct AutonomousModes<R> {
    programs: Vec<(String, AutonomousProgram<R>)>,
}

impl<R> AutonomousModes<R> {
    pub fn new() -> Self {
        Self {
            programs: Vec::new(),
        }
    }

    /// Registering an existing name replaces its program and keeps its position.
    pub fn add(&mut self, name: impl Into<String>, program: AutonomousProgram<R>) {
        let name = name.into();
        match self.programs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = program,
            None => self.programs.push((name, program)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AutonomousProgram<R>> {
        self.programs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, program)| program)
    }

    pub fn default_mode(&self) -> Option<(&str, &AutonomousProgram<R>)> {
        self.programs
            .first()
            .map(|(name, program)| (name.as_str(), program))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.programs.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn publish<C: ModeChooser + ?Sized>(&self, chooser: &mut C) {
        let mut names = self.names();
        if let Some(first) = names.next() {
            chooser.add_default(first);
        }
        for name in names {
            chooser.add_option(name);
        }
    }

    /// `{"default": <first name or null>, "modes": [<names in order>]}`
    #[cfg(feature = "serde_support")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct ModeList<'a> {
            default: Option<&'a str>,
            modes: Vec<&'a str>,
        }

        serde_json::to_string(&ModeList {
            default: self.names().next(),
            modes: self.names().collect(),
        })
    }
}

impl<R> Default for AutonomousModes<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for AutonomousModes<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

pub struct AutonomousManager<R> {
    function: StateFunction<R>,
    current_state: StateId,
    min_dwell: Duration,
    timeout: Duration,
    min_timer: GuardTimer,
    max_timer: GuardTimer,
    modes: AutonomousModes<R>,
}

impl<R> AutonomousManager<R> {
    pub fn new<F>(function: F, initial_state: StateId) -> Self
    where
        F: Fn(&mut R, StateId) -> NextState + 'static,
    {
        Self::from_program(AutonomousProgram::new(function, initial_state))
    }

    pub fn from_program(program: AutonomousProgram<R>) -> Self {
        Self {
            function: program.function,
            current_state: program.initial_state,
            min_dwell: Duration::ZERO,
            timeout: Duration::ZERO,
            min_timer: GuardTimer::new(),
            max_timer: GuardTimer::new(),
            modes: AutonomousModes::new(),
        }
    }

    /// Replaces the active program. The start state is entered on the next
    /// [`Self::run`].
    pub fn set_start_state<F>(&mut self, function: F, initial_state: StateId)
    where
        F: Fn(&mut R, StateId) -> NextState + 'static,
    {
        self.activate(&AutonomousProgram::new(function, initial_state));
    }

    fn activate(&mut self, program: &AutonomousProgram<R>) {
        self.function = Rc::clone(&program.function);
        self.current_state = program.initial_state;
        self.min_dwell = Duration::ZERO;
        self.timeout = Duration::ZERO;
        self.min_timer.reset();
        self.max_timer.reset();
    }

    /// The first registered mode becomes the default. Nothing is published
    /// until [`AutonomousModes::publish`] is called.
    pub fn add_autonomous_mode<F>(
        &mut self,
        name: impl Into<String>,
        function: F,
        initial_state: StateId,
    ) where
        F: Fn(&mut R, StateId) -> NextState + 'static,
    {
        self.modes
            .add(name, AutonomousProgram::new(function, initial_state));
    }

    pub fn modes(&self) -> &AutonomousModes<R> {
        &self.modes
    }

    pub fn select_autonomous_mode(&mut self, name: &str) -> Result<(), ModeError> {
        let program = self
            .modes
            .get(name)
            .cloned()
            .ok_or_else(|| ModeError::UnknownMode(name.into()))?;
        info!("autonomous mode {:?} selected", name);
        self.activate(&program);
        Ok(())
    }

    pub fn select_default_mode(&mut self) -> Result<(), ModeError> {
        let (name, program) = self.modes.default_mode().ok_or(ModeError::NoModes)?;
        info!("autonomous mode {:?} selected", name);
        let program = program.clone();
        self.activate(&program);
        Ok(())
    }

    pub fn current_state(&self) -> StateId {
        self.current_state
    }

    pub fn is_finished(&self) -> bool {
        self.current_state == END_STATE
    }

    pub fn min_dwell(&self) -> Duration {
        self.min_dwell
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// One control tick: updates the robot, then enters the next state if the
    /// guards allow it.
    pub fn run<K: Clock + ?Sized>(&mut self, robot: &mut R, clock: &K)
    where
        R: Robot,
    {
        let finished = robot.update_subsystems();

        if self.current_state == END_STATE {
            return;
        }

        let now = clock.now();
        let dwelled = finished && self.min_timer.check(now, self.min_dwell);
        if dwelled || self.max_timer.check(now, self.timeout) {
            let next = (self.function)(robot, self.current_state);
            info!(
                "autonomous state {} -> {} (min {:?}, timeout {:?}{})",
                self.current_state,
                next.next_state_id(),
                next.min_dwell(),
                next.timeout(),
                if dwelled { "" } else { ", timed out" }
            );

            self.min_timer.restart(now);
            self.max_timer.restart(now);
            self.current_state = next.next_state_id();
            self.min_dwell = next.min_dwell();
            self.timeout = next.timeout();
        }
    }
}

impl<R> fmt::Debug for AutonomousManager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutonomousManager")
            .field("current_state", &self.current_state)
            .field("min_dwell", &self.min_dwell)
            .field("timeout", &self.timeout)
            .field("modes", &self.modes)
            .finish_non_exhaustive()
    }
}
