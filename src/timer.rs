use core::time::Duration;

/// Elapsed-time guard driven by externally supplied timestamps.
///
/// A timer that has been [`reset`](Self::reset) without a timestamp starts
/// counting at the first [`check`](Self::check).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct GuardTimer {
    started: Option<Duration>,
}

impl GuardTimer {
    pub const fn new() -> Self {
        Self { started: None }
    }

    pub fn reset(&mut self) {
        self.started = None;
    }

    pub fn restart(&mut self, now: Duration) {
        self.started = Some(now);
    }

    pub fn elapsed(&mut self, now: Duration) -> Duration {
        let started = *self.started.get_or_insert(now);
        now.saturating_sub(started)
    }

    /// True once at least `limit` has passed since the timer started.
    pub fn check(&mut self, now: Duration, limit: Duration) -> bool {
        self.elapsed(now) >= limit
    }
}
