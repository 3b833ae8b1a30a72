use core::time::Duration;

/// A sample of a one-dimensional profile: where the axis should be and how
/// fast it should be moving, both relative to the start of the move.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProfilePoint {
    pub position: f64,
    pub velocity: f64,
}

pub trait MotionProfile {
    fn get_duration(&self) -> Duration;

    /// Returns `None` once `t` is past the end of the profile.
    fn get(&self, t: Duration) -> Option<ProfilePoint>;
}
