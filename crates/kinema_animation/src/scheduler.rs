//! Frame clock
//!
//! Measures real elapsed time between display refreshes and feeds it to
//! [`Animator::tick`]. Hosts call [`FrameClock::tick`] from their frame
//! callback and stop scheduling once [`Animator::has_active`] is false.

use std::time::{Duration, Instant};

use crate::animator::Animator;

/// Longest step a single frame may take, so a stalled host does not jump
/// through whole animations
pub const DEFAULT_MAX_DELTA: Duration = Duration::from_millis(250);

pub struct FrameClock {
    last_frame: Option<Instant>,
    max_delta: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_frame: None,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }

    pub fn with_max_delta(mut self, max_delta: Duration) -> Self {
        self.max_delta = max_delta;
        self
    }

    /// Seconds since the previous frame, capped; 0 on the first frame
    pub fn delta(&mut self, now: Instant) -> f64 {
        let dt = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).min(self.max_delta))
            .unwrap_or_default();
        self.last_frame = Some(now);
        dt.as_secs_f64()
    }

    /// Tick `animator` with the time since the previous frame.
    ///
    /// Returns the delta that was applied.
    pub fn tick(&mut self, animator: &mut Animator) -> f64 {
        let dt = self.delta(Instant::now());
        animator.tick(dt);
        dt
    }

    /// Forget the previous frame, e.g. after the host stopped scheduling
    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ControllerOptions;

    #[test]
    fn test_delta_is_measured_and_capped() {
        let mut clock = FrameClock::new().with_max_delta(Duration::from_millis(100));
        let start = Instant::now();
        assert_eq!(clock.delta(start), 0.0);
        assert!((clock.delta(start + Duration::from_millis(16)) - 0.016).abs() < 1e-9);
        assert!((clock.delta(start + Duration::from_secs(5)) - 0.1).abs() < 1e-9);
        clock.reset();
        assert_eq!(clock.delta(start + Duration::from_secs(6)), 0.0);
    }

    #[test]
    fn test_first_tick_starts_animations() {
        let mut animator = Animator::with_defaults(ControllerOptions::new());
        let id = animator.create(ControllerOptions::new().duration(10.0));
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(&mut animator), 0.0);
        assert!(animator.controller(id).is_some_and(|c| c.is_attached()));
        assert!(animator.has_active());
    }
}
