//! Controller progress state machine
//!
//! A controller owns one normalized playhead, the total progress over its
//! whole repeat sequence. Iteration, local progress and eased progress are
//! all derived from it. Writes go through [`Controller::commit`], which
//! reports the lifecycle events the write crossed.
//!
//! Operations that move the playhead are exposed on the
//! [`Animator`](crate::Animator), since timelines and tweens extend the
//! update with their own propagation.

use kinema_core::diagnostics;
use kinema_core::{ControllerEvent, ControllerId, WarningKind};
use smallvec::SmallVec;

use crate::easing::Easing;
use crate::options::ResolvedOptions;
use crate::placement::UNBOUNDED;

/// Substitute for zero-length spans in divisions
pub(crate) const EPSILON: f64 = 1e-8;

pub(crate) fn non_zero(n: f64) -> f64 {
    if n == 0.0 {
        EPSILON
    } else {
        n
    }
}

/// Events fired by one playhead write, in firing order
pub type FiredEvents = SmallVec<[ControllerEvent; 4]>;

/// Observable playback state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    /// Never played
    Idle,
    /// Playing forward through the start delay
    Delaying,
    Active,
    Paused,
    /// Paused at total progress 1
    Completed,
    /// Paused at total progress 0 after playing backwards
    ReverseCompleted,
}

/// Time state of one controller
#[derive(Clone, Debug)]
pub struct Controller {
    options: ResolvedOptions,
    total_progress: f64,
    delay_progress: f64,
    paused: bool,
    reversed: bool,
    started: bool,
    attached: bool,
    initialized: bool,
    parent: Option<ControllerId>,
}

impl Controller {
    pub fn new(options: ResolvedOptions) -> Self {
        Self {
            total_progress: options.playhead,
            reversed: options.reversed,
            options,
            delay_progress: 0.0,
            paused: false,
            started: false,
            attached: false,
            initialized: false,
            parent: None,
        }
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn id(&self) -> Option<&str> {
        self.options.id.as_deref()
    }

    pub fn parent(&self) -> Option<ControllerId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Advanced by the driver on every tick
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_playing(&self) -> bool {
        !self.paused
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Rendered at least once, or set to render its start state
    pub fn is_initialized(&self) -> bool {
        self.options.pre_render || self.initialized
    }

    // options

    /// Seconds per iteration, capped at the unbounded limit
    pub fn duration(&self) -> f64 {
        self.options.capped_duration()
    }

    pub fn delay(&self) -> f64 {
        self.options.delay
    }

    pub fn delay_recharge(&self) -> bool {
        self.options.delay_recharge
    }

    /// Repeat option as given, `-1` for infinite
    pub fn repeat(&self) -> i32 {
        self.options.repeat
    }

    pub fn iteration_delay(&self) -> f64 {
        self.options.iteration_delay
    }

    pub fn alternate(&self) -> bool {
        self.options.alternate
    }

    pub fn time_scale(&self) -> f64 {
        self.options.time_scale
    }

    pub fn ease(&self) -> &Easing {
        &self.options.ease
    }

    pub fn alternate_ease(&self) -> Option<&Easing> {
        self.options.alternate_ease.as_ref()
    }

    pub fn backwards(&self) -> bool {
        self.options.backwards
    }

    pub fn pre_render(&self) -> bool {
        self.options.pre_render
    }

    // derived time

    fn repeats(&self) -> f64 {
        let repeat = self.options.repeat;
        if self.duration() == 0.0 {
            return if repeat == -1 {
                UNBOUNDED
            } else {
                repeat.max(0) as f64
            };
        }
        let limit = UNBOUNDED / self.options.duration;
        let repeats = if repeat == -1 {
            limit
        } else {
            (repeat.max(0) as f64).min(limit)
        };
        repeats.floor()
    }

    /// Effective number of repeats; infinite repeat is bounded by the
    /// unbounded duration
    pub fn repeat_count(&self) -> u64 {
        self.repeats() as u64
    }

    fn cycle(&self) -> f64 {
        self.duration() + self.iteration_delay()
    }

    /// `(repeat + 1) * duration + repeat * iteration_delay`
    pub fn total_duration(&self) -> f64 {
        let repeats = self.repeats();
        (repeats + 1.0) * self.duration() + repeats * self.iteration_delay()
    }

    pub fn total_progress(&self) -> f64 {
        self.total_progress
    }

    pub fn total_elapsed(&self) -> f64 {
        self.total_progress * non_zero(self.total_duration())
    }

    /// 1 when there is no delay
    pub fn delay_progress(&self) -> f64 {
        if self.delay() == 0.0 {
            1.0
        } else {
            self.delay_progress
        }
    }

    pub fn delay_elapsed(&self) -> f64 {
        self.delay_progress() * self.delay()
    }

    pub fn progress(&self) -> f64 {
        self.progress_at(self.total_progress)
    }

    pub fn elapsed(&self) -> f64 {
        self.progress() * self.duration()
    }

    pub fn eased_progress(&self) -> f64 {
        self.eased_progress_at(self.total_progress)
    }

    pub fn eased_elapsed(&self) -> f64 {
        self.eased_progress() * self.duration()
    }

    /// Current iteration; total progress 1 maps to the final one
    pub fn iteration(&self) -> u64 {
        let total = self.total_duration();
        if total == 0.0 {
            return (self.total_progress.round() * self.repeats()) as u64;
        }
        if self.total_progress == 1.0 {
            return self.repeat_count();
        }
        (total * self.total_progress / self.cycle()).floor() as u64
    }

    pub fn is_alternating(&self) -> bool {
        self.is_alternating_at(self.total_progress)
    }

    pub fn play_state(&self) -> PlayState {
        if self.paused {
            if self.total_progress >= 1.0 {
                PlayState::Completed
            } else if self.total_progress <= 0.0 && self.reversed {
                PlayState::ReverseCompleted
            } else {
                PlayState::Paused
            }
        } else if !self.started {
            PlayState::Idle
        } else if !self.reversed && self.delay_progress() < 1.0 {
            PlayState::Delaying
        } else {
            PlayState::Active
        }
    }

    // playhead functions

    /// Iteration at total progress `playhead`, never above the repeat count
    pub fn iteration_at(&self, playhead: f64) -> u64 {
        if playhead <= 0.0 {
            return 0;
        }
        if playhead >= 1.0 {
            return self.repeat_count();
        }
        let cycle = self.cycle();
        if cycle == 0.0 {
            return 0;
        }
        let iteration = (non_zero(self.total_duration()) * playhead / cycle).floor() as u64;
        iteration.min(self.repeat_count())
    }

    pub fn is_alternating_at(&self, playhead: f64) -> bool {
        self.alternate() && self.iteration_at(playhead) % 2 == 1
    }

    /// Iteration-local progress at total progress `playhead`.
    ///
    /// At `playhead == 1` without iteration delay an alternating sequence
    /// that ends on an odd iteration lands on its start pose (0).
    pub fn progress_at(&self, playhead: f64) -> f64 {
        let duration = self.duration();
        let alternating = self.is_alternating_at(playhead);

        if duration == 0.0 {
            let repeats = self.repeats();
            if repeats > 0.0 {
                let value = (playhead * repeats).clamp(0.0, 1.0).ceil();
                return if alternating { 1.0 - value } else { value };
            }
            return playhead.round();
        }

        if playhead == 1.0 && self.iteration_delay() == 0.0 {
            return if self.alternate() && alternating { 0.0 } else { 1.0 };
        }

        let elapsed = (non_zero(self.total_duration()) * playhead) % self.cycle();
        let progress = (elapsed / duration).clamp(0.0, 1.0);
        if alternating {
            1.0 - progress
        } else {
            progress
        }
    }

    /// Eased local progress at `playhead`.
    ///
    /// Alternating iterations use the alternate ease when one is set; a
    /// backwards controller reads the curve from the far end.
    pub fn eased_progress_at(&self, playhead: f64) -> f64 {
        let progress = self.progress_at(playhead);
        let backwards = self.backwards();
        let phase = if backwards { 1.0 - playhead } else { playhead };
        let ease = match self.alternate_ease() {
            Some(ease) if self.is_alternating_at(phase) => ease,
            _ => self.ease(),
        };
        let eased = ease.apply(progress);
        if backwards {
            1.0 - eased
        } else {
            eased
        }
    }

    /// Total progress at `total_elapsed` seconds into the sequence
    pub fn total_progress_for_elapsed(&self, total_elapsed: f64) -> f64 {
        total_elapsed / non_zero(self.total_duration())
    }

    /// Total elapsed that puts the current iteration at local `progress`
    pub fn total_elapsed_for_progress(&self, progress: f64) -> f64 {
        let local = if self.is_alternating() {
            1.0 - progress
        } else {
            progress
        };
        self.iteration() as f64 * self.cycle() + local * self.duration()
    }

    /// Total elapsed of the same local position in `iteration`
    pub fn total_elapsed_for_iteration(&self, iteration: u64) -> f64 {
        let elapsed = self.elapsed();
        let local = if self.is_alternating() {
            self.duration() - elapsed
        } else {
            elapsed
        };
        iteration as f64 * self.cycle() + local
    }

    // state transitions

    /// Store a new total progress.
    ///
    /// Clamps to `[0, 1]`, resumes on non-boundary values and pauses on the
    /// boundary of the current direction. A reversed controller with
    /// delay recharge stays alive at 0 until its delay has drained.
    pub(crate) fn commit(&mut self, total_progress: f64, events: bool) -> FiredEvents {
        let mut fired = FiredEvents::new();
        if total_progress.is_nan() {
            return fired;
        }
        let next = total_progress.clamp(0.0, 1.0);
        let previous = self.total_progress;

        if self.reversed {
            if next != 0.0 {
                self.paused = false;
            }
        } else if next != 1.0 {
            self.paused = false;
        }

        if events {
            if previous == 0.0 && next > 0.0 {
                fired.push(ControllerEvent::Start);
            }
            if previous < 1.0 && next == 1.0 {
                fired.push(ControllerEvent::Complete);
            }
            if previous == 1.0 && next < 1.0 {
                fired.push(ControllerEvent::ReverseStart);
            }
            if previous > 0.0 && next == 0.0 {
                fired.push(ControllerEvent::ReverseComplete);
            }
            if self.iteration() != self.iteration_at(next) {
                fired.push(ControllerEvent::Repeat);
            }
            if previous != next {
                fired.push(ControllerEvent::Update);
            }
        }

        self.total_progress = next;

        if !self.paused {
            let at_boundary = if self.reversed {
                next == 0.0 && (!self.delay_recharge() || self.delay_progress() == 0.0)
            } else {
                next == 1.0
            };
            if at_boundary {
                tracing::debug!(total_progress = next, "controller reached its boundary");
                self.halt();
            }
        }
        fired
    }

    /// Stop and detach; an unfinished delay starts over
    pub(crate) fn halt(&mut self) {
        self.paused = true;
        self.attached = false;
        if self.delay_progress() != 1.0 {
            self.delay_progress = 0.0;
        }
    }

    /// Start moving in a direction; roots attach to the driver
    pub(crate) fn begin(&mut self, reversed: bool) {
        self.paused = false;
        self.reversed = reversed;
        self.started = true;
        if self.parent.is_none() {
            self.attached = true;
        }
    }

    /// One driver step of `dt` seconds.
    ///
    /// Returns the new total progress when the playhead moves. Time spent
    /// in the delay is absorbed there, and forward overflow past the delay
    /// carries into the playhead.
    pub(crate) fn advance(&mut self, dt: f64) -> Option<f64> {
        let direction = if self.reversed { -1.0 } else { 1.0 };
        let delta = dt * self.time_scale() * direction;
        let in_delay = (!self.reversed && self.delay_progress() < 1.0)
            || (self.delay_recharge() && self.reversed && self.total_progress == 0.0);

        if !in_delay {
            return Some(self.total_progress + delta / non_zero(self.total_duration()));
        }

        let delay = self.delay();
        if delay <= 0.0 {
            self.delay_progress = 1.0;
            if self.reversed {
                self.halt();
            }
            return None;
        }

        let raw = self.delay_progress + delta / delay;
        self.delay_progress = raw.clamp(0.0, 1.0);
        if raw > 1.0 {
            let carry = (raw - 1.0) * delay;
            return Some(self.total_progress + carry / non_zero(self.total_duration()));
        }
        if self.reversed && self.delay_progress == 0.0 {
            tracing::debug!("recharged delay drained");
            self.halt();
        }
        None
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ControllerId>) {
        self.parent = parent;
        if parent.is_some() {
            self.attached = false;
        }
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub(crate) fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    pub(crate) fn store_duration(&mut self, duration: f64) {
        if valid_seconds("duration", duration) {
            self.options.duration = duration;
        }
    }

    pub(crate) fn store_repeat(&mut self, repeat: i32) {
        if repeat < -1 {
            diagnostics::warn(
                WarningKind::InvalidOption,
                format!("repeat must be -1 or at least 0, got {repeat}"),
            );
            return;
        }
        self.options.repeat = repeat;
    }

    pub(crate) fn store_alternate(&mut self, alternate: bool) {
        self.options.alternate = alternate;
    }

    pub(crate) fn store_iteration_delay(&mut self, delay: f64) {
        if valid_seconds("iterationDelay", delay) {
            self.options.iteration_delay = delay;
        }
    }

    pub(crate) fn set_time_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.options.time_scale = scale;
        } else {
            diagnostics::warn(
                WarningKind::InvalidOption,
                format!("timeScale must be positive, got {scale}"),
            );
        }
    }

    /// Change the delay; `restart` defaults to restarting an unfinished
    /// delay, otherwise the elapsed delay time is kept
    pub(crate) fn set_delay(&mut self, delay: f64, restart: Option<bool>) {
        if !valid_seconds("delay", delay) {
            return;
        }
        let restart = restart.unwrap_or(self.delay_progress != 1.0);
        let before = self.options.delay;
        self.options.delay = delay;
        self.delay_progress = if restart {
            0.0
        } else if delay > 0.0 {
            (self.delay_progress * before / delay).clamp(0.0, 1.0)
        } else {
            1.0
        };
    }

    pub(crate) fn set_delay_progress(&mut self, progress: f64) {
        if !progress.is_nan() {
            self.delay_progress = progress.clamp(0.0, 1.0);
        }
    }

    pub(crate) fn set_delay_elapsed(&mut self, elapsed: f64) {
        if self.delay() > 0.0 {
            self.set_delay_progress(elapsed / self.delay());
        }
    }
}

fn valid_seconds(name: &str, value: f64) -> bool {
    let valid = value.is_finite() && value >= 0.0;
    if !valid {
        diagnostics::warn(
            WarningKind::InvalidOption,
            format!("{name} must be a non-negative number, got {value}"),
        );
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ControllerOptions;

    fn controller(options: ControllerOptions) -> Controller {
        Controller::new(options.ease(Easing::Linear).resolve())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_total_duration() {
        let c = controller(ControllerOptions::new().duration(2.0).repeat(3).iteration_delay(0.5));
        assert_eq!(c.total_duration(), 9.5);

        let infinite = controller(ControllerOptions::new().duration(2.0).repeat(-1));
        assert_eq!(infinite.repeat_count(), 50_000_000);

        let instant = controller(ControllerOptions::new().duration(0.0).repeat(-1));
        assert_eq!(instant.repeat_count(), 100_000_000);
        assert_eq!(instant.total_duration(), 0.0);
    }

    #[test]
    fn test_progress_at_boundaries() {
        let c = controller(ControllerOptions::new().duration(1.0));
        assert_eq!(c.progress_at(0.0), 0.0);
        assert_eq!(c.progress_at(1.0), 1.0);
        assert!(close(c.progress_at(0.25), 0.25));

        let c = controller(ControllerOptions::new().duration(1.0).repeat(1));
        assert!(close(c.progress_at(0.75), 0.5));
        assert_eq!(c.iteration_at(0.75), 1);
        assert_eq!(c.iteration_at(1.0), 1);
    }

    #[test]
    fn test_alternate_ends_on_start_pose() {
        let c = controller(ControllerOptions::new().duration(1.0).repeat(1).alternate(true));
        assert!(c.is_alternating_at(0.75));
        assert!(close(c.progress_at(0.75), 0.5));
        assert!(close(c.progress_at(0.6), 0.8));
        assert_eq!(c.progress_at(1.0), 0.0);

        let even = controller(ControllerOptions::new().duration(1.0).repeat(2).alternate(true));
        assert_eq!(even.progress_at(1.0), 1.0);
    }

    #[test]
    fn test_zero_duration_progress() {
        let c = controller(ControllerOptions::new().duration(0.0));
        assert_eq!(c.progress_at(0.4), 0.0);
        assert_eq!(c.progress_at(0.6), 1.0);

        let repeated = controller(ControllerOptions::new().duration(0.0).repeat(2));
        assert_eq!(repeated.progress_at(0.0), 0.0);
        assert_eq!(repeated.progress_at(0.1), 1.0);
    }

    #[test]
    fn test_eased_progress_backwards() {
        let c = Controller::new(
            ControllerOptions::new()
                .duration(1.0)
                .ease("powerIn(2)")
                .backwards(true)
                .resolve(),
        );
        assert!(close(c.eased_progress_at(0.5), 0.875));
        assert_eq!(c.eased_progress_at(0.0), 1.0);
    }

    #[test]
    fn test_alternate_ease() {
        let c = Controller::new(
            ControllerOptions::new()
                .duration(1.0)
                .repeat(1)
                .alternate(true)
                .ease(Easing::Linear)
                .alternate_ease("powerIn(2)")
                .resolve(),
        );
        // second iteration runs 1 -> 0 through the alternate curve
        assert!(close(c.eased_progress_at(0.75), 0.125));
        assert!(close(c.eased_progress_at(0.25), 0.25));
    }

    #[test]
    fn test_commit_events() {
        let mut c = controller(ControllerOptions::new().duration(1.0).repeat(1));
        assert_eq!(
            c.commit(0.25, true).as_slice(),
            &[ControllerEvent::Start, ControllerEvent::Update]
        );
        assert_eq!(
            c.commit(0.75, true).as_slice(),
            &[ControllerEvent::Repeat, ControllerEvent::Update]
        );
        assert_eq!(
            c.commit(2.0, true).as_slice(),
            &[ControllerEvent::Complete, ControllerEvent::Update]
        );
        assert_eq!(c.total_progress(), 1.0);
        assert!(c.commit(1.0, true).is_empty());
        assert!(c.commit(0.5, false).is_empty());
    }

    #[test]
    fn test_commit_pauses_at_boundary() {
        let mut c = controller(ControllerOptions::new().duration(1.0));
        c.begin(false);
        assert!(c.is_attached());
        c.commit(1.0, true);
        assert!(!c.is_playing());
        assert!(!c.is_attached());
        assert_eq!(c.play_state(), PlayState::Completed);

        c.begin(true);
        c.commit(0.5, true);
        assert_eq!(c.play_state(), PlayState::Active);
        c.commit(0.0, true);
        assert_eq!(c.play_state(), PlayState::ReverseCompleted);
    }

    #[test]
    fn test_advance_through_delay() {
        let mut c = controller(ControllerOptions::new().duration(1.0).delay(0.5));
        c.begin(false);
        assert_eq!(c.play_state(), PlayState::Delaying);
        assert_eq!(c.advance(0.25), None);
        assert!(close(c.delay_progress(), 0.5));
        let next = c.advance(0.5).unwrap_or_default();
        assert!(close(next, 0.25));
        assert_eq!(c.delay_progress(), 1.0);
        assert!(close(c.advance(0.5).unwrap_or_default(), 0.5));
    }

    #[test]
    fn test_recharged_delay_drains_then_pauses() {
        let mut c = controller(
            ControllerOptions::new()
                .duration(1.0)
                .delay(1.0)
                .delay_recharge(true)
                .playhead(0.0),
        );
        c.set_delay_progress(1.0);
        c.begin(true);
        assert_eq!(c.advance(0.5), None);
        assert!(close(c.delay_progress(), 0.5));
        assert!(c.is_playing());
        assert_eq!(c.advance(0.75), None);
        assert_eq!(c.delay_progress(), 0.0);
        assert!(!c.is_playing());
    }

    #[test]
    fn test_set_delay_keeps_elapsed() {
        let mut c = controller(ControllerOptions::new().delay(1.0));
        c.set_delay_progress(0.5);
        c.set_delay(2.0, Some(false));
        assert!(close(c.delay_elapsed(), 0.5));
        c.set_delay(1.0, None);
        assert_eq!(c.delay_progress(), 0.0);
    }

    #[test]
    fn test_elapsed_conversions() {
        let mut c = controller(ControllerOptions::new().duration(2.0).repeat(1).iteration_delay(1.0));
        c.commit(0.8, false);
        assert_eq!(c.iteration(), 1);
        assert!(close(c.total_elapsed_for_progress(0.5), 4.0));
        assert!(close(c.total_progress_for_elapsed(2.5), 0.5));
    }
}
