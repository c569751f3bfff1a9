//! Controller options
//!
//! [`ControllerOptions`] is the partial, layerable form callers write (and
//! deserialize from JSON or TOML). Layers merge field by field, and the
//! result is resolved once into [`ResolvedOptions`] when a controller is
//! created.

use kinema_core::diagnostics;
use kinema_core::{KinemaError, Result, WarningKind};
use serde::Deserialize;

use crate::easing::Easing;
use crate::keyframe::Keyframes;
use crate::placement::{Placement, UNBOUNDED};
use crate::stagger::StaggerOptions;

/// Partial controller options; `None` inherits from the layer below
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerOptions {
    pub id: Option<String>,
    /// Seconds before the first iteration
    pub delay: Option<f64>,
    /// Let the delay run again when played backwards through zero
    pub delay_recharge: Option<bool>,
    /// Seconds per iteration
    pub duration: Option<f64>,
    /// Extra iterations, `-1` repeats forever
    pub repeat: Option<i32>,
    /// Seconds between iterations
    pub iteration_delay: Option<f64>,
    /// Run odd iterations backwards
    pub alternate: Option<bool>,
    /// Do not start on the next flush
    pub paused: Option<bool>,
    pub ease: Option<Easing>,
    /// Ease for alternating iterations
    pub alternate_ease: Option<Easing>,
    /// Initial total progress
    pub playhead: Option<f64>,
    pub reversed: Option<bool>,
    pub time_scale: Option<f64>,
    /// Render the start state immediately
    pub pre_render: Option<bool>,
    /// Read the eased curve from the far end
    pub backwards: Option<bool>,
    /// Default placement inside a timeline
    pub at: Option<Placement>,
    pub stagger: Option<StaggerOptions>,
    pub keyframes: Option<Keyframes>,
}

macro_rules! merge_fields {
    ($base:expr, $over:expr, $($field:ident),* $(,)?) => {
        ControllerOptions {
            $($field: $over.$field.clone().or_else(|| $base.$field.clone()),)*
        }
    };
}

impl ControllerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object with camelCase keys
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| KinemaError::Config(e.to_string()))
    }

    /// Layer `over` on top of `self`
    pub fn merge(&self, over: &ControllerOptions) -> ControllerOptions {
        merge_fields!(
            self,
            over,
            id,
            delay,
            delay_recharge,
            duration,
            repeat,
            iteration_delay,
            alternate,
            paused,
            ease,
            alternate_ease,
            playhead,
            reversed,
            time_scale,
            pre_render,
            backwards,
            at,
            stagger,
            keyframes,
        )
    }

    /// Built-in values every timeline starts from
    pub fn timeline_defaults() -> Self {
        Self::new().duration(0.0).ease(Easing::Linear)
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn delay(mut self, delay: f64) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn delay_recharge(mut self, recharge: bool) -> Self {
        self.delay_recharge = Some(recharge);
        self
    }

    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn repeat(mut self, repeat: i32) -> Self {
        self.repeat = Some(repeat);
        self
    }

    pub fn iteration_delay(mut self, delay: f64) -> Self {
        self.iteration_delay = Some(delay);
        self
    }

    pub fn alternate(mut self, alternate: bool) -> Self {
        self.alternate = Some(alternate);
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = Some(paused);
        self
    }

    pub fn ease(mut self, ease: impl Into<Easing>) -> Self {
        self.ease = Some(ease.into());
        self
    }

    pub fn alternate_ease(mut self, ease: impl Into<Easing>) -> Self {
        self.alternate_ease = Some(ease.into());
        self
    }

    pub fn playhead(mut self, playhead: f64) -> Self {
        self.playhead = Some(playhead);
        self
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = Some(reversed);
        self
    }

    pub fn time_scale(mut self, scale: f64) -> Self {
        self.time_scale = Some(scale);
        self
    }

    pub fn pre_render(mut self, pre_render: bool) -> Self {
        self.pre_render = Some(pre_render);
        self
    }

    pub fn backwards(mut self, backwards: bool) -> Self {
        self.backwards = Some(backwards);
        self
    }

    pub fn at(mut self, at: impl Into<Placement>) -> Self {
        self.at = Some(at.into());
        self
    }

    pub fn stagger(mut self, stagger: impl Into<StaggerOptions>) -> Self {
        self.stagger = Some(stagger.into());
        self
    }

    pub fn keyframes(mut self, keyframes: Keyframes) -> Self {
        self.keyframes = Some(keyframes);
        self
    }

    /// Fill every unset field from the built-in defaults.
    ///
    /// Out-of-range values are reported and replaced by the default.
    pub fn resolve(&self) -> ResolvedOptions {
        let defaults = ResolvedOptions::default();
        let non_negative = |name: &str, value: Option<f64>, default: f64| match value {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            Some(v) => {
                diagnostics::warn(
                    WarningKind::InvalidOption,
                    format!("{name} must be a non-negative number, got {v}"),
                );
                default
            }
            None => default,
        };

        let repeat = match self.repeat {
            Some(r) if r < -1 => {
                diagnostics::warn(
                    WarningKind::InvalidOption,
                    format!("repeat must be -1 or at least 0, got {r}"),
                );
                defaults.repeat
            }
            Some(r) => r,
            None => defaults.repeat,
        };
        let time_scale = match self.time_scale {
            Some(s) if s.is_finite() && s > 0.0 => s,
            Some(s) => {
                diagnostics::warn(
                    WarningKind::InvalidOption,
                    format!("timeScale must be positive, got {s}"),
                );
                defaults.time_scale
            }
            None => defaults.time_scale,
        };

        ResolvedOptions {
            id: self.id.clone(),
            delay: non_negative("delay", self.delay, defaults.delay),
            delay_recharge: self.delay_recharge.unwrap_or(defaults.delay_recharge),
            duration: non_negative("duration", self.duration, defaults.duration),
            repeat,
            iteration_delay: non_negative(
                "iterationDelay",
                self.iteration_delay,
                defaults.iteration_delay,
            ),
            alternate: self.alternate.unwrap_or(defaults.alternate),
            paused: self.paused.unwrap_or(defaults.paused),
            ease: self.ease.clone().unwrap_or(defaults.ease),
            alternate_ease: self.alternate_ease.clone(),
            playhead: self.playhead.unwrap_or(defaults.playhead).clamp(0.0, 1.0),
            reversed: self.reversed.unwrap_or(defaults.reversed),
            time_scale,
            pre_render: self.pre_render.unwrap_or(defaults.pre_render),
            backwards: self.backwards.unwrap_or(defaults.backwards),
            at: self.at.clone(),
            stagger: self.stagger.clone(),
            keyframes: self.keyframes.clone(),
        }
    }
}

/// Concrete options of a live controller
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedOptions {
    pub id: Option<String>,
    pub delay: f64,
    pub delay_recharge: bool,
    pub duration: f64,
    pub repeat: i32,
    pub iteration_delay: f64,
    pub alternate: bool,
    pub paused: bool,
    pub ease: Easing,
    pub alternate_ease: Option<Easing>,
    pub playhead: f64,
    pub reversed: bool,
    pub time_scale: f64,
    pub pre_render: bool,
    pub backwards: bool,
    pub at: Option<Placement>,
    pub stagger: Option<StaggerOptions>,
    pub keyframes: Option<Keyframes>,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            id: None,
            delay: 0.0,
            delay_recharge: false,
            duration: 1.0,
            repeat: 0,
            iteration_delay: 0.0,
            alternate: false,
            paused: false,
            ease: Easing::power_in_out(),
            alternate_ease: None,
            playhead: 0.0,
            reversed: false,
            time_scale: 1.0,
            pre_render: false,
            backwards: false,
            at: None,
            stagger: None,
            keyframes: None,
        }
    }
}

impl ResolvedOptions {
    /// Duration capped at the unbounded limit
    pub fn capped_duration(&self) -> f64 {
        self.duration.min(UNBOUNDED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_core::diagnostics::{with_warning_sink, CollectingSink};
    use std::sync::Arc;

    #[test]
    fn test_merge_layers() {
        let global = ControllerOptions::new().duration(2.0).ease("powerOut(2)");
        let instance = ControllerOptions::new().duration(0.5).repeat(1);
        let merged = global.merge(&instance);
        assert_eq!(merged.duration, Some(0.5));
        assert_eq!(merged.repeat, Some(1));
        assert_eq!(merged.ease, Some(Easing::PowerOut(2.0)));
        assert_eq!(merged.delay, None);
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = ControllerOptions::new().resolve();
        assert_eq!(resolved, ResolvedOptions::default());
        assert_eq!(resolved.ease, Easing::PowerInOut(1.0));
        assert_eq!(ControllerOptions::timeline_defaults().resolve().duration, 0.0);
    }

    #[test]
    fn test_from_json() {
        let opts = ControllerOptions::from_json(
            r#"{"duration": 2, "iterationDelay": 0.5, "ease": "bounceOut", "at": "mid+=1", "timeScale": 2}"#,
        )
        .unwrap();
        assert_eq!(opts.duration, Some(2.0));
        assert_eq!(opts.iteration_delay, Some(0.5));
        assert_eq!(opts.ease, Some(Easing::BounceOut));
        assert_eq!(opts.at, Some(Placement::from("mid+=1")));
        assert_eq!(opts.time_scale, Some(2.0));
        assert!(ControllerOptions::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_invalid_values_reported() {
        let sink = Arc::new(CollectingSink::new());
        let resolved = with_warning_sink(sink.clone(), || {
            ControllerOptions::new()
                .duration(-1.0)
                .time_scale(0.0)
                .repeat(-3)
                .playhead(4.0)
                .resolve()
        });
        assert_eq!(resolved.duration, 1.0);
        assert_eq!(resolved.time_scale, 1.0);
        assert_eq!(resolved.repeat, 0);
        assert_eq!(resolved.playhead, 1.0);
        assert_eq!(sink.count(WarningKind::InvalidOption), 3);
    }
}
