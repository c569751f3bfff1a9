//! Timeline composition
//!
//! A timeline is a controller whose eased elapsed time drives its children.
//! Children are placed at absolute times or with placement expressions, and
//! named labels mark times for later placements and seeks. The timeline's
//! duration grows to cover its last child.

use indexmap::IndexMap;
use kinema_core::diagnostics;
use kinema_core::{ControllerId, KinemaError, WarningKind};
use kinema_style::PropertyMap;

use crate::animator::{Animator, NodeKind};
use crate::controller::{Controller, EPSILON};
use crate::options::ControllerOptions;
use crate::placement::{Placement, PlacementContext, UNBOUNDED};
use crate::targets::Targets;

/// A child and the time it was placed at
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attached {
    pub child: ControllerId,
    pub time: f64,
}

impl Attached {
    /// Placement time plus the child's own delay
    pub fn start(&self, child: &Controller) -> f64 {
        self.time + child.delay()
    }

    /// Start plus the child's scaled total duration; instant children get
    /// a minimal span so they still resolve
    pub fn end(&self, child: &Controller) -> f64 {
        let total = child.total_duration();
        let instant = if total == 0.0 { EPSILON } else { 0.0 };
        self.start(child) + total / child.time_scale() + instant
    }
}

/// Children and labels of a timeline
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    pub(crate) attached: Vec<Attached>,
    pub(crate) labels: IndexMap<String, f64>,
}

impl Timeline {
    pub fn attached(&self) -> &[Attached] {
        &self.attached
    }

    pub fn labels(&self) -> &IndexMap<String, f64> {
        &self.labels
    }
}

/// Label names start with a letter and continue with word characters or
/// hyphens
fn is_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

impl Animator {
    /// A new timeline; it starts on the next tick unless paused
    pub fn timeline(&mut self, options: ControllerOptions) -> ControllerId {
        self.insert_timeline(&options, None)
    }

    pub(crate) fn insert_timeline(
        &mut self,
        options: &ControllerOptions,
        parent: Option<ControllerId>,
    ) -> ControllerId {
        let resolved = self
            .defaults()
            .merge(&ControllerOptions::timeline_defaults())
            .merge(options)
            .resolve();
        let id = self.insert(resolved, NodeKind::Timeline(Timeline::default()), parent.is_none());
        if let Some(controller) = self.controller_mut(id) {
            controller.set_parent(parent);
        }
        id
    }

    pub fn timeline_state(&self, id: ControllerId) -> Option<&Timeline> {
        match self.nodes.get(id).map(|node| &node.kind) {
            Some(NodeKind::Timeline(timeline)) => Some(timeline),
            _ => None,
        }
    }

    pub fn labels(&self, timeline: ControllerId) -> Option<&IndexMap<String, f64>> {
        self.timeline_state(timeline).map(Timeline::labels)
    }

    pub fn children(&self, timeline: ControllerId) -> Vec<ControllerId> {
        self.timeline_state(timeline)
            .map(|t| t.attached.iter().map(|a| a.child).collect())
            .unwrap_or_default()
    }

    /// `(start, end)` of a child inside its timeline
    pub fn child_span(&self, timeline: ControllerId, child: ControllerId) -> Option<(f64, f64)> {
        let attached = self
            .timeline_state(timeline)?
            .attached
            .iter()
            .find(|a| a.child == child)?;
        let controller = self.controller(child)?;
        Some((attached.start(controller), attached.end(controller)))
    }

    /// Resolve a placement against the timeline's last child and labels
    fn place(
        &self,
        timeline: ControllerId,
        placement: Option<&Placement>,
        item: Option<ControllerId>,
    ) -> f64 {
        let Some(node) = self.nodes.get(timeline) else {
            return 0.0;
        };
        let NodeKind::Timeline(state) = &node.kind else {
            return 0.0;
        };
        let previous = state
            .attached
            .last()
            .and_then(|a| self.controller(a.child).map(|c| (a, c)));
        let context = PlacementContext {
            previous_start: previous.map_or(0.0, |(a, c)| a.start(c)),
            previous_end: previous.map_or(0.0, |(a, c)| a.end(c)),
            previous_total: previous.map(|(_, c)| c.total_duration()),
            parent_duration: node.controller.duration(),
            item_total: item
                .and_then(|i| self.controller(i))
                .map(Controller::total_duration),
            labels: &state.labels,
        };
        context.place(placement)
    }

    /// Append `child` at its `at` option, or after the last child
    pub fn add(&mut self, timeline: ControllerId, child: ControllerId) {
        self.attach(timeline, child, None);
    }

    /// Append `child` at `placement`, e.g. `2.0`, `"<"` or `"intro+=0.5"`
    pub fn add_at(&mut self, timeline: ControllerId, child: ControllerId, placement: impl Into<Placement>) {
        self.attach(timeline, child, Some(placement.into()));
    }

    pub(crate) fn attach(&mut self, timeline: ControllerId, child: ControllerId, placement: Option<Placement>) {
        if timeline == child || self.timeline_state(timeline).is_none() {
            diagnostics::warn(WarningKind::InvalidOption, "children can only be added to a timeline");
            return;
        }
        let Some(controller) = self.controller(child) else {
            return;
        };
        if controller.parent().is_some() {
            diagnostics::warn(WarningKind::InvalidOption, "controller already belongs to a timeline");
            return;
        }

        let placement = placement.or_else(|| controller.options().at.clone());
        let (child_duration, child_repeat) = (controller.options().duration, controller.repeat());
        let start = self.place(timeline, placement.as_ref(), Some(child));

        let timeline_repeat = self.controller(timeline).map_or(0, Controller::repeat);
        if child_duration >= UNBOUNDED && (child_repeat != 0 || timeline_repeat != 0) {
            self.set_repeat(child, 0, true);
            self.set_repeat(timeline, 0, true);
        } else if timeline_repeat != 0 && child_repeat == -1 {
            self.set_repeat(timeline, 0, true);
        }

        if let Some(controller) = self.controller_mut(child) {
            controller.set_parent(Some(timeline));
        }
        self.pending.retain(|p| *p != child);
        if let Some(NodeKind::Timeline(state)) = self.nodes.get_mut(timeline).map(|n| &mut n.kind) {
            state.attached.push(Attached { child, time: start });
        }
        tracing::debug!(?timeline, ?child, start, "child placed");

        self.update_duration(timeline, false);
        let paused = self
            .controller(timeline)
            .map_or(true, |c| c.options().paused);
        if !paused {
            self.play(timeline);
        }
    }

    /// Detach `child`; the timeline keeps its duration
    pub fn remove(&mut self, timeline: ControllerId, child: ControllerId) {
        let Some(NodeKind::Timeline(state)) = self.nodes.get_mut(timeline).map(|n| &mut n.kind) else {
            return;
        };
        let before = state.attached.len();
        state.attached.retain(|a| a.child != child);
        if state.attached.len() != before {
            if let Some(controller) = self.controller_mut(child) {
                controller.set_parent(None);
            }
        }
    }

    /// Shrink the duration to the end of the last child
    pub fn crop_duration(&mut self, timeline: ControllerId) {
        self.update_duration(timeline, true);
    }

    fn update_duration(&mut self, timeline: ControllerId, crop: bool) {
        let Some(state) = self.timeline_state(timeline) else {
            return;
        };
        let mut duration = if crop {
            0.0
        } else {
            self.controller(timeline).map_or(0.0, Controller::duration)
        };
        for attached in &state.attached {
            if let Some(child) = self.controller(attached.child) {
                duration = duration.max(attached.end(child));
            }
        }
        self.set_duration(timeline, duration, false);
    }

    /// Name the time at the end of the last child
    pub fn label(&mut self, timeline: ControllerId, name: &str) {
        self.set_label(timeline, name, None);
    }

    pub fn label_at(&mut self, timeline: ControllerId, name: &str, placement: impl Into<Placement>) {
        self.set_label(timeline, name, Some(placement.into()));
    }

    fn set_label(&mut self, timeline: ControllerId, name: &str, placement: Option<Placement>) {
        if !is_label_name(name) {
            diagnostics::report(&KinemaError::InvalidLabel(name.to_string()));
            return;
        }
        let time = self.place(timeline, placement.as_ref(), None);
        if let Some(NodeKind::Timeline(state)) = self.nodes.get_mut(timeline).map(|n| &mut n.kind) {
            state.labels.insert(name.to_string(), time);
        }
    }

    /// Seek to a time or placement expression, e.g. `"mid"` or `"<"`
    pub fn seek_to(&mut self, timeline: ControllerId, placement: impl Into<Placement>) {
        let elapsed = match placement.into() {
            Placement::Time(t) => t,
            expr => self.place(timeline, Some(&expr), None),
        };
        self.seek(timeline, elapsed);
    }

    /// Propagate a new total progress to the children, then store it.
    ///
    /// Children are visited in order, or in reverse when the eased time
    /// runs backwards. A child is only touched once the eased time has
    /// passed its start (forward) or is before its end (backward). Child
    /// time runs at the child's time scale, so it finishes at its end.
    pub(crate) fn update_timeline(&mut self, id: ControllerId, total_progress: f64, events: bool) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let NodeKind::Timeline(state) = &node.kind else {
            return;
        };
        let controller = &node.controller;
        let total_progress = total_progress.clamp(0.0, 1.0);
        let eased_elapsed = controller.eased_progress_at(total_progress) * controller.duration();
        let reversed = (total_progress < controller.total_progress()) != controller.is_alternating();
        let pre_render = controller.pre_render();

        let mut attached = state.attached.clone();
        if reversed {
            attached.reverse();
        }

        for entry in attached {
            let Some(child) = self.controller(entry.child) else {
                continue;
            };
            let (start, end) = (entry.start(child), entry.end(child));
            let time_scale = child.time_scale();
            let reached = if reversed {
                eased_elapsed < end
            } else {
                eased_elapsed > start
            };
            if !(reached || pre_render) {
                continue;
            }
            let wrap_alternating = child.iteration() > 0 && child.is_alternating();
            if let Some(child) = self.controller_mut(entry.child) {
                child.mark_initialized();
            }
            if reached {
                if wrap_alternating {
                    self.update(entry.child, 1.0, eased_elapsed >= end);
                }
                self.set_total_elapsed(entry.child, (eased_elapsed - start) * time_scale);
            }
        }

        self.commit(id, total_progress, events);
    }

    // convenience

    /// Add a `to` tween, placed by its `at` option
    pub fn timeline_to(
        &mut self,
        timeline: ControllerId,
        targets: impl Into<Targets>,
        to: PropertyMap,
        options: ControllerOptions,
    ) -> ControllerId {
        let tween = self.to(targets, to, options);
        self.attach(timeline, tween, None);
        tween
    }

    pub fn timeline_from(
        &mut self,
        timeline: ControllerId,
        targets: impl Into<Targets>,
        from: PropertyMap,
        options: ControllerOptions,
    ) -> ControllerId {
        let tween = self.from(targets, from, options);
        self.attach(timeline, tween, None);
        tween
    }

    pub fn timeline_from_to(
        &mut self,
        timeline: ControllerId,
        targets: impl Into<Targets>,
        from: PropertyMap,
        to: PropertyMap,
        options: ControllerOptions,
    ) -> ControllerId {
        let tween = self.from_to(targets, from, to, options);
        self.attach(timeline, tween, None);
        tween
    }

    pub fn timeline_set(
        &mut self,
        timeline: ControllerId,
        targets: impl Into<Targets>,
        to: PropertyMap,
        options: ControllerOptions,
    ) -> ControllerId {
        let tween = self.set(targets, to, options);
        self.attach(timeline, tween, None);
        tween
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_core::diagnostics::{with_warning_sink, CollectingSink};
    use std::sync::Arc;

    fn animator() -> Animator {
        Animator::with_defaults(ControllerOptions::new().ease("linear"))
    }

    #[test]
    fn test_label_names() {
        assert!(is_label_name("intro"));
        assert!(is_label_name("part-2_b"));
        assert!(!is_label_name("2nd"));
        assert!(!is_label_name("a b"));
        assert!(!is_label_name(""));
    }

    #[test]
    fn test_sequential_placement() {
        let mut anim = animator();
        let tl = anim.timeline(ControllerOptions::new());
        let a = anim.create(ControllerOptions::new().duration(1.0));
        let b = anim.create(ControllerOptions::new().duration(2.0).delay(0.5));
        anim.add(tl, a);
        anim.add(tl, b);

        assert_eq!(anim.child_span(tl, a), Some((0.0, 1.0)));
        assert_eq!(anim.child_span(tl, b), Some((1.5, 3.5)));
        assert_eq!(anim.controller(tl).map(Controller::duration), Some(3.5));
        assert_eq!(anim.controller(a).and_then(Controller::parent), Some(tl));
    }

    #[test]
    fn test_invalid_label_is_reported() {
        let mut anim = animator();
        let tl = anim.timeline(ControllerOptions::new());
        let sink = Arc::new(CollectingSink::new());
        with_warning_sink(sink.clone(), || anim.label(tl, "1abc"));
        assert_eq!(sink.count(WarningKind::UnresolvedLabel), 1);
        assert!(anim.labels(tl).is_some_and(|l| l.is_empty()));
    }

    #[test]
    fn test_remove_keeps_duration_until_cropped() {
        let mut anim = animator();
        let tl = anim.timeline(ControllerOptions::new());
        let a = anim.create(ControllerOptions::new().duration(1.0));
        let b = anim.create(ControllerOptions::new().duration(1.0));
        anim.add(tl, a);
        anim.add(tl, b);
        anim.remove(tl, b);
        assert_eq!(anim.children(tl), vec![a]);
        assert_eq!(anim.controller(tl).map(Controller::duration), Some(2.0));
        assert_eq!(anim.controller(b).and_then(Controller::parent), None);

        anim.crop_duration(tl);
        assert_eq!(anim.controller(tl).map(Controller::duration), Some(1.0));
    }

    #[test]
    fn test_infinite_child_clears_timeline_repeat() {
        let mut anim = animator();
        let tl = anim.timeline(ControllerOptions::new().repeat(2));
        let child = anim.create(ControllerOptions::new().duration(1.0).repeat(-1));
        anim.add(tl, child);
        assert_eq!(anim.controller(tl).map(Controller::repeat), Some(0));
    }
}
