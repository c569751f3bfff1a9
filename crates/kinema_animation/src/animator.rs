//! Animator
//!
//! Owns every controller in a slot-map arena, the target registry and the
//! event dispatcher, and drives attached roots from [`Animator::tick`].
//!
//! Controllers are addressed by [`ControllerId`]. A timeline owns the list
//! of its attached children; a child's parent link is only a lookup key.
//! Controllers queue for auto-play on creation and start on the next tick
//! unless they are paused or have been attached to a parent by then.

use kinema_core::{
    ControllerEvent, ControllerId, ControllerObserver, EventContext, EventDispatcher, TargetId,
};
use kinema_style::{Fragment, StyleTarget};
use slotmap::SlotMap;

use crate::config::{global_defaults, AnimatorConfig};
use crate::controller::{Controller, PlayState};
use crate::options::{ControllerOptions, ResolvedOptions};
use crate::targets::{TargetRegistry, TargetResolver};
use crate::timeline::Timeline;
use crate::tween::Tween;

pub(crate) enum NodeKind {
    Plain,
    Timeline(Timeline),
    Tween(Tween),
}

pub(crate) struct Node {
    pub controller: Controller,
    pub kind: NodeKind,
}

/// Arena of controllers plus the frame driver
pub struct Animator {
    pub(crate) nodes: SlotMap<ControllerId, Node>,
    pub(crate) targets: TargetRegistry,
    dispatcher: EventDispatcher,
    defaults: ControllerOptions,
    pub(crate) pending: Vec<ControllerId>,
}

impl Animator {
    /// Animator using the process-wide defaults as they are now
    pub fn new() -> Self {
        Self::with_defaults(global_defaults())
    }

    /// Animator injecting `defaults` below every instance's options
    pub fn with_defaults(defaults: ControllerOptions) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            targets: TargetRegistry::new(),
            dispatcher: EventDispatcher::new(),
            defaults,
            pending: Vec::new(),
        }
    }

    /// Animator whose configured defaults sit on top of the process-wide ones
    pub fn from_config(config: &AnimatorConfig) -> Self {
        Self::with_defaults(global_defaults().merge(&config.defaults))
    }

    pub fn defaults(&self) -> &ControllerOptions {
        &self.defaults
    }

    // targets

    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut TargetRegistry {
        &mut self.targets
    }

    pub fn register_target(&mut self, target: impl StyleTarget + 'static) -> TargetId {
        self.targets.insert(Box::new(target))
    }

    pub fn register_named(&mut self, name: &str, target: impl StyleTarget + 'static) -> TargetId {
        self.targets.insert_named(name, Box::new(target))
    }

    pub fn target(&self, id: TargetId) -> Option<&dyn StyleTarget> {
        self.targets.get(id)
    }

    pub fn set_resolver(&mut self, resolver: impl TargetResolver + 'static) {
        self.targets.set_resolver(Box::new(resolver));
    }

    /// Last values written to a target
    pub fn fragment(&self, id: TargetId) -> Option<&Fragment> {
        self.targets.fragment(id)
    }

    // controllers

    pub fn controller(&self, id: ControllerId) -> Option<&Controller> {
        self.nodes.get(id).map(|node| &node.controller)
    }

    pub(crate) fn controller_mut(&mut self, id: ControllerId) -> Option<&mut Controller> {
        self.nodes.get_mut(id).map(|node| &mut node.controller)
    }

    pub fn contains(&self, id: ControllerId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn play_state(&self, id: ControllerId) -> Option<PlayState> {
        self.controller(id).map(Controller::play_state)
    }

    /// A bare controller with no target, useful as a clock
    pub fn create(&mut self, options: ControllerOptions) -> ControllerId {
        let resolved = self.defaults.merge(&options).resolve();
        self.insert(resolved, NodeKind::Plain, true)
    }

    pub(crate) fn insert(
        &mut self,
        options: ResolvedOptions,
        kind: NodeKind,
        queue: bool,
    ) -> ControllerId {
        let id = self.nodes.insert(Node {
            controller: Controller::new(options),
            kind,
        });
        if queue {
            self.pending.push(id);
        }
        id
    }

    /// Remove a controller and everything below it
    pub fn dispose(&mut self, id: ControllerId) {
        let Some(parent) = self.controller(id).map(Controller::parent) else {
            return;
        };
        if let Some(node) = parent.and_then(|p| self.nodes.get_mut(p)) {
            match &mut node.kind {
                NodeKind::Timeline(timeline) => timeline.attached.retain(|a| a.child != id),
                NodeKind::Tween(tween) if tween.inner == Some(id) => tween.inner = None,
                _ => {}
            }
        }
        self.drop_subtree(id);
    }

    fn drop_subtree(&mut self, id: ControllerId) {
        for child in self.children_of(id) {
            self.drop_subtree(child);
        }
        self.nodes.remove(id);
        self.dispatcher.remove(id);
        self.pending.retain(|p| *p != id);
    }

    /// Controllers driven by `id`: timeline children or a tween's inner
    /// timeline
    pub(crate) fn children_of(&self, id: ControllerId) -> Vec<ControllerId> {
        match self.nodes.get(id).map(|node| &node.kind) {
            Some(NodeKind::Timeline(timeline)) => timeline.attached.iter().map(|a| a.child).collect(),
            Some(NodeKind::Tween(tween)) => tween.inner.into_iter().collect(),
            _ => Vec::new(),
        }
    }

    // events

    /// Call `handler` whenever `id` fires `event`
    pub fn on<F>(&mut self, id: ControllerId, event: ControllerEvent, handler: F)
    where
        F: Fn(&EventContext) + Send + Sync + 'static,
    {
        self.dispatcher.register(id, event, handler);
    }

    /// Install the observer that sees every event, returning the previous one
    pub fn set_observer(
        &mut self,
        observer: impl ControllerObserver + 'static,
    ) -> Option<Box<dyn ControllerObserver>> {
        self.dispatcher.set_observer(Box::new(observer))
    }

    pub fn take_observer(&mut self) -> Option<Box<dyn ControllerObserver>> {
        self.dispatcher.take_observer()
    }

    // driver

    /// Advance every attached root by `dt` seconds.
    ///
    /// Controllers created since the last tick start first, so a fresh
    /// controller already moves on its first tick.
    pub fn tick(&mut self, dt: f64) {
        self.flush_pending();
        if !dt.is_finite() || dt < 0.0 {
            tracing::debug!(dt, "ignoring invalid frame delta");
            return;
        }

        let roots: Vec<ControllerId> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.controller.is_attached())
            .map(|(id, _)| id)
            .collect();
        for id in roots {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if !node.controller.is_attached() {
                continue;
            }
            if let Some(total_progress) = node.controller.advance(dt) {
                self.update(id, total_progress, true);
            }
        }
    }

    /// Whether any root is still attached; hosts stop scheduling frames
    /// when this turns false
    pub fn has_active(&self) -> bool {
        !self.pending.is_empty() || self.nodes.values().any(|node| node.controller.is_attached())
    }

    fn flush_pending(&mut self) {
        for id in std::mem::take(&mut self.pending) {
            let autoplay = self.controller(id).is_some_and(|c| {
                c.is_root() && !c.options().paused && c.is_playing()
            });
            if autoplay {
                self.play(id);
            }
        }
    }

    // progress updates

    /// Write a total progress, letting timelines and tweens propagate it
    pub(crate) fn update(&mut self, id: ControllerId, total_progress: f64, events: bool) {
        match self.nodes.get(id).map(|node| &node.kind) {
            Some(NodeKind::Plain) => self.commit(id, total_progress, events),
            Some(NodeKind::Timeline(_)) => self.update_timeline(id, total_progress, events),
            Some(NodeKind::Tween(_)) => self.update_tween(id, total_progress, events),
            None => {}
        }
    }

    /// Base update: store the playhead and dispatch what it fired
    pub(crate) fn commit(&mut self, id: ControllerId, total_progress: f64, events: bool) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let fired = node.controller.commit(total_progress, events);
        if fired.is_empty() {
            return;
        }
        let controller = &node.controller;
        let (total_progress, progress, iteration) = (
            controller.total_progress(),
            controller.progress(),
            controller.iteration(),
        );
        for event in fired {
            tracing::trace!(?id, %event, total_progress, "controller event");
            self.dispatcher.dispatch(&EventContext {
                id,
                event,
                total_progress,
                progress,
                iteration,
            });
        }
    }

    // playback

    pub fn play(&mut self, id: ControllerId) {
        self.start(id, false);
    }

    /// Play, then jump to `elapsed` seconds into the sequence
    pub fn play_from(&mut self, id: ControllerId, elapsed: f64) {
        if self.start(id, false) {
            self.seek(id, elapsed);
        }
    }

    pub fn reverse(&mut self, id: ControllerId) {
        self.start(id, true);
    }

    /// Start moving; children first. A no-op for a controller already at
    /// the far end of the direction.
    fn start(&mut self, id: ControllerId, reversed: bool) -> bool {
        for child in self.children_of(id) {
            self.start(child, reversed);
        }
        let Some(controller) = self.controller_mut(id) else {
            return false;
        };
        let far_end = if reversed { 0.0 } else { 1.0 };
        if controller.total_progress() == far_end {
            return false;
        }
        controller.begin(reversed);
        true
    }

    /// Stop and detach from the driver
    pub fn pause(&mut self, id: ControllerId) {
        if let Some(controller) = self.controller_mut(id) {
            controller.halt();
        }
        self.pending.retain(|p| *p != id);
    }

    /// Continue in the current direction
    pub fn resume(&mut self, id: ControllerId) {
        match self.controller(id).map(Controller::is_reversed) {
            Some(true) => self.reverse(id),
            Some(false) => self.play(id),
            None => {}
        }
    }

    pub fn restart(&mut self, id: ControllerId) {
        self.pause(id);
        self.set_total_progress(id, 0.0);
        self.play(id);
    }

    /// Back to the start, delay included, without changing play state
    pub fn reset(&mut self, id: ControllerId) {
        if let Some(controller) = self.controller_mut(id) {
            controller.set_delay_progress(0.0);
        }
        self.set_total_progress(id, 0.0);
    }

    /// Jump to `elapsed` seconds into the whole sequence
    pub fn seek(&mut self, id: ControllerId, elapsed: f64) {
        self.set_total_elapsed(id, elapsed);
    }

    pub fn complete(&mut self, id: ControllerId) {
        self.set_total_progress(id, 1.0);
    }

    /// Jump to the same position in the last iteration of the current
    /// direction
    pub fn last_play(&mut self, id: ControllerId) {
        let Some(controller) = self.controller(id) else {
            return;
        };
        let iteration = if controller.is_reversed() {
            0
        } else {
            controller.repeat_count()
        };
        self.set_iteration(id, iteration, true);
    }

    // setters

    pub fn set_total_progress(&mut self, id: ControllerId, total_progress: f64) {
        self.update(id, total_progress, true);
    }

    pub fn set_total_elapsed(&mut self, id: ControllerId, total_elapsed: f64) {
        if let Some(total_progress) = self
            .controller(id)
            .map(|c| c.total_progress_for_elapsed(total_elapsed))
        {
            self.set_total_progress(id, total_progress);
        }
    }

    /// Move within the current iteration
    pub fn set_progress(&mut self, id: ControllerId, progress: f64) {
        if let Some(total_elapsed) = self
            .controller(id)
            .map(|c| c.total_elapsed_for_progress(progress))
        {
            self.set_total_elapsed(id, total_elapsed);
        }
    }

    pub fn set_elapsed(&mut self, id: ControllerId, elapsed: f64) {
        let Some(duration) = self.controller(id).map(Controller::duration) else {
            return;
        };
        let progress = if duration == 0.0 {
            elapsed
        } else {
            elapsed / duration
        };
        self.set_progress(id, progress);
    }

    /// Change the iteration duration; without `keep_progress` the elapsed
    /// time in the current iteration is kept instead
    pub fn set_duration(&mut self, id: ControllerId, duration: f64, keep_progress: bool) {
        let Some(controller) = self.controller(id) else {
            return;
        };
        if !keep_progress && duration > 0.0 {
            let progress = controller.progress() / duration * controller.duration();
            self.set_progress(id, progress);
        }
        if let Some(controller) = self.controller_mut(id) {
            controller.store_duration(duration);
        }
    }

    /// Change the start delay. `restart` defaults to restarting a delay
    /// that has not finished yet
    pub fn set_delay(&mut self, id: ControllerId, delay: f64, restart: Option<bool>) {
        if let Some(controller) = self.controller_mut(id) {
            controller.set_delay(delay, restart);
        }
    }

    pub fn set_delay_progress(&mut self, id: ControllerId, progress: f64) {
        if let Some(controller) = self.controller_mut(id) {
            controller.set_delay_progress(progress);
        }
    }

    pub fn set_delay_elapsed(&mut self, id: ControllerId, elapsed: f64) {
        if let Some(controller) = self.controller_mut(id) {
            controller.set_delay_elapsed(elapsed);
        }
    }

    /// Change the repeat count, staying at the same iteration and progress.
    /// Without `keep_iterations` the controller returns to the first
    /// iteration.
    pub fn set_repeat(&mut self, id: ControllerId, repeat: i32, keep_iterations: bool) {
        let Some(controller) = self.controller(id) else {
            return;
        };
        let (iteration, progress) = (controller.iteration(), controller.progress());
        if let Some(controller) = self.controller_mut(id) {
            controller.store_repeat(repeat);
        }
        self.set_iteration(id, iteration, true);
        self.set_progress(id, progress);
        if !keep_iterations {
            self.set_iteration(id, 0, true);
        }
        if repeat >= 0 && iteration > repeat as u64 {
            self.set_total_progress(id, 1.0);
        }
    }

    /// Toggle alternation. With `smooth_jump` the pose does not change when
    /// the current iteration flips direction.
    pub fn set_alternate(&mut self, id: ControllerId, alternate: bool, smooth_jump: bool) {
        let Some(controller) = self.controller_mut(id) else {
            return;
        };
        if controller.alternate() == alternate {
            return;
        }
        let was_alternating = controller.is_alternating();
        controller.store_alternate(alternate);
        if smooth_jump && was_alternating != controller.is_alternating() {
            let progress = controller.progress();
            self.set_progress(id, 1.0 - progress);
        }
    }

    /// Jump to `iteration`, keeping the local position
    pub fn set_iteration(&mut self, id: ControllerId, iteration: u64, smooth_jump: bool) {
        let Some(controller) = self.controller(id) else {
            return;
        };
        if smooth_jump && controller.alternate() && controller.iteration() % 2 != iteration % 2 {
            let progress = controller.progress();
            self.set_progress(id, 1.0 - progress);
        }
        if let Some(total_elapsed) = self
            .controller(id)
            .map(|c| c.total_elapsed_for_iteration(iteration))
        {
            self.set_total_elapsed(id, total_elapsed);
        }
    }

    pub fn set_iteration_delay(&mut self, id: ControllerId, delay: f64) {
        let Some(controller) = self.controller(id) else {
            return;
        };
        let (iteration, progress) = (controller.iteration(), controller.progress());
        if let Some(controller) = self.controller_mut(id) {
            controller.store_iteration_delay(delay);
        }
        self.set_iteration(id, iteration, true);
        self.set_progress(id, progress);
    }

    pub fn set_time_scale(&mut self, id: ControllerId, scale: f64) {
        if let Some(controller) = self.controller_mut(id) {
            controller.set_time_scale(scale);
        }
    }

    pub fn set_reversed(&mut self, id: ControllerId, reversed: bool) {
        if let Some(controller) = self.controller_mut(id) {
            controller.set_reversed(reversed);
        }
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}
