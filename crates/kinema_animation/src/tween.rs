//! Tweens
//!
//! A tween is a controller bound to one target. On its first progress
//! update it unifies its `from`/`to` descriptors against the target into a
//! [`PropertySet`]; every update after that samples the set at the eased
//! progress and writes the result through the target's shared fragment.
//!
//! Tweens over several targets become a stagger timeline of one child per
//! target, and the `keyframes` option becomes a timeline of segment tweens.
//! Either inner timeline is driven with the tween's un-eased local progress.

use kinema_core::diagnostics;
use kinema_core::{ControllerId, KinemaError, TargetId};
use kinema_style::token::round_to;
use kinema_style::{Fragment, PropertyMap, PropertySet};

use crate::animator::{Animator, NodeKind};
use crate::easing::Easing;
use crate::keyframe::{KeyframeSource, Keyframes};
use crate::options::ControllerOptions;
use crate::stagger::distribute;
use crate::targets::Targets;

#[derive(Clone, Debug, Default)]
pub struct Tween {
    pub(crate) target: Option<TargetId>,
    pub(crate) from: PropertyMap,
    pub(crate) to: PropertyMap,
    pub(crate) properties: Option<PropertySet>,
    pub(crate) inner: Option<ControllerId>,
}

impl Tween {
    fn new(from: PropertyMap, to: PropertyMap) -> Self {
        Self {
            from,
            to,
            ..Self::default()
        }
    }

    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    pub fn from_values(&self) -> &PropertyMap {
        &self.from
    }

    pub fn to_values(&self) -> &PropertyMap {
        &self.to
    }

    /// Unified values, once the tween has been updated
    pub fn properties(&self) -> Option<&PropertySet> {
        self.properties.as_ref()
    }

    /// Stagger or keyframe timeline driven by this tween
    pub fn inner(&self) -> Option<ControllerId> {
        self.inner
    }
}

impl Animator {
    /// Animate from the targets' current values to `to`
    pub fn to(
        &mut self,
        targets: impl Into<Targets>,
        to: PropertyMap,
        options: ControllerOptions,
    ) -> ControllerId {
        self.build_tween(targets.into(), PropertyMap::new(), to, &options)
    }

    /// Animate from `from` to the targets' current values.
    ///
    /// Renders the start state immediately unless `pre_render` is disabled.
    pub fn from(
        &mut self,
        targets: impl Into<Targets>,
        from: PropertyMap,
        options: ControllerOptions,
    ) -> ControllerId {
        let backwards = options.backwards.unwrap_or(false);
        let options = ControllerOptions::new()
            .pre_render(true)
            .merge(&options)
            .backwards(!backwards);
        self.build_tween(targets.into(), PropertyMap::new(), from, &options)
    }

    pub fn from_to(
        &mut self,
        targets: impl Into<Targets>,
        from: PropertyMap,
        to: PropertyMap,
        options: ControllerOptions,
    ) -> ControllerId {
        let options = ControllerOptions::new().pre_render(true).merge(&options);
        self.build_tween(targets.into(), from, to, &options)
    }

    /// Jump to `to` on the first tick
    pub fn set(
        &mut self,
        targets: impl Into<Targets>,
        to: PropertyMap,
        options: ControllerOptions,
    ) -> ControllerId {
        self.build_tween(targets.into(), PropertyMap::new(), to, &options.duration(0.0))
    }

    pub fn tween_state(&self, id: ControllerId) -> Option<&Tween> {
        match self.nodes.get(id).map(|node| &node.kind) {
            Some(NodeKind::Tween(tween)) => Some(tween),
            _ => None,
        }
    }

    fn tween_mut(&mut self, id: ControllerId) -> Option<&mut Tween> {
        match self.nodes.get_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Tween(tween)) => Some(tween),
            _ => None,
        }
    }

    pub(crate) fn build_tween(
        &mut self,
        targets: Targets,
        from: PropertyMap,
        to: PropertyMap,
        options: &ControllerOptions,
    ) -> ControllerId {
        let resolved = self.defaults().merge(options).resolve();
        let pre_render = resolved.pre_render;
        let keyframes = resolved.keyframes.clone();
        let ids = self.targets.resolve(&targets);
        let id = self.insert(resolved, NodeKind::Tween(Tween::new(from, to)), true);

        match ids.as_slice() {
            [] => {
                diagnostics::report(&KinemaError::TargetNotFound(targets.to_string()));
                return id;
            }
            [target] => {
                if let Some(tween) = self.tween_mut(id) {
                    tween.target = Some(*target);
                }
                if let Some(keyframes) = keyframes {
                    self.build_keyframes(id, *target, &keyframes);
                }
                self.targets.ensure_fragment(*target);
            }
            many => self.build_stagger(id, many, options),
        }
        tracing::debug!(?id, targets = ids.len(), "tween created");

        if pre_render {
            self.update(id, 0.0, true);
        }
        id
    }

    /// One child tween per target, offset by the stagger distribution
    fn build_stagger(&mut self, id: ControllerId, targets: &[TargetId], options: &ControllerOptions) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let NodeKind::Tween(tween) = &node.kind else {
            return;
        };
        let resolved = node.controller.options().clone();
        let (from, to) = (tween.from.clone(), tween.to.clone());
        let stagger = resolved.stagger.clone().unwrap_or_default();

        let centers: Vec<Option<(f64, f64)>> =
            targets.iter().map(|t| self.targets.center(*t)).collect();
        let offsets = distribute(&stagger, &centers);

        let mut timeline_options =
            ControllerOptions::new().ease(stagger.ease.clone().unwrap_or(Easing::Linear));
        timeline_options.alternate_ease = stagger.alternate_ease.clone();
        let inner = self.insert_timeline(&timeline_options, Some(id));

        for (target, offset) in targets.iter().zip(offsets) {
            let mut child_options = ControllerOptions {
                id: None,
                stagger: None,
                ..options.clone()
            }
            .duration(resolved.duration)
            .ease(resolved.ease.clone())
            .repeat(stagger.repeat.unwrap_or(0))
            .iteration_delay(stagger.iteration_delay.unwrap_or(0.0))
            .alternate(stagger.alternate.unwrap_or(false))
            .pre_render(resolved.pre_render)
            .delay(0.0)
            .time_scale(1.0)
            .at(round_to(offset, 4));
            child_options.alternate_ease = resolved.alternate_ease.clone();

            let child = self.build_tween(Targets::Id(*target), from.clone(), to.clone(), &child_options);
            self.attach(inner, child, None);
        }

        let duration = self.controller(inner).map_or(0.0, |c| c.duration());
        if let Some(controller) = self.controller_mut(id) {
            controller.store_duration(duration);
        }
        if let Some(tween) = self.tween_mut(id) {
            tween.to.clear();
            tween.inner = Some(inner);
        }
    }

    /// One segment tween per keyframe step on an inner timeline
    fn build_keyframes(&mut self, id: ControllerId, target: TargetId, keyframes: &Keyframes) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let NodeKind::Tween(tween) = &node.kind else {
            return;
        };
        let controller = &node.controller;
        let plan = keyframes.plan(&KeyframeSource {
            duration: controller.duration(),
            ease: controller.ease(),
            pre_render: controller.pre_render(),
            from: &tween.from,
            to: &tween.to,
        });

        let inner = self.insert_timeline(&ControllerOptions::new().ease(plan.ease), Some(id));
        for segment in plan.segments {
            let options = ControllerOptions {
                ease: segment.ease,
                ..ControllerOptions::new()
            }
            .duration(segment.duration)
            .pre_render(segment.pre_render)
            .at(segment.at);
            let child = self.build_tween(Targets::Id(target), segment.from, segment.to, &options);
            self.attach(inner, child, None);
        }
        if let Some(duration) = plan.duration {
            self.set_duration(inner, duration, true);
        }
        if let Some(tween) = self.tween_mut(id) {
            tween.inner = Some(inner);
        }
    }

    /// Store the playhead, render the target, then drive the inner timeline
    pub(crate) fn update_tween(&mut self, id: ControllerId, total_progress: f64, events: bool) {
        let total_progress = round_to(total_progress.clamp(0.0, 1.0), 10);
        self.commit(id, total_progress, events);
        self.render(id, total_progress);

        let inner = self.tween_state(id).and_then(Tween::inner);
        let progress = self.controller(id).map(|c| c.progress_at(total_progress));
        if let (Some(inner), Some(progress)) = (inner, progress) {
            self.update(inner, progress, true);
        }
    }

    fn render(&mut self, id: ControllerId, total_progress: f64) {
        let Self { nodes, targets, .. } = self;
        let Some(node) = nodes.get_mut(id) else {
            return;
        };
        let NodeKind::Tween(tween) = &mut node.kind else {
            return;
        };
        let Some(entry) = tween.target.and_then(|t| targets.entries.get_mut(t)) else {
            return;
        };

        let properties = tween
            .properties
            .get_or_insert_with(|| PropertySet::read(entry.target.as_ref(), &tween.from, &tween.to));
        if properties.is_empty() {
            return;
        }
        let controller = &node.controller;
        let frame = properties.sample(
            controller.eased_progress_at(total_progress),
            controller.backwards(),
            controller.pre_render(),
        );

        let fragment = entry
            .fragment
            .get_or_insert_with(|| Fragment::new(entry.target.as_ref()));
        fragment.merge(&frame);
        fragment.apply(entry.target.as_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_core::diagnostics::{with_warning_sink, CollectingSink};
    use kinema_core::WarningKind;
    use kinema_style::property_map;
    use kinema_style::testing::MemoryTarget;
    use std::sync::Arc;

    fn animator() -> Animator {
        Animator::with_defaults(ControllerOptions::new().ease("linear"))
    }

    fn value(anim: &Animator, target: TargetId, property: &str) -> Option<String> {
        anim.target(target).and_then(|t| t.read_value(property))
    }

    #[test]
    fn test_to_interpolates_on_tick() {
        let mut anim = animator();
        let box_ = anim.register_target(MemoryTarget::new().with_value("opacity", "1"));
        let tween = anim.to(box_, property_map([("opacity", 0.0)]), ControllerOptions::new());
        assert!(anim.tween_state(tween).is_some_and(|t| t.properties().is_none()));

        anim.tick(0.5);
        assert_eq!(value(&anim, box_, "opacity").as_deref(), Some("0.5"));
        assert_eq!(anim.fragment(box_).and_then(|f| f.css_value("opacity")), Some("0.5"));

        anim.tick(0.5);
        assert_eq!(value(&anim, box_, "opacity").as_deref(), Some("0"));
    }

    #[test]
    fn test_from_renders_start_immediately() {
        let mut anim = animator();
        let box_ = anim.register_target(MemoryTarget::new().with_value("opacity", "1"));
        anim.from(box_, property_map([("opacity", 0.0)]), ControllerOptions::new());
        assert_eq!(value(&anim, box_, "opacity").as_deref(), Some("0"));

        anim.tick(1.0);
        assert_eq!(value(&anim, box_, "opacity").as_deref(), Some("1"));
    }

    #[test]
    fn test_set_jumps_on_first_frame() {
        let mut anim = animator();
        let box_ = anim.register_target(MemoryTarget::new().with_value("width", "100px"));
        let tween = anim.set(box_, property_map([("width", "200px")]), ControllerOptions::new());
        assert_eq!(anim.controller(tween).map(|c| c.duration()), Some(0.0));

        anim.tick(0.016);
        assert_eq!(value(&anim, box_, "width").as_deref(), Some("200px"));
    }

    #[test]
    fn test_missing_target_is_reported() {
        let mut anim = animator();
        let sink = Arc::new(CollectingSink::new());
        let tween = with_warning_sink(sink.clone(), || {
            anim.to("#nothing", property_map([("opacity", 0.0)]), ControllerOptions::new())
        });
        assert_eq!(sink.count(WarningKind::TargetNotFound), 1);
        assert!(anim.contains(tween));
        assert!(anim.tween_state(tween).is_some_and(|t| t.target().is_none()));
    }
}
