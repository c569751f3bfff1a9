//! Property-set evaluation
//!
//! [`PropertySet::read`] unifies a tween's descriptors against a target once;
//! [`PropertySet::sample`] then maps any progress to concrete value strings.
//! A [`Fragment`] accumulates the latest values per target and writes them.

use indexmap::IndexMap;

use crate::signed_number::SignedNumber;
use crate::target::StyleTarget;
use crate::token::{lerp_tokens, render_tokens, round_to};
use crate::transform::{build_transform_string, decompose_matrix, unify_transforms, TransformChannel, TransformTriple};
use crate::unify::{PropertyTriple, Unifier};
use crate::value::PropertyMap;

/// Unified start/end state of one tween on one target
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertySet {
    pub transforms: TransformTriple,
    pub css: IndexMap<String, PropertyTriple>,
    pub auto_hide: bool,
}

/// Values of a property set at one progress
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameValues {
    pub transform: IndexMap<TransformChannel, String>,
    pub css: IndexMap<String, String>,
    pub auto_hide: bool,
}

impl PropertySet {
    /// Read the target's current state and unify `from`/`to` against it
    pub fn read(target: &dyn StyleTarget, from: &PropertyMap, to: &PropertyMap) -> Self {
        let unifier = Unifier::new(target);
        let transforms = unify_transforms(&unifier.converter(), &target.transform_matrix(), from, to);
        let unified = unifier.unify_properties(from, to);
        tracing::debug!(
            transforms = transforms.from.len(),
            css = unified.css.len(),
            "property set read"
        );
        Self {
            transforms,
            css: unified.css,
            auto_hide: unified.auto_hide,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty() && self.css.is_empty() && !self.auto_hide
    }

    /// Values at `progress` (already eased).
    ///
    /// At the start side (0, or 1 when `backwards`) transforms show the
    /// target's own state unless `pre_render` is set; CSS values always
    /// interpolate.
    pub fn sample(&self, progress: f64, backwards: bool, pre_render: bool) -> FrameValues {
        let start_side = if backwards { 1.0 } else { 0.0 };
        let untouched = round_to(progress, 4) == start_side && !pre_render;

        let transform = self
            .transforms
            .from
            .iter()
            .map(|(channel, from)| {
                let tokens = match (untouched, self.transforms.fallback.get(channel)) {
                    (true, Some(fallback)) => fallback.clone(),
                    _ => {
                        let to = self.transforms.to.get(channel).unwrap_or(from);
                        lerp_tokens(from, to, progress)
                    }
                };
                (*channel, render_tokens(&tokens))
            })
            .collect();

        let css = self
            .css
            .iter()
            .map(|(key, triple)| {
                let tokens = lerp_tokens(&triple.from, &triple.to, progress);
                (key.clone(), render_tokens(&tokens))
            })
            .collect();

        FrameValues {
            transform,
            css,
            auto_hide: self.auto_hide,
        }
    }
}

/// Last-known values of one target
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fragment {
    base: IndexMap<TransformChannel, String>,
    transform: IndexMap<TransformChannel, String>,
    css: IndexMap<String, String>,
    auto_hide: bool,
}

impl Fragment {
    /// Start from the target's decomposed transform
    pub fn new(target: &dyn StyleTarget) -> Self {
        let base = decompose_matrix(&target.transform_matrix())
            .channels()
            .into_iter()
            .map(|(channel, n)| (channel, n.to_string()))
            .collect();
        Self {
            base,
            ..Self::default()
        }
    }

    pub fn merge(&mut self, frame: &FrameValues) {
        for (channel, value) in &frame.transform {
            self.transform.insert(*channel, value.clone());
        }
        for (key, value) in &frame.css {
            self.css.insert(key.clone(), value.clone());
        }
        self.auto_hide |= frame.auto_hide;
    }

    pub fn css_value(&self, key: &str) -> Option<&str> {
        self.css.get(key).map(String::as_str)
    }

    /// Transform string from the base decomposition overlaid with updates,
    /// `None` when no transform channel was ever animated
    pub fn transform_string(&self) -> Option<String> {
        if self.transform.is_empty() {
            return None;
        }
        let mut channels = self.base.clone();
        for (channel, value) in &self.transform {
            channels.insert(*channel, value.clone());
        }
        Some(build_transform_string(&channels))
    }

    /// Write everything to the target
    pub fn apply(&self, target: &mut dyn StyleTarget) {
        for (key, value) in &self.css {
            target.apply_value(key, value);
        }
        if self.auto_hide {
            if let Some(opacity) = self.css.get("opacity") {
                let hidden = opacity
                    .parse::<SignedNumber>()
                    .is_ok_and(|n| n.value == 0.0);
                target.apply_value("visibility", if hidden { "hidden" } else { "visible" });
            }
        }
        if let Some(transform) = self.transform_string() {
            target.apply_value("transform", &transform);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryTarget;
    use crate::value::{property_map, PropertyValue};
    use kinema_core::Mat4;

    #[test]
    fn test_sample_css_and_transform() {
        let target = MemoryTarget::new().with_value("opacity", "1");
        let to = property_map([("opacity", PropertyValue::from(0.0)), ("x", 100.0.into())]);
        let set = PropertySet::read(&target, &PropertyMap::new(), &to);

        let mid = set.sample(0.5, false, false);
        assert_eq!(mid.css["opacity"], "0.5");
        assert_eq!(mid.transform[&TransformChannel::TranslateX], "50px");
    }

    #[test]
    fn test_transform_fallback_at_start() {
        let target = MemoryTarget::new().with_matrix(Mat4::translation(20.0, 0.0, 0.0));
        let from = property_map([("x", 0.0)]);
        let to = property_map([("x", 100.0)]);
        let set = PropertySet::read(&target, &from, &to);

        assert_eq!(set.sample(0.0, false, false).transform[&TransformChannel::TranslateX], "20px");
        assert_eq!(set.sample(0.0, false, true).transform[&TransformChannel::TranslateX], "0px");
        assert_eq!(set.sample(1.0, true, false).transform[&TransformChannel::TranslateX], "20px");
    }

    #[test]
    fn test_fragment_apply() {
        let mut target = MemoryTarget::new().with_value("opacity", "1");
        let to = property_map([
            ("opacity", PropertyValue::from(0.0)),
            ("autoHide", true.into()),
            ("rotate", 90.0.into()),
        ]);
        let set = PropertySet::read(&target, &PropertyMap::new(), &to);
        let mut fragment = Fragment::new(&target);
        fragment.merge(&set.sample(1.0, false, false));
        fragment.apply(&mut target);

        assert_eq!(target.value("opacity"), Some("0"));
        assert_eq!(target.value("visibility"), Some("hidden"));
        assert_eq!(target.value("transform"), Some("rotate(90deg)"));
    }

    #[test]
    fn test_fragment_without_transform_leaves_it() {
        let mut target = MemoryTarget::new();
        let to = property_map([("width", "200px")]);
        let set = PropertySet::read(&target, &PropertyMap::new(), &to);
        let mut fragment = Fragment::new(&target);
        fragment.merge(&set.sample(1.0, false, false));
        fragment.apply(&mut target);

        assert_eq!(target.value("width"), Some("200px"));
        assert_eq!(target.value("transform"), None);
    }
}
