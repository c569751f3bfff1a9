//! Property unification
//!
//! Turns the loose from/to descriptors of a tween into token lists of equal
//! shape per property, so interpolation is a plain zip over numbers.
//!
//! Pipeline per tween: validate keys against the target, expand shorthands,
//! then unify every remaining key against the target's current value.

use indexmap::IndexMap;
use kinema_core::diagnostics;
use kinema_core::{KinemaError, WarningKind};

use crate::color::{color_tokens, is_color, resolve_color};
use crate::multi_value::{unify_corner_radius, unify_filters, unify_position, unify_shadows};
use crate::property::{camel_to_kebab, MultiValueKind, PropertyKind};
use crate::shorthand::expand_shorthand;
use crate::signed_number::SignedNumber;
use crate::target::StyleTarget;
use crate::token::Token;
use crate::units::UnitConverter;
use crate::value::{PropertyMap, PropertyValue};

/// Fallback, start and end tokens of one property
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyTriple {
    pub fallback: Vec<Token>,
    pub from: Vec<Token>,
    pub to: Vec<Token>,
}

/// Unified CSS (non-transform) properties of a tween
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnifiedProperties {
    pub css: IndexMap<String, PropertyTriple>,
    /// `autoHide` was requested
    pub auto_hide: bool,
}

/// Unifies values against one target
pub struct Unifier<'a> {
    target: &'a dyn StyleTarget,
}

impl<'a> Unifier<'a> {
    pub fn new(target: &'a dyn StyleTarget) -> Self {
        Self { target }
    }

    pub fn converter(&self) -> UnitConverter<'_> {
        UnitConverter::new(&self.target)
    }

    /// Color tokens for both sides; keyword colors go through the target
    pub fn color_pair(&self, from: &str, to: &str) -> (Vec<Token>, Vec<Token>) {
        let probe = |keyword: &str| self.target.probe_color(keyword);
        (
            color_tokens(resolve_color(from, &probe)),
            color_tokens(resolve_color(to, &probe)),
        )
    }

    /// Unify a single-valued property.
    ///
    /// Colors become `rgba(..)` tokens, signed numbers `[value, unit]`, and
    /// anything else a discrete one-token pair.
    pub fn unify_scalar(
        &self,
        property: &str,
        from: Option<&str>,
        to: Option<&str>,
        fallback: &str,
    ) -> (Vec<Token>, Vec<Token>) {
        let spacing = matches!(property, "letter-spacing" | "word-spacing");
        let normalize = |v: &str| {
            if spacing {
                v.replace("normal", "0px")
            } else {
                v.trim().to_string()
            }
        };
        let mut fallback = normalize(fallback);
        let mut from = from.map(normalize).unwrap_or_else(|| fallback.clone());
        let to = to.map(normalize).unwrap_or_else(|| from.clone());

        // no current value: start from the neutral value of the end's type
        if from.is_empty() {
            if SignedNumber::is_signable(&to) {
                from = "0".to_string();
                fallback = from.clone();
            } else if is_color(&to) {
                from = "transparent".to_string();
            }
        }

        if is_color(&from) || is_color(&to) {
            return self.color_pair(&from, &to);
        }
        if SignedNumber::is_signable(&from) {
            let fallback: SignedNumber = fallback.parse().unwrap_or_default();
            let start = SignedNumber::parse(&from);
            let end = SignedNumber::parse(&to);
            let (a, b) = self
                .converter()
                .resolve_endpoints(property, &fallback, Some(&start), Some(&end));
            return (
                vec![Token::Number(a.value), Token::Text(a.unit)],
                vec![Token::Number(b.value), Token::Text(b.unit)],
            );
        }
        (vec![Token::Text(from)], vec![Token::Text(to)])
    }

    /// Unify one property. Missing `from` takes the fallback, missing `to`
    /// takes `from`.
    pub fn unify_value(
        &self,
        key: &str,
        from: Option<&str>,
        to: Option<&str>,
        fallback: &str,
    ) -> (Vec<Token>, Vec<Token>) {
        let kind = PropertyKind::classify(key);
        let PropertyKind::MultiValue(multi) = kind else {
            return self.unify_scalar(&camel_to_kebab(key), from, to, fallback);
        };

        let from = from.unwrap_or(fallback);
        let to = to.unwrap_or(from);
        match multi {
            MultiValueKind::BoxShadow => unify_shadows(self, true, from, to),
            MultiValueKind::TextShadow => unify_shadows(self, false, from, to),
            MultiValueKind::Filter => unify_filters(self, from, to),
            MultiValueKind::BackgroundPosition | MultiValueKind::TransformOrigin => {
                unify_position(self, multi, from, to, fallback)
            }
            MultiValueKind::CornerRadius => unify_corner_radius(self, from, to, fallback),
        }
    }

    /// Validate, expand and unify every non-transform key of a tween.
    ///
    /// Keys the target does not have, or whose value it rejects, are dropped
    /// with a warning; the remaining keys are unaffected.
    pub fn unify_properties(&self, from: &PropertyMap, to: &PropertyMap) -> UnifiedProperties {
        let mut from = from.clone();
        let mut to = to.clone();
        let mut keys: Vec<String> = Vec::new();
        for key in from.keys().chain(to.keys()) {
            if !keys.contains(key) && !PropertyKind::classify(key).is_transform() {
                keys.push(key.clone());
            }
        }

        let mut unified = UnifiedProperties::default();
        for key in keys.clone() {
            let kind = PropertyKind::classify(&key);
            if kind == PropertyKind::AutoHide {
                if keys.iter().any(|k| k == "visibility") {
                    diagnostics::warn(
                        WarningKind::InvalidOption,
                        "remove `visibility` in order to use `autoHide`",
                    );
                }
                unified.auto_hide = to
                    .get(&key)
                    .or_else(|| from.get(&key))
                    .is_some_and(PropertyValue::is_truthy);
                keys.retain(|k| *k != key);
                continue;
            }

            if !self.target.has_property(&key) {
                diagnostics::report(&KinemaError::UnknownProperty(key.clone()));
                keys.retain(|k| *k != key);
                continue;
            }

            let sample = from
                .get(&key)
                .or_else(|| to.get(&key))
                .map(ToString::to_string)
                .unwrap_or_default();
            let kebab = camel_to_kebab(&key);
            if !self.target.supports_value(&kebab, &sample)
                && !self.target.supports_value(&kebab, &format!("{sample}px"))
            {
                diagnostics::report(&KinemaError::UnsupportedValue {
                    property: key.clone(),
                    value: sample,
                });
                keys.retain(|k| *k != key);
                continue;
            }

            if let PropertyKind::Composite(shorthand) = kind {
                for map in [&mut from, &mut to] {
                    let Some(value) = map.shift_remove(&key) else {
                        continue;
                    };
                    for (longhand, v) in expand_shorthand(shorthand, &key, &value.to_string()) {
                        if !keys.contains(&longhand) {
                            keys.push(longhand.clone());
                        }
                        map.insert(longhand, PropertyValue::Text(v));
                    }
                }
                keys.retain(|k| *k != key);
            }
        }

        for key in keys {
            let fallback = self.target.read_value(&key).unwrap_or_default();
            let start = from.get(&key).map(ToString::to_string);
            let end = to.get(&key).map(ToString::to_string);
            let (fallback_tokens, _) = self.unify_value(&key, None, None, &fallback);
            let (from_tokens, to_tokens) =
                self.unify_value(&key, start.as_deref(), end.as_deref(), &fallback);
            tracing::trace!(property = %key, "unified");
            unified.css.insert(
                key,
                PropertyTriple {
                    fallback: fallback_tokens,
                    from: from_tokens,
                    to: to_tokens,
                },
            );
        }
        unified
    }
}
