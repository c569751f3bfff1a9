//! Unit conversion
//!
//! Converting between units needs live measurements of the target (its box,
//! its parent's box, font sizes, the viewport). The host supplies those
//! through [`LengthContext`]; [`UnitConverter`] does the arithmetic.

use kinema_core::diagnostics;
use kinema_core::{KinemaError, Result};

use crate::property::camel_to_kebab;
use crate::signed_number::SignedNumber;

/// Live measurements of a target, in px
pub trait LengthContext {
    fn element_width(&self) -> f64;
    fn element_height(&self) -> f64;
    fn parent_width(&self) -> f64;
    fn parent_height(&self) -> f64;
    fn root_font_size(&self) -> f64;
    fn element_font_size(&self) -> f64;
    fn viewport_width(&self) -> f64;
    fn viewport_height(&self) -> f64;
}

impl<T: LengthContext + ?Sized> LengthContext for &T {
    fn element_width(&self) -> f64 {
        (**self).element_width()
    }
    fn element_height(&self) -> f64 {
        (**self).element_height()
    }
    fn parent_width(&self) -> f64 {
        (**self).parent_width()
    }
    fn parent_height(&self) -> f64 {
        (**self).parent_height()
    }
    fn root_font_size(&self) -> f64 {
        (**self).root_font_size()
    }
    fn element_font_size(&self) -> f64 {
        (**self).element_font_size()
    }
    fn viewport_width(&self) -> f64 {
        (**self).viewport_width()
    }
    fn viewport_height(&self) -> f64 {
        (**self).viewport_height()
    }
}

/// Fixed measurements for headless hosts
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedLengths {
    pub element: (f64, f64),
    pub parent: (f64, f64),
    pub root_font_size: f64,
    pub font_size: f64,
    pub viewport: (f64, f64),
}

impl Default for FixedLengths {
    fn default() -> Self {
        Self {
            element: (100.0, 100.0),
            parent: (1000.0, 800.0),
            root_font_size: 16.0,
            font_size: 16.0,
            viewport: (1920.0, 1080.0),
        }
    }
}

impl LengthContext for FixedLengths {
    fn element_width(&self) -> f64 {
        self.element.0
    }
    fn element_height(&self) -> f64 {
        self.element.1
    }
    fn parent_width(&self) -> f64 {
        self.parent.0
    }
    fn parent_height(&self) -> f64 {
        self.parent.1
    }
    fn root_font_size(&self) -> f64 {
        self.root_font_size
    }
    fn element_font_size(&self) -> f64 {
        self.font_size
    }
    fn viewport_width(&self) -> f64 {
        self.viewport.0
    }
    fn viewport_height(&self) -> f64 {
        self.viewport.1
    }
}

/// Which conversion table applies to a property
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitCategory {
    /// deg, rad, grad, turn
    Angle,
    /// px and everything convertible to px
    Length,
    /// unitless fraction or percent
    Ratio,
    /// unitless only
    Number,
}

impl UnitCategory {
    /// Category of a property given in camelCase or kebab-case.
    ///
    /// The pseudo-properties `elw`/`elh` measure against the element's own
    /// width/height and the empty name is a plain length.
    pub fn of(property: &str) -> Option<UnitCategory> {
        let p = camel_to_kebab(property);
        let p = p.as_str();
        match p {
            "rotate" | "rotation" | "rotate-x" | "rotate-y" | "rotate-z" | "rotation-x"
            | "rotation-y" | "rotation-z" | "skew" | "skew-x" | "skew-y" | "hue-rotate" => {
                Some(UnitCategory::Angle)
            }
            "opacity" | "fill-opacity" | "stroke-opacity" | "flood-opacity" | "stop-opacity"
            | "brightness" | "contrast" | "saturate" | "grayscale" | "invert" | "sepia" => {
                Some(UnitCategory::Ratio)
            }
            "scale" | "scale-x" | "scale-y" | "scale-z" | "z-index" | "flex-grow"
            | "flex-shrink" | "order" | "font-weight" | "zoom" | "column-count" | "orphans"
            | "widows" => Some(UnitCategory::Number),
            _ if is_length_property(p) => Some(UnitCategory::Length),
            _ => None,
        }
    }

    pub fn default_unit(&self) -> &'static str {
        match self {
            UnitCategory::Angle => "deg",
            UnitCategory::Length => "px",
            UnitCategory::Ratio | UnitCategory::Number => "",
        }
    }
}

fn is_length_property(p: &str) -> bool {
    matches!(
        p,
        "" | "elw"
            | "elh"
            | "x"
            | "y"
            | "z"
            | "width"
            | "height"
            | "top"
            | "right"
            | "bottom"
            | "left"
            | "gap"
            | "font-size"
            | "line-height"
            | "text-indent"
            | "perspective"
            | "flex-basis"
            | "blur"
            | "inset"
    ) || p.starts_with("translate")
        || p.starts_with("margin")
        || p.starts_with("padding")
        || p.starts_with("inset-")
        || p.starts_with("scroll-margin")
        || p.starts_with("scroll-padding")
        || p.starts_with("background-position-")
        || p.ends_with("-width")
        || p.ends_with("-height")
        || p.ends_with("-radius")
        || p.ends_with("-spacing")
        || p.ends_with("-offset")
        || p.ends_with("-gap")
}

/// Reference dimension for `%` on a property
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PercentBasis {
    ElementWidth,
    ElementHeight,
    ParentWidth,
    ParentHeight,
    RootFont,
    ElementFont,
    Unit,
}

impl PercentBasis {
    fn of(kebab: &str) -> PercentBasis {
        match kebab {
            "elw" | "x" => PercentBasis::ElementWidth,
            "elh" | "y" => PercentBasis::ElementHeight,
            "width" | "min-width" | "max-width" | "column-width" | "left" | "right"
            | "text-indent" | "gap" | "column-gap" => PercentBasis::ParentWidth,
            "height" | "min-height" | "max-height" | "top" | "bottom" | "row-gap" => {
                PercentBasis::ParentHeight
            }
            "font-size" => PercentBasis::RootFont,
            "line-height" => PercentBasis::ElementFont,
            k if k.ends_with("-x") => PercentBasis::ElementWidth,
            k if k.ends_with("-y") => PercentBasis::ElementHeight,
            k if k.starts_with("margin") || k.starts_with("padding") => PercentBasis::ParentWidth,
            _ => PercentBasis::Unit,
        }
    }
}

/// Degrees per unit
pub fn angle_factor(unit: &str) -> Option<f64> {
    match unit {
        "deg" => Some(1.0),
        "rad" => Some(180.0 / std::f64::consts::PI),
        "grad" => Some(0.9),
        "turn" => Some(360.0),
        _ => None,
    }
}

/// Converts signed numbers between units for one target
pub struct UnitConverter<'a> {
    ctx: &'a dyn LengthContext,
}

impl<'a> UnitConverter<'a> {
    pub fn new(ctx: &'a dyn LengthContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &'a dyn LengthContext {
        self.ctx
    }

    /// Pixels per `unit` for `property`
    pub fn length_factor(&self, property: &str, unit: &str) -> Option<f64> {
        let ctx = self.ctx;
        let vw = ctx.viewport_width() / 100.0;
        let vh = ctx.viewport_height() / 100.0;
        let factor = match unit {
            "px" => 1.0,
            "%" => {
                let basis = match PercentBasis::of(&camel_to_kebab(property)) {
                    PercentBasis::ElementWidth => ctx.element_width(),
                    PercentBasis::ElementHeight => ctx.element_height(),
                    PercentBasis::ParentWidth => ctx.parent_width(),
                    PercentBasis::ParentHeight => ctx.parent_height(),
                    PercentBasis::RootFont => ctx.root_font_size(),
                    PercentBasis::ElementFont => ctx.element_font_size(),
                    PercentBasis::Unit => 1.0,
                };
                basis / 100.0
            }
            "rem" => ctx.root_font_size(),
            "em" => ctx.element_font_size(),
            "cm" => 37.8,
            "mm" => 3.78,
            "Q" => 0.945,
            "in" => 96.0,
            "pc" => 16.0,
            "pt" => 1.333,
            "ex" => ctx.element_font_size() * 0.5,
            "ch" => ctx.element_font_size() * 0.6,
            "vmin" => vw.min(vh),
            "vmax" => vw.max(vh),
            "vw" | "svw" | "lvw" | "dvw" | "vi" => vw,
            "vh" | "svh" | "lvh" | "dvh" | "vb" => vh,
            _ => return None,
        };
        Some(factor)
    }

    /// Convert `from` into `to`'s unit. `to` keeps its relative flag and
    /// gets the category's default unit when it has none.
    pub fn try_unify(
        &self,
        property: &str,
        from: &SignedNumber,
        to: &SignedNumber,
    ) -> Result<(SignedNumber, SignedNumber)> {
        let conversion_error = |unit: &str| KinemaError::UnitConversion {
            property: property.to_string(),
            unit: unit.to_string(),
        };
        let category = UnitCategory::of(property).ok_or_else(|| conversion_error(&from.unit))?;

        let (factor, unit) = match category {
            UnitCategory::Angle => {
                let from_unit = from.unit_or("deg");
                let to_unit = to.unit_or("deg");
                let a = angle_factor(from_unit).ok_or_else(|| conversion_error(from_unit))?;
                let b = angle_factor(to_unit).ok_or_else(|| conversion_error(to_unit))?;
                (a / b, to_unit.to_string())
            }
            UnitCategory::Length => {
                let from_unit = from.unit_or("px");
                let to_unit = to.unit_or("px");
                let a = self
                    .length_factor(property, from_unit)
                    .ok_or_else(|| conversion_error(from_unit))?;
                let b = self
                    .length_factor(property, to_unit)
                    .ok_or_else(|| conversion_error(to_unit))?;
                if b == 0.0 {
                    return Err(conversion_error(to_unit));
                }
                (a / b, to_unit.to_string())
            }
            UnitCategory::Ratio => {
                let ratio = |unit: &str| match unit {
                    "" => Some(1.0),
                    "%" => Some(0.01),
                    _ => None,
                };
                let a = ratio(&from.unit).ok_or_else(|| conversion_error(&from.unit))?;
                let b = ratio(&to.unit).ok_or_else(|| conversion_error(&to.unit))?;
                (a / b, to.unit.clone())
            }
            UnitCategory::Number => (1.0, String::new()),
        };

        Ok((
            SignedNumber::new(from.value * factor, unit.clone()),
            SignedNumber {
                relative: to.relative,
                value: to.value,
                unit,
            },
        ))
    }

    /// Lenient [`try_unify`](Self::try_unify): failures are reported and
    /// `from` becomes unitless zero
    pub fn unify(
        &self,
        property: &str,
        from: &SignedNumber,
        to: &SignedNumber,
    ) -> (SignedNumber, SignedNumber) {
        match self.try_unify(property, from, to) {
            Ok(pair) => pair,
            Err(err) => {
                diagnostics::report(&err);
                (SignedNumber::zero(), to.clone())
            }
        }
    }

    /// Apply `delta` to `prior`: relative deltas add, absolute ones replace
    pub fn combine(
        &self,
        property: &str,
        prior: &SignedNumber,
        delta: &SignedNumber,
    ) -> SignedNumber {
        let (prior, delta) = self.unify(property, prior, delta);
        let value = if delta.relative {
            prior.value + delta.value
        } else {
            delta.value
        };
        SignedNumber::new(value, delta.unit)
    }

    /// Fill missing endpoints (`from` from the fallback, `to` from `from`),
    /// resolve deltas against the fallback and bring both to `to`'s unit
    pub fn resolve_endpoints(
        &self,
        property: &str,
        fallback: &SignedNumber,
        from: Option<&SignedNumber>,
        to: Option<&SignedNumber>,
    ) -> (SignedNumber, SignedNumber) {
        let from = from.unwrap_or(fallback);
        let to = to.unwrap_or(from);
        let from = self.combine(property, fallback, from);
        let to = self.combine(property, fallback, to);
        self.unify(property, &from, &to)
    }
}
