//! Property classification
//!
//! Every property key is classified once into a [`PropertyKind`]; the
//! unification engine then matches on the kind instead of re-inspecting the
//! name for every value.

use crate::transform::TransformKey;

/// Border-like shorthands split into color, style and width
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShorthandKind {
    /// `border`, `borderTop`.., `outline`
    Stroke,
    /// `margin`, `padding`
    Sides,
    /// `borderRadius`
    BorderRadius,
}

/// Properties holding several interpolable values
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MultiValueKind {
    BoxShadow,
    TextShadow,
    Filter,
    BackgroundPosition,
    TransformOrigin,
    /// `borderTopLeftRadius` and friends, as `h v` pairs
    CornerRadius,
}

impl MultiValueKind {
    /// Number of positional slots for position-like kinds
    pub fn position_slots(&self) -> usize {
        match self {
            MultiValueKind::TransformOrigin => 3,
            _ => 2,
        }
    }
}

/// How a property's values are unified and interpolated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Transform(TransformKey),
    Composite(ShorthandKind),
    MultiValue(MultiValueKind),
    Color,
    Angle,
    Length,
    /// Unitless fraction that may also be given in percent
    Ratio,
    /// Plain unitless number
    Number,
    /// `autoHide`: toggles visibility with opacity
    AutoHide,
    /// Anything else; switches value at the far endpoint
    Discrete,
}

impl PropertyKind {
    /// Classify a property key given in camelCase or kebab-case
    pub fn classify(key: &str) -> PropertyKind {
        if key == "autoHide" {
            return PropertyKind::AutoHide;
        }
        if let Some(transform) = TransformKey::parse(key) {
            return PropertyKind::Transform(transform);
        }

        let kebab = camel_to_kebab(key);
        match kebab.as_str() {
            "border" | "border-top" | "border-right" | "border-bottom" | "border-left"
            | "outline" => PropertyKind::Composite(ShorthandKind::Stroke),
            "margin" | "padding" => PropertyKind::Composite(ShorthandKind::Sides),
            "border-radius" => PropertyKind::Composite(ShorthandKind::BorderRadius),
            "box-shadow" => PropertyKind::MultiValue(MultiValueKind::BoxShadow),
            "text-shadow" => PropertyKind::MultiValue(MultiValueKind::TextShadow),
            "filter" | "backdrop-filter" => PropertyKind::MultiValue(MultiValueKind::Filter),
            "background-position" => PropertyKind::MultiValue(MultiValueKind::BackgroundPosition),
            "transform-origin" => PropertyKind::MultiValue(MultiValueKind::TransformOrigin),
            "border-top-left-radius"
            | "border-top-right-radius"
            | "border-bottom-right-radius"
            | "border-bottom-left-radius" => PropertyKind::MultiValue(MultiValueKind::CornerRadius),
            k if is_color_property(k) => PropertyKind::Color,
            k => match crate::units::UnitCategory::of(k) {
                Some(crate::units::UnitCategory::Angle) => PropertyKind::Angle,
                Some(crate::units::UnitCategory::Length) => PropertyKind::Length,
                Some(crate::units::UnitCategory::Ratio) => PropertyKind::Ratio,
                Some(crate::units::UnitCategory::Number) => PropertyKind::Number,
                None => PropertyKind::Discrete,
            },
        }
    }

    pub fn is_transform(&self) -> bool {
        matches!(self, PropertyKind::Transform(_))
    }
}

fn is_color_property(kebab: &str) -> bool {
    kebab == "color" || kebab.ends_with("-color") || kebab == "fill" || kebab == "stroke"
}

/// `backgroundColor` -> `background-color`
pub fn camel_to_kebab(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `background-color` -> `backgroundColor`
pub fn kebab_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformChannel;

    #[test]
    fn test_case_conversion() {
        assert_eq!(camel_to_kebab("borderTopLeftRadius"), "border-top-left-radius");
        assert_eq!(kebab_to_camel("border-top-left-radius"), "borderTopLeftRadius");
        assert_eq!(camel_to_kebab("width"), "width");
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            PropertyKind::classify("x"),
            PropertyKind::Transform(TransformKey::Channel(TransformChannel::TranslateX))
        );
        assert_eq!(
            PropertyKind::classify("margin"),
            PropertyKind::Composite(ShorthandKind::Sides)
        );
        assert_eq!(
            PropertyKind::classify("borderTop"),
            PropertyKind::Composite(ShorthandKind::Stroke)
        );
        assert_eq!(
            PropertyKind::classify("boxShadow"),
            PropertyKind::MultiValue(MultiValueKind::BoxShadow)
        );
        assert_eq!(PropertyKind::classify("backgroundColor"), PropertyKind::Color);
        assert_eq!(PropertyKind::classify("width"), PropertyKind::Length);
        assert_eq!(PropertyKind::classify("opacity"), PropertyKind::Ratio);
        assert_eq!(PropertyKind::classify("zIndex"), PropertyKind::Number);
        assert_eq!(PropertyKind::classify("borderStyle"), PropertyKind::Discrete);
        assert_eq!(PropertyKind::classify("autoHide"), PropertyKind::AutoHide);
    }
}
