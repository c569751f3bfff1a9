//! Target capabilities
//!
//! The engine never touches a rendering backend directly. Whatever is being
//! animated (a DOM node, a widget, a test double) implements [`StyleTarget`].

use kinema_core::{Mat4, Rgba};

use crate::units::LengthContext;

/// Style I/O for one animated target.
///
/// Property keys are camelCase (`backgroundColor`); `supports_value` gets the
/// kebab-case name as CSS would.
pub trait StyleTarget: LengthContext {
    /// Current computed value of a property
    fn read_value(&self, property: &str) -> Option<String>;

    /// Write an interpolated value
    fn apply_value(&mut self, property: &str, value: &str);

    /// Whether the target exposes the property at all
    fn has_property(&self, _property: &str) -> bool {
        true
    }

    /// Whether `value` is valid for `property`
    fn supports_value(&self, _property: &str, _value: &str) -> bool {
        true
    }

    /// Current transform as a 4x4 matrix
    fn transform_matrix(&self) -> Mat4 {
        Mat4::IDENTITY
    }

    /// Resolve a keyword color with no closed form (`currentcolor`, system colors)
    fn probe_color(&self, _keyword: &str) -> Option<Rgba> {
        None
    }

    /// Center point in page coordinates, used by distance-based staggers
    fn center(&self) -> Option<(f64, f64)> {
        None
    }
}
