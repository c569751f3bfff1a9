//! In-memory target for tests and headless hosts

use indexmap::IndexMap;
use kinema_core::{Mat4, Rgba};

use crate::color::parse_color;
use crate::target::StyleTarget;
use crate::transform::parse_transform;
use crate::units::{FixedLengths, LengthContext};

/// A [`StyleTarget`] backed by a value map.
///
/// Applied values are written back into the map (so later tweens read them
/// as current values) and recorded in order.
#[derive(Clone, Debug, Default)]
pub struct MemoryTarget {
    pub lengths: FixedLengths,
    values: IndexMap<String, String>,
    applied: Vec<(String, String)>,
    matrix: Mat4,
    center: Option<(f64, f64)>,
    missing: Vec<String>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, property: &str, value: &str) -> Self {
        self.values.insert(property.to_string(), value.to_string());
        self
    }

    pub fn with_matrix(mut self, matrix: Mat4) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn with_lengths(mut self, lengths: FixedLengths) -> Self {
        self.lengths = lengths;
        self
    }

    pub fn with_center(mut self, x: f64, y: f64) -> Self {
        self.center = Some((x, y));
        self
    }

    /// Make `has_property` reject `property`
    pub fn without_property(mut self, property: &str) -> Self {
        self.missing.push(property.to_string());
        self
    }

    pub fn value(&self, property: &str) -> Option<&str> {
        self.values.get(property).map(String::as_str)
    }

    /// Every `apply_value` call so far
    pub fn applied(&self) -> &[(String, String)] {
        &self.applied
    }

    pub fn clear_applied(&mut self) {
        self.applied.clear();
    }
}

impl LengthContext for MemoryTarget {
    fn element_width(&self) -> f64 {
        self.lengths.element_width()
    }
    fn element_height(&self) -> f64 {
        self.lengths.element_height()
    }
    fn parent_width(&self) -> f64 {
        self.lengths.parent_width()
    }
    fn parent_height(&self) -> f64 {
        self.lengths.parent_height()
    }
    fn root_font_size(&self) -> f64 {
        self.lengths.root_font_size()
    }
    fn element_font_size(&self) -> f64 {
        self.lengths.element_font_size()
    }
    fn viewport_width(&self) -> f64 {
        self.lengths.viewport_width()
    }
    fn viewport_height(&self) -> f64 {
        self.lengths.viewport_height()
    }
}

impl StyleTarget for MemoryTarget {
    fn read_value(&self, property: &str) -> Option<String> {
        self.values.get(property).cloned()
    }

    fn apply_value(&mut self, property: &str, value: &str) {
        if property == "transform" {
            if let Ok(matrix) = parse_transform(value) {
                self.matrix = matrix;
            }
        }
        self.values.insert(property.to_string(), value.to_string());
        self.applied.push((property.to_string(), value.to_string()));
    }

    fn has_property(&self, property: &str) -> bool {
        !self.missing.iter().any(|p| p == property)
    }

    fn transform_matrix(&self) -> Mat4 {
        self.matrix
    }

    fn probe_color(&self, keyword: &str) -> Option<Rgba> {
        match keyword {
            "currentcolor" | "currentColor" => {
                self.values.get("color").and_then(|c| parse_color(c).ok())
            }
            _ => None,
        }
    }

    fn center(&self) -> Option<(f64, f64)> {
        self.center
    }
}
