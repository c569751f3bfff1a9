//! Stagger offsets
//!
//! A tween over several targets becomes a timeline with one child tween per
//! target. [`distribute`] computes each child's start offset.

use std::str::FromStr;

use kinema_core::diagnostics;
use kinema_core::{KinemaError, WarningKind};
use serde::Deserialize;

use crate::easing::Easing;

/// Where the stagger wave starts
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum StaggerFrom {
    #[default]
    Start,
    Center,
    End,
    /// Index of the first target to start
    Index(usize),
    /// Normalized point inside the layout, `(0, 0)` top left
    Point(f64, f64),
    /// Independent random start for every target
    Random,
}

impl FromStr for StaggerFrom {
    type Err = KinemaError;

    fn from_str(s: &str) -> kinema_core::Result<Self> {
        let from = match s.trim() {
            "start" | "left" | "top left" | "left top" => StaggerFrom::Start,
            "center" => StaggerFrom::Center,
            "end" | "right" | "bottom right" | "right bottom" => StaggerFrom::End,
            "top right" | "right top" => StaggerFrom::Point(1.0, 0.0),
            "bottom left" | "left bottom" => StaggerFrom::Point(0.0, 1.0),
            "random" => StaggerFrom::Random,
            other => {
                return Err(KinemaError::Config(format!(
                    "unknown stagger origin {other:?}"
                )))
            }
        };
        Ok(from)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StaggerFromRepr {
    Index(i64),
    Point([f64; 2]),
    Named(String),
}

impl<'de> Deserialize<'de> for StaggerFrom {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match StaggerFromRepr::deserialize(deserializer)? {
            StaggerFromRepr::Index(-1) => Ok(StaggerFrom::End),
            StaggerFromRepr::Index(i) => usize::try_from(i)
                .map(StaggerFrom::Index)
                .map_err(serde::de::Error::custom),
            StaggerFromRepr::Point([x, y]) => Ok(StaggerFrom::Point(x, y)),
            StaggerFromRepr::Named(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// How target positions are measured
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StaggerLayout {
    /// Explicit `rows x columns` grid, targets in row-major order
    Grid(usize, usize),
    /// Grid measured from the distinct target centers
    AutoGrid,
    /// Euclidean distance between target centers
    Distance,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StaggerLayoutRepr {
    Grid([usize; 2]),
    Named(String),
}

impl<'de> Deserialize<'de> for StaggerLayout {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match StaggerLayoutRepr::deserialize(deserializer)? {
            StaggerLayoutRepr::Grid([rows, columns]) => Ok(StaggerLayout::Grid(rows, columns)),
            StaggerLayoutRepr::Named(name) => match name.as_str() {
                "grid" => Ok(StaggerLayout::AutoGrid),
                "distance" => Ok(StaggerLayout::Distance),
                other => Err(serde::de::Error::custom(format!(
                    "unknown stagger layout {other:?}"
                ))),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaggerAxis {
    X,
    Y,
    #[default]
    Xy,
}

/// Stagger settings; a bare number means `each`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "StaggerRepr")]
pub struct StaggerOptions {
    /// Seconds between consecutive starts
    pub each: Option<f64>,
    /// Total spread, used when `each` is not set
    pub duration: Option<f64>,
    pub from: StaggerFrom,
    pub layout: Option<StaggerLayout>,
    pub axis: Option<StaggerAxis>,
    pub invert: bool,
    pub repeat: Option<i32>,
    pub iteration_delay: Option<f64>,
    pub alternate: Option<bool>,
    /// Ease of the stagger timeline itself
    pub ease: Option<Easing>,
    pub alternate_ease: Option<Easing>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StaggerRepr {
    Each(f64),
    Full(StaggerFields),
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StaggerFields {
    each: Option<f64>,
    duration: Option<f64>,
    from: StaggerFrom,
    layout: Option<StaggerLayout>,
    axis: Option<StaggerAxis>,
    invert: bool,
    repeat: Option<i32>,
    iteration_delay: Option<f64>,
    alternate: Option<bool>,
    ease: Option<Easing>,
    alternate_ease: Option<Easing>,
}

impl From<StaggerRepr> for StaggerOptions {
    fn from(repr: StaggerRepr) -> Self {
        match repr {
            StaggerRepr::Each(each) => StaggerOptions::each(each),
            StaggerRepr::Full(f) => StaggerOptions {
                each: f.each,
                duration: f.duration,
                from: f.from,
                layout: f.layout,
                axis: f.axis,
                invert: f.invert,
                repeat: f.repeat,
                iteration_delay: f.iteration_delay,
                alternate: f.alternate,
                ease: f.ease,
                alternate_ease: f.alternate_ease,
            },
        }
    }
}

impl From<f64> for StaggerOptions {
    fn from(each: f64) -> Self {
        StaggerOptions::each(each)
    }
}

impl StaggerOptions {
    pub fn each(each: f64) -> Self {
        Self {
            each: Some(each),
            ..Self::default()
        }
    }

    /// Spread the starts over `duration` seconds in total
    pub fn spread(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Self::default()
        }
    }

    pub fn origin(mut self, from: StaggerFrom) -> Self {
        self.from = from;
        self
    }

    pub fn layout(mut self, layout: StaggerLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn axis(mut self, axis: StaggerAxis) -> Self {
        self.axis = Some(axis);
        self
    }

    pub fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Seconds between consecutive starts for `count` targets
    pub fn each_for(&self, count: usize) -> f64 {
        match (self.each, self.duration) {
            (Some(each), _) => each,
            (None, Some(duration)) if count > 1 => duration / (count - 1) as f64,
            _ => 0.0,
        }
    }

    /// Layout used when none is given: anything two-dimensional implies
    /// distance
    fn effective_layout(&self) -> Option<StaggerLayout> {
        self.layout.or_else(|| {
            let two_dimensional = matches!(self.from, StaggerFrom::Point(..) | StaggerFrom::Center)
                || self.axis.is_some();
            two_dimensional.then_some(StaggerLayout::Distance)
        })
    }
}

/// Start offsets in seconds for targets with the given centers.
///
/// Distance and auto-grid layouts need every center; when one is missing
/// the offsets fall back to target order.
pub fn distribute(options: &StaggerOptions, centers: &[Option<(f64, f64)>]) -> Vec<f64> {
    let count = centers.len();
    let each = options.each_for(count);
    if each == 0.0 || count < 2 {
        return vec![0.0; count];
    }
    let span = each * (count - 1) as f64;

    if options.from == StaggerFrom::Random {
        return random_offsets(options, count, span);
    }

    let known: Option<Vec<(f64, f64)>> = centers.iter().copied().collect();
    let layout = match (options.effective_layout(), &known) {
        (Some(StaggerLayout::Grid(rows, columns)), _) => Some(Layout::Grid(rows, columns)),
        (Some(StaggerLayout::AutoGrid), Some(points)) => {
            let (rows, columns) = measure_grid(points);
            Some(Layout::Grid(rows, columns))
        }
        (Some(StaggerLayout::Distance), Some(points)) => Some(Layout::Points(points.clone())),
        (Some(_), None) => {
            tracing::debug!("stagger layout needs target centers, using target order");
            None
        }
        (None, _) => None,
    };

    let timings = match layout {
        Some(layout) => match spatial_timings(options, layout, count) {
            Some(t) => t,
            None => {
                diagnostics::warn(
                    WarningKind::InvalidOption,
                    "targets share one location, stagger layout ignored",
                );
                return normalize(&(0..count).map(|i| i as f64).collect::<Vec<_>>())
                    .into_iter()
                    .map(|v| v * span)
                    .collect();
            }
        },
        None => {
            let origin = match options.from {
                StaggerFrom::Start | StaggerFrom::Point(..) => 0.0,
                StaggerFrom::Center => (count - 1) as f64 / 2.0,
                StaggerFrom::End => (count - 1) as f64,
                StaggerFrom::Index(i) => i as f64,
                StaggerFrom::Random => 0.0,
            };
            (0..count).map(|i| (i as f64 - origin).abs()).collect()
        }
    };

    normalize(&timings)
        .into_iter()
        .map(|v| if options.invert { (v - 1.0).abs() } else { v })
        .map(|v| v * span)
        .collect()
}

/// Random draws normalized onto `0..=span`; spatial settings do not apply
fn random_offsets(options: &StaggerOptions, count: usize, span: f64) -> Vec<f64> {
    for (set, name) in [
        (options.invert, "invert"),
        (options.axis.is_some(), "axis"),
        (options.layout.is_some(), "layout"),
    ] {
        if set {
            diagnostics::warn(
                WarningKind::InvalidOption,
                format!("stagger {name} has no effect when using random"),
            );
        }
    }
    let draws: Vec<f64> = (0..count).map(|_| fastrand::f64()).collect();
    normalize(&draws).into_iter().map(|v| v * span).collect()
}

enum Layout {
    Grid(usize, usize),
    Points(Vec<(f64, f64)>),
}

/// `(rows, columns)` from the distinct y and x coordinates
fn measure_grid(points: &[(f64, f64)]) -> (usize, usize) {
    let distinct = |values: Vec<f64>| {
        let mut values = values;
        values.sort_by(f64::total_cmp);
        values.dedup();
        values.len()
    };
    let columns = distinct(points.iter().map(|p| p.0).collect());
    let rows = distinct(points.iter().map(|p| p.1).collect());
    (rows, columns)
}

/// Normalized cell position of `index` in a row-major grid
fn grid_position(rows: usize, columns: usize, index: usize) -> (f64, f64) {
    let columns = columns.max(1);
    let row = index / columns;
    let column = index % columns;
    let x = if columns > 1 {
        column as f64 / (columns - 1) as f64
    } else {
        0.5
    };
    let y = if rows > 1 {
        row as f64 / (rows - 1) as f64
    } else {
        0.5
    };
    (x, y)
}

/// Distance of every target from the origin, or `None` when all targets
/// share one position
fn spatial_timings(options: &StaggerOptions, layout: Layout, count: usize) -> Option<Vec<f64>> {
    let (points, bounds) = match layout {
        Layout::Grid(rows, columns) => {
            let points: Vec<_> = (0..count).map(|i| grid_position(rows, columns, i)).collect();
            (points, (0.0, 1.0, 0.0, 1.0))
        }
        Layout::Points(points) => {
            let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
            let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
            for (x, y) in &points {
                min_x = min_x.min(*x);
                max_x = max_x.max(*x);
                min_y = min_y.min(*y);
                max_y = max_y.max(*y);
            }
            (points, (min_x, max_x, min_y, max_y))
        }
    };

    if points.iter().all(|p| *p == points[0]) {
        return None;
    }

    let (min_x, max_x, min_y, max_y) = bounds;
    let (range_x, range_y) = (max_x - min_x, max_y - min_y);
    let normalized = |(x, y): (f64, f64)| {
        (
            if range_x == 0.0 { 0.0 } else { (x - min_x) / range_x },
            if range_y == 0.0 { 0.0 } else { (y - min_y) / range_y },
        )
    };
    let origin = match options.from {
        StaggerFrom::Start | StaggerFrom::Random => (0.0, 0.0),
        StaggerFrom::Center => (0.5, 0.5),
        StaggerFrom::End => (1.0, 1.0),
        StaggerFrom::Point(x, y) => (x, y),
        StaggerFrom::Index(i) => normalized(points[i.min(count - 1)]),
    };
    let start = (min_x + range_x * origin.0, min_y + range_y * origin.1);

    let axis = options.axis.unwrap_or_default();
    let timing = |(x, y): (f64, f64)| {
        let (dx, dy) = (x - start.0, y - start.1);
        match axis {
            StaggerAxis::Xy => (dx * dx + dy * dy).sqrt() / (range_x * range_x + range_y * range_y).sqrt(),
            StaggerAxis::X if range_x == 0.0 => 0.0,
            StaggerAxis::X => dx / range_x,
            StaggerAxis::Y if range_y == 0.0 => 0.0,
            StaggerAxis::Y => dy / range_y,
        }
    };

    let timings: Vec<f64> = points.iter().map(|p| timing(*p)).collect();
    let max = timings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max = if max == 0.0 { 1.0 } else { max };
    Some(timings.into_iter().map(|t| (t / max).abs()).collect())
}

/// Min-max normalization; a constant input maps to zeros
fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    values
        .iter()
        .map(|v| if range == 0.0 { 0.0 } else { (v - min) / range })
        .collect()
}
