//! Keyframe animations
//!
//! A tween with the `keyframes` option drives an inner timeline of one
//! segment tween per step. Three notations are accepted:
//!
//! - **Frames**: a list of property maps played in equal slices
//! - **Percentages**: `"50%" => {..}` maps; each property animates between
//!   the percentages where it appears, seeded with the tween's own
//!   from/to values at 0% and 100%
//! - **Values**: `property => [v0, v1, ..]` lists split evenly

use indexmap::IndexMap;
use kinema_core::KinemaError;
use kinema_style::{PropertyMap, PropertyValue};
use serde::Deserialize;

use crate::easing::Easing;

/// The step notation of a [`Keyframes`] option
#[derive(Clone, Debug, PartialEq)]
pub enum KeyframeFrames {
    Frames(Vec<PropertyMap>),
    /// `(percentage, properties)`, percentage in `0..=100`
    Percentages(Vec<(f64, PropertyMap)>),
    Values(IndexMap<String, Vec<PropertyValue>>),
}

/// Keyframe option of a tween
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(try_from = "KeyframesRepr")]
pub struct Keyframes {
    pub frames: KeyframeFrames,
    /// Ease of the inner timeline
    pub ease: Option<Easing>,
    /// Ease of every segment without its own
    pub ease_each: Option<Easing>,
}

impl Keyframes {
    fn with(frames: KeyframeFrames) -> Self {
        Self {
            frames,
            ease: None,
            ease_each: None,
        }
    }

    pub fn frames(frames: impl IntoIterator<Item = PropertyMap>) -> Self {
        Self::with(KeyframeFrames::Frames(frames.into_iter().collect()))
    }

    pub fn percentages(frames: impl IntoIterator<Item = (f64, PropertyMap)>) -> Self {
        Self::with(KeyframeFrames::Percentages(frames.into_iter().collect()))
    }

    pub fn values<K: Into<String>>(values: impl IntoIterator<Item = (K, Vec<PropertyValue>)>) -> Self {
        Self::with(KeyframeFrames::Values(
            values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn ease(mut self, ease: impl Into<Easing>) -> Self {
        self.ease = Some(ease.into());
        self
    }

    pub fn ease_each(mut self, ease: impl Into<Easing>) -> Self {
        self.ease_each = Some(ease.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyframesRepr {
    Frames(Vec<PropertyMap>),
    Object(IndexMap<String, KeyframeEntry>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyframeEntry {
    Frame(PropertyMap),
    Values(Vec<PropertyValue>),
    Ease(String),
}

impl TryFrom<KeyframesRepr> for Keyframes {
    type Error = KinemaError;

    fn try_from(repr: KeyframesRepr) -> Result<Self, Self::Error> {
        let entries = match repr {
            KeyframesRepr::Frames(frames) => return Ok(Keyframes::frames(frames)),
            KeyframesRepr::Object(entries) => entries,
        };

        let mut ease = None;
        let mut ease_each = None;
        let mut percentages = Vec::new();
        let mut values = IndexMap::new();
        for (key, entry) in entries {
            match (key.as_str(), entry) {
                ("ease", KeyframeEntry::Ease(name)) => ease = Some(Easing::parse(&name)),
                ("easeEach", KeyframeEntry::Ease(name)) => ease_each = Some(Easing::parse(&name)),
                (_, KeyframeEntry::Frame(frame)) => {
                    let percent = key
                        .trim()
                        .strip_suffix('%')
                        .and_then(|n| n.trim().parse::<f64>().ok())
                        .ok_or_else(|| KinemaError::Config(format!("invalid keyframe key {key:?}")))?;
                    percentages.push((percent, frame));
                }
                (_, KeyframeEntry::Values(list)) => {
                    values.insert(key, list);
                }
                (_, KeyframeEntry::Ease(_)) => {
                    return Err(KinemaError::Config(format!("invalid keyframe entry {key:?}")));
                }
            }
        }

        let frames = match (percentages.is_empty(), values.is_empty()) {
            (false, true) => KeyframeFrames::Percentages(percentages),
            (true, _) => KeyframeFrames::Values(values),
            (false, false) => {
                return Err(KinemaError::Config(
                    "keyframes mix percentage and value notation".into(),
                ))
            }
        };
        Ok(Keyframes {
            frames,
            ease,
            ease_each,
        })
    }
}

/// One segment tween of a keyframe timeline
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeSegment {
    pub from: PropertyMap,
    pub to: PropertyMap,
    /// Start inside the keyframe timeline, seconds
    pub at: f64,
    pub duration: f64,
    /// `None` leaves the default ease
    pub ease: Option<Easing>,
    pub pre_render: bool,
}

/// Segments of a keyframe timeline
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframePlan {
    pub segments: Vec<KeyframeSegment>,
    pub ease: Easing,
    /// Fixed timeline duration, when the notation defines one
    pub duration: Option<f64>,
}

/// Properties the owning tween passes on to its keyframes
pub struct KeyframeSource<'a> {
    /// Tween duration, seconds
    pub duration: f64,
    pub ease: &'a Easing,
    pub pre_render: bool,
    pub from: &'a PropertyMap,
    pub to: &'a PropertyMap,
}

/// Pull a per-frame `ease` entry out of a property map
fn take_ease(frame: &PropertyMap) -> (Option<Easing>, PropertyMap) {
    let mut properties = frame.clone();
    let ease = properties
        .shift_remove("ease")
        .map(|value| Easing::parse(&value.to_string()));
    (ease, properties)
}

impl Keyframes {
    /// Split into segments for a tween.
    pub fn plan(&self, source: &KeyframeSource<'_>) -> KeyframePlan {
        let duration = if source.duration == 0.0 {
            1e-8
        } else {
            source.duration
        };
        let (segments, fixed) = match &self.frames {
            KeyframeFrames::Frames(frames) => (frame_segments(frames, duration, source), None),
            KeyframeFrames::Percentages(frames) => (
                self.percentage_segments(frames, duration, source),
                Some(duration),
            ),
            KeyframeFrames::Values(values) => (self.value_segments(values, duration, source), None),
        };
        tracing::debug!(segments = segments.len(), "keyframes planned");
        KeyframePlan {
            segments,
            ease: self.ease.clone().unwrap_or(Easing::Linear),
            duration: fixed,
        }
    }

    fn percentage_segments(
        &self,
        frames: &[(f64, PropertyMap)],
        duration: f64,
        source: &KeyframeSource<'_>,
    ) -> Vec<KeyframeSegment> {
        let frames: Vec<(f64, Option<Easing>, PropertyMap)> = frames
            .iter()
            .map(|(p, frame)| {
                let (ease, properties) = take_ease(frame);
                (*p, ease, properties)
            })
            .collect();

        let mut properties: Vec<&String> = Vec::new();
        for (_, _, frame) in &frames {
            for key in frame.keys() {
                if !properties.contains(&key) {
                    properties.push(key);
                }
            }
        }
        let seed = |values: &PropertyMap| -> PropertyMap {
            values
                .iter()
                .filter(|(k, _)| properties.contains(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        let (start, end) = (seed(source.from), seed(source.to));

        let mut percents: Vec<f64> = frames.iter().map(|(p, _, _)| *p).collect();
        if !start.is_empty() {
            percents.push(0.0);
        }
        if !end.is_empty() {
            percents.push(100.0);
        }
        percents.sort_by(f64::total_cmp);
        percents.dedup();

        // every percentage with its merged properties, explicit frames win
        let combined: Vec<(f64, Option<Easing>, PropertyMap)> = percents
            .into_iter()
            .map(|p| {
                let mut merged = match p {
                    p if p == 0.0 => start.clone(),
                    p if p == 100.0 => end.clone(),
                    _ => PropertyMap::new(),
                };
                let mut ease = None;
                for (_, frame_ease, frame) in frames.iter().filter(|(fp, _, _)| *fp == p) {
                    merged.extend(frame.iter().map(|(k, v)| (k.clone(), v.clone())));
                    ease = frame_ease.clone().or(ease);
                }
                (p, ease, merged)
            })
            .collect();

        let mut last_seen: IndexMap<String, f64> = IndexMap::new();
        let mut segments = Vec::new();
        for (percent, frame_ease, frame) in &combined {
            let position = percent / 100.0;
            for (property, value) in frame {
                let previous = last_seen.get(property).copied();
                if position != 0.0 {
                    let from = previous
                        .and_then(|prev| {
                            combined
                                .iter()
                                .find(|(p, _, _)| *p / 100.0 == prev)
                                .and_then(|(_, _, f)| f.get(property))
                        })
                        .map(|v| PropertyMap::from([(property.clone(), v.clone())]))
                        .unwrap_or_default();
                    let begin = previous.unwrap_or(0.0);
                    segments.push(KeyframeSegment {
                        from,
                        to: PropertyMap::from([(property.clone(), value.clone())]),
                        at: begin * duration,
                        duration: (position - begin) * duration,
                        ease: Some(
                            frame_ease
                                .clone()
                                .or_else(|| self.ease_each.clone())
                                .unwrap_or_else(|| source.ease.clone()),
                        ),
                        pre_render: source.pre_render && previous.map_or(true, |p| p == 0.0),
                    });
                }
                last_seen.insert(property.clone(), position);
            }
        }
        segments
    }

    fn value_segments(
        &self,
        values: &IndexMap<String, Vec<PropertyValue>>,
        duration: f64,
        source: &KeyframeSource<'_>,
    ) -> Vec<KeyframeSegment> {
        let ease = self.ease_each.clone().unwrap_or_else(|| source.ease.clone());
        let mut segments = Vec::new();
        for (key, list) in values {
            let Some(first) = list.first() else {
                continue;
            };
            let single = list.len() == 1;
            let step = duration / (list.len().max(2) - 1) as f64;
            let steps = if single { 1 } else { list.len() - 1 };
            for index in 0..steps {
                let to = if single { first } else { &list[index + 1] };
                segments.push(KeyframeSegment {
                    from: PropertyMap::from([(key.clone(), list[index].clone())]),
                    to: PropertyMap::from([(key.clone(), to.clone())]),
                    at: if single { 0.0 } else { index as f64 * step },
                    duration: if single { duration } else { step },
                    ease: Some(ease.clone()),
                    pre_render: source.pre_render && index == 0,
                });
            }
        }
        segments
    }
}

fn frame_segments(
    frames: &[PropertyMap],
    duration: f64,
    source: &KeyframeSource<'_>,
) -> Vec<KeyframeSegment> {
    let slice = duration / frames.len().max(1) as f64;
    frames
        .iter()
        .enumerate()
        .map(|(index, frame)| {
            let (ease, to) = take_ease(frame);
            KeyframeSegment {
                from: if index == 0 {
                    source.from.clone()
                } else {
                    PropertyMap::new()
                },
                to,
                at: index as f64 * slice,
                duration: slice,
                ease,
                pre_render: source.pre_render && index == 0,
            }
        })
        .collect()
}
