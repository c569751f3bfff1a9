//! Transform subsystem
//!
//! Transform properties compose against the target's current matrix rather
//! than against a string default: the matrix is decomposed into eleven
//! channels (translate, scale and rotate per axis, skew in x and y), each
//! animated channel is combined against its decomposed value, and the result
//! is reassembled in a fixed canonical order.

use std::fmt;

use indexmap::IndexMap;
use kinema_core::diagnostics;
use kinema_core::{KinemaError, Mat4, Result};
use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, multispace0, multispace1},
    combinator::value,
    error::ParseError as NomParseError,
    multi::separated_list1,
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::parse::{identifier, number, split_top_level, ws};
use crate::signed_number::SignedNumber;
use crate::token::Token;
use crate::units::{angle_factor, UnitConverter};
use crate::value::{PropertyMap, PropertyValue};

// ============================================================================
// Channels and keys
// ============================================================================

/// One decomposed transform component
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransformChannel {
    TranslateX,
    TranslateY,
    TranslateZ,
    RotateX,
    RotateY,
    RotateZ,
    ScaleX,
    ScaleY,
    ScaleZ,
    SkewX,
    SkewY,
}

impl TransformChannel {
    pub const ALL: [TransformChannel; 11] = [
        TransformChannel::TranslateX,
        TransformChannel::TranslateY,
        TransformChannel::TranslateZ,
        TransformChannel::RotateX,
        TransformChannel::RotateY,
        TransformChannel::RotateZ,
        TransformChannel::ScaleX,
        TransformChannel::ScaleY,
        TransformChannel::ScaleZ,
        TransformChannel::SkewX,
        TransformChannel::SkewY,
    ];

    /// CSS function name, also used as the unit-conversion property
    pub fn name(&self) -> &'static str {
        match self {
            TransformChannel::TranslateX => "translateX",
            TransformChannel::TranslateY => "translateY",
            TransformChannel::TranslateZ => "translateZ",
            TransformChannel::RotateX => "rotateX",
            TransformChannel::RotateY => "rotateY",
            TransformChannel::RotateZ => "rotateZ",
            TransformChannel::ScaleX => "scaleX",
            TransformChannel::ScaleY => "scaleY",
            TransformChannel::ScaleZ => "scaleZ",
            TransformChannel::SkewX => "skewX",
            TransformChannel::SkewY => "skewY",
        }
    }

    /// Unit assumed for bare numbers
    pub fn default_unit(&self) -> &'static str {
        match self {
            TransformChannel::TranslateX
            | TransformChannel::TranslateY
            | TransformChannel::TranslateZ => "px",
            TransformChannel::ScaleX | TransformChannel::ScaleY | TransformChannel::ScaleZ => "",
            _ => "deg",
        }
    }

    /// Value of the channel in the identity transform
    pub fn identity(&self) -> f64 {
        match self {
            TransformChannel::ScaleX | TransformChannel::ScaleY | TransformChannel::ScaleZ => 1.0,
            _ => 0.0,
        }
    }
}

impl fmt::Display for TransformChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A transform property key and the channels it writes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransformKey {
    Channel(TransformChannel),
    /// `scale`: one value for both axes or two values
    Scale,
    /// `translate`: x and y
    Translate,
    /// `translate3d`: x, y and z
    Translate3d,
    /// `transform`: a full transform function list
    Matrix,
}

impl TransformKey {
    pub fn parse(key: &str) -> Option<TransformKey> {
        use TransformChannel::*;
        let channel = match key {
            "transform" => return Some(TransformKey::Matrix),
            "scale" => return Some(TransformKey::Scale),
            "translate" => return Some(TransformKey::Translate),
            "translate3d" => return Some(TransformKey::Translate3d),
            "x" | "translateX" => TranslateX,
            "y" | "translateY" => TranslateY,
            "z" | "translateZ" => TranslateZ,
            "rotate" | "rotation" | "rotateZ" | "rotationZ" => RotateZ,
            "rotateX" | "rotationX" => RotateX,
            "rotateY" | "rotationY" => RotateY,
            "scaleX" => ScaleX,
            "scaleY" => ScaleY,
            "scaleZ" => ScaleZ,
            "skewX" => SkewX,
            "skewY" => SkewY,
            _ => return None,
        };
        Some(TransformKey::Channel(channel))
    }

    /// Channels written by a multi-value key, in argument order
    fn axes(&self) -> &'static [TransformChannel] {
        match self {
            TransformKey::Scale => &[TransformChannel::ScaleX, TransformChannel::ScaleY],
            TransformKey::Translate => &[TransformChannel::TranslateX, TransformChannel::TranslateY],
            TransformKey::Translate3d => &[
                TransformChannel::TranslateX,
                TransformChannel::TranslateY,
                TransformChannel::TranslateZ,
            ],
            _ => &[],
        }
    }
}

// ============================================================================
// Transform list parsing
// ============================================================================

/// A parsed transform function: name and `(value, unit)` arguments
#[derive(Clone, Debug, PartialEq)]
struct TransformFunction {
    name: String,
    args: Vec<(f64, String)>,
}

fn transform_argument<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (f64, String), E> {
    let (input, value) = number(input)?;
    let (input, unit) = take_while(|c: char| c.is_ascii_alphabetic() || c == '%')(input)?;
    Ok((input, (value, unit.to_string())))
}

fn argument_separator<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    alt((
        value((), tuple((multispace0, char(','), multispace0))),
        value((), multispace1),
    ))(input)
}

fn transform_function<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, TransformFunction, E> {
    let (input, _) = ws(input)?;
    let (input, name) = identifier(input)?;
    let (input, args) = delimited(
        char('('),
        preceded(ws, separated_list1(argument_separator, transform_argument)),
        preceded(ws, char(')')),
    )(input)?;
    let (input, _) = ws(input)?;
    Ok((
        input,
        TransformFunction {
            name: name.to_string(),
            args,
        },
    ))
}

fn parse_functions(input: &str) -> Result<Vec<TransformFunction>> {
    let invalid = || KinemaError::InvalidTransform(input.to_string());
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == "none" {
        return Ok(Vec::new());
    }
    let mut functions = Vec::new();
    let mut rest = trimmed;
    while !rest.trim().is_empty() {
        let (next, function) =
            transform_function::<nom::error::Error<&str>>(rest).map_err(|_| invalid())?;
        functions.push(function);
        rest = next;
    }
    Ok(functions)
}

fn angle_radians(arg: &(f64, String)) -> Result<f64> {
    let unit = if arg.1.is_empty() { "deg" } else { arg.1.as_str() };
    angle_factor(unit)
        .map(|f| (arg.0 * f).to_radians())
        .ok_or_else(|| KinemaError::InvalidTransform(format!("{}{}", arg.0, arg.1)))
}

fn absolute_length(arg: &(f64, String)) -> Result<f64> {
    match arg.1.as_str() {
        "" | "px" => Ok(arg.0),
        _ => Err(KinemaError::InvalidTransform(format!("{}{}", arg.0, arg.1))),
    }
}

fn rotation_3d(x: f64, y: f64, z: f64, angle: f64) -> Mat4 {
    let length = (x * x + y * y + z * z).sqrt();
    if length == 0.0 {
        return Mat4::IDENTITY;
    }
    let (x, y, z) = (x / length, y / length, z / length);
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    Mat4 {
        cols: [
            [c + x * x * t, y * x * t + z * s, z * x * t - y * s, 0.0],
            [x * y * t - z * s, c + y * y * t, z * y * t + x * s, 0.0],
            [x * z * t + y * s, y * z * t - x * s, c + z * z * t, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    }
}

fn function_matrix(function: &TransformFunction) -> Result<Mat4> {
    let invalid = || {
        KinemaError::InvalidTransform(format!("{}({} args)", function.name, function.args.len()))
    };
    let args = &function.args;
    let n = |i: usize| args.get(i).map(|a| a.0).ok_or_else(invalid);
    let len = |i: usize| args.get(i).ok_or_else(invalid).and_then(absolute_length);
    let angle = |i: usize| args.get(i).ok_or_else(invalid).and_then(angle_radians);

    let matrix = match function.name.as_str() {
        "matrix" if args.len() == 6 => Mat4::affine(n(0)?, n(1)?, n(2)?, n(3)?, n(4)?, n(5)?),
        "matrix3d" if args.len() == 16 => {
            let mut values = [0.0; 16];
            for (i, v) in values.iter_mut().enumerate() {
                *v = n(i)?;
            }
            Mat4::from_cols_array(values)
        }
        "translate" => {
            let y = if args.len() > 1 { len(1)? } else { 0.0 };
            Mat4::translation(len(0)?, y, 0.0)
        }
        "translateX" => Mat4::translation(len(0)?, 0.0, 0.0),
        "translateY" => Mat4::translation(0.0, len(0)?, 0.0),
        "translateZ" => Mat4::translation(0.0, 0.0, len(0)?),
        "translate3d" => Mat4::translation(len(0)?, len(1)?, len(2)?),
        "scale" => {
            let x = n(0)?;
            let y = if args.len() > 1 { n(1)? } else { x };
            Mat4::scale(x, y, 1.0)
        }
        "scaleX" => Mat4::scale(n(0)?, 1.0, 1.0),
        "scaleY" => Mat4::scale(1.0, n(0)?, 1.0),
        "scaleZ" => Mat4::scale(1.0, 1.0, n(0)?),
        "scale3d" => Mat4::scale(n(0)?, n(1)?, n(2)?),
        "rotate" | "rotateZ" => Mat4::rotation_z(angle(0)?),
        "rotateX" => Mat4::rotation_x(angle(0)?),
        "rotateY" => Mat4::rotation_y(angle(0)?),
        "rotate3d" => rotation_3d(n(0)?, n(1)?, n(2)?, angle(3)?),
        "skew" => {
            let ay = if args.len() > 1 { angle(1)? } else { 0.0 };
            Mat4::skew(angle(0)?, ay)
        }
        "skewX" => Mat4::skew(angle(0)?, 0.0),
        "skewY" => Mat4::skew(0.0, angle(0)?),
        "perspective" => Mat4::perspective(len(0)?),
        _ => return Err(invalid()),
    };
    Ok(matrix)
}

/// Parse a CSS transform list with absolute lengths into a matrix
pub fn parse_transform(input: &str) -> Result<Mat4> {
    parse_functions(input)?
        .iter()
        .try_fold(Mat4::IDENTITY, |acc, function| {
            Ok(acc.mul(&function_matrix(function)?))
        })
}

/// Rewrite relative translate arguments (`%`, `em`, `vw`, ...) to px
pub fn matrix_to_absolute(uc: &UnitConverter<'_>, input: &str) -> String {
    let px = SignedNumber::new(0.0, "px");
    split_top_level(input, ' ')
        .into_iter()
        .map(|function| {
            let Some(open) = function.find('(') else {
                return function;
            };
            let name = &function[..open];
            let axes: &[TransformChannel] = match name {
                "translate" => TransformKey::Translate.axes(),
                "translate3d" => TransformKey::Translate3d.axes(),
                "translateX" => &[TransformChannel::TranslateX],
                "translateY" => &[TransformChannel::TranslateY],
                "translateZ" => &[TransformChannel::TranslateZ],
                _ => return function,
            };
            let inner = function[open + 1..].trim_end_matches(')');
            let args: Vec<String> = split_top_level(inner, ',')
                .iter()
                .zip(axes)
                .map(|(arg, axis)| {
                    let value = SignedNumber::parse(arg).with_default_unit("px");
                    uc.unify(axis.name(), &value, &px).0.to_string()
                })
                .collect();
            format!("{}({})", name, args.join(", "))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Decomposition
// ============================================================================

/// Matrix split into its channels (translate px, rotate/skew deg, scale factor)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decomposed {
    pub translate: [f64; 3],
    pub scale: [f64; 3],
    pub rotate: [f64; 3],
    pub skew: [f64; 2],
}

impl Default for Decomposed {
    fn default() -> Self {
        Self {
            translate: [0.0; 3],
            scale: [1.0; 3],
            rotate: [0.0; 3],
            skew: [0.0; 2],
        }
    }
}

impl Decomposed {
    pub fn get(&self, channel: TransformChannel) -> f64 {
        match channel {
            TransformChannel::TranslateX => self.translate[0],
            TransformChannel::TranslateY => self.translate[1],
            TransformChannel::TranslateZ => self.translate[2],
            TransformChannel::RotateX => self.rotate[0],
            TransformChannel::RotateY => self.rotate[1],
            TransformChannel::RotateZ => self.rotate[2],
            TransformChannel::ScaleX => self.scale[0],
            TransformChannel::ScaleY => self.scale[1],
            TransformChannel::ScaleZ => self.scale[2],
            TransformChannel::SkewX => self.skew[0],
            TransformChannel::SkewY => self.skew[1],
        }
    }

    /// Every channel as a signed number with its default unit
    pub fn channels(&self) -> IndexMap<TransformChannel, SignedNumber> {
        TransformChannel::ALL
            .iter()
            .map(|ch| (*ch, SignedNumber::new(self.get(*ch), ch.default_unit())))
            .collect()
    }
}

type Vec3 = [f64; 3];

fn length(v: Vec3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn normalize(v: Vec3, len: f64) -> Vec3 {
    if len == 0.0 {
        return v;
    }
    [v[0] / len, v[1] / len, v[2] / len]
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn combine(a: Vec3, b: Vec3, sa: f64, sb: f64) -> Vec3 {
    [
        a[0] * sa + b[0] * sb,
        a[1] * sa + b[1] * sb,
        a[2] * sa + b[2] * sb,
    ]
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Decompose a 3D affine matrix.
///
/// Gram–Schmidt on the linear part yields scale and skew, the orthonormal
/// remainder is turned into a quaternion and then Euler angles. Near gimbal
/// lock (|test| > 0.49999 of the quaternion norm) a two-axis solution is used.
/// Rotations are rounded to whole degrees, scale and skew to 3 decimals.
pub fn decompose_matrix(matrix: &Mat4) -> Decomposed {
    let c = &matrix.cols;
    let mut rows: [Vec3; 3] = [
        [c[0][0], c[0][1], c[0][2]],
        [c[1][0], c[1][1], c[1][2]],
        [c[2][0], c[2][1], c[2][2]],
    ];
    let mut scale = [0.0; 3];
    let mut skew = [0.0; 3];

    scale[0] = length(rows[0]);
    rows[0] = normalize(rows[0], scale[0]);

    skew[0] = dot(rows[0], rows[1]);
    rows[1] = combine(rows[1], rows[0], 1.0, -skew[0]);

    scale[1] = length(rows[1]);
    rows[1] = normalize(rows[1], scale[1]);
    if scale[1] != 0.0 {
        skew[0] /= scale[1];
    }

    skew[1] = dot(rows[0], rows[2]);
    rows[2] = combine(rows[2], rows[0], 1.0, -skew[1]);
    skew[2] = dot(rows[1], rows[2]);
    rows[2] = combine(rows[2], rows[1], 1.0, -skew[2]);

    skew[0] = skew[0].atan();
    skew[1] = skew[1].atan();
    skew[2] = skew[2].atan();

    scale[2] = length(rows[2]);
    rows[2] = normalize(rows[2], scale[2]);
    if scale[2] != 0.0 {
        skew[1] /= scale[2];
        skew[2] /= scale[2];
    }

    if dot(rows[0], cross(rows[1], rows[2])) < 0.0 {
        for i in 0..3 {
            scale[i] *= -1.0;
            rows[i] = [-rows[i][0], -rows[i][1], -rows[i][2]];
        }
    }

    let m = &rows;
    let mut q = [
        0.5 * (1.0 + m[0][0] - m[1][1] - m[2][2]).max(0.0).sqrt(),
        0.5 * (1.0 - m[0][0] + m[1][1] - m[2][2]).max(0.0).sqrt(),
        0.5 * (1.0 - m[0][0] - m[1][1] + m[2][2]).max(0.0).sqrt(),
        0.5 * (1.0 + m[0][0] + m[1][1] + m[2][2]).max(0.0).sqrt(),
    ];
    if m[2][1] > m[1][2] {
        q[0] = -q[0];
    }
    if m[0][2] > m[2][0] {
        q[1] = -q[1];
    }
    if m[1][0] > m[0][1] {
        q[2] = -q[2];
    }

    let [qx, qy, qz, qw] = q;
    let (qx2, qy2, qz2, qw2) = (qx * qx, qy * qy, qz * qz, qw * qw);
    let test = qx * qy + qz * qw;
    let unit = qw2 + qx2 + qy2 + qz2;

    let rotate = if test > 0.49999 * unit {
        [0.0, (2.0 * qx.atan2(qw)).to_degrees(), 90.0]
    } else if test < -0.49999 * unit {
        [0.0, (-2.0 * qx.atan2(qw)).to_degrees(), -90.0]
    } else {
        [
            (2.0 * qx * qw - 2.0 * qy * qz)
                .atan2(1.0 - 2.0 * qx2 - 2.0 * qz2)
                .to_degrees()
                .round(),
            (2.0 * qy * qw - 2.0 * qx * qz)
                .atan2(1.0 - 2.0 * qy2 - 2.0 * qz2)
                .to_degrees()
                .round(),
            (2.0 * (qx * qy + qz * qw)).clamp(-1.0, 1.0).asin().to_degrees().round(),
        ]
    };

    Decomposed {
        translate: [c[3][0], c[3][1], c[3][2]],
        scale: [round3(scale[0]), round3(scale[1]), round3(scale[2])],
        rotate,
        skew: [
            round3(skew[0].to_degrees()),
            round3(skew[1].to_degrees()),
        ],
    }
}

// ============================================================================
// Unification
// ============================================================================

/// Per-channel token lists for the fallback, start and end states
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformTriple {
    pub fallback: IndexMap<TransformChannel, Vec<Token>>,
    pub from: IndexMap<TransformChannel, Vec<Token>>,
    pub to: IndexMap<TransformChannel, Vec<Token>>,
}

impl TransformTriple {
    pub fn is_empty(&self) -> bool {
        self.from.is_empty() && self.to.is_empty()
    }
}

fn signed_tokens(n: &SignedNumber) -> Vec<Token> {
    vec![Token::Number(n.value), Token::Text(n.unit.clone())]
}

/// Decompose a transform list (relative lengths allowed) into channels
fn decompose_list(uc: &UnitConverter<'_>, list: &str) -> Option<IndexMap<TransformChannel, SignedNumber>> {
    match parse_transform(&matrix_to_absolute(uc, list)) {
        Ok(matrix) => Some(decompose_matrix(&matrix).channels()),
        Err(err) => {
            diagnostics::report(&err);
            None
        }
    }
}

/// Values a key assigns to each of its channels
fn key_values(key: TransformKey, value: &PropertyValue) -> Vec<(TransformChannel, SignedNumber)> {
    match key {
        TransformKey::Channel(channel) => {
            let n = match value {
                PropertyValue::Number(v) => SignedNumber::new(*v, channel.default_unit()),
                other => SignedNumber::parse(&other.to_string()),
            };
            vec![(channel, n)]
        }
        TransformKey::Scale | TransformKey::Translate | TransformKey::Translate3d => {
            let mut parts: Vec<String> = match value {
                PropertyValue::List(items) => items.iter().map(ToString::to_string).collect(),
                other => split_top_level(&other.to_string().replace(',', " "), ' '),
            };
            if key == TransformKey::Scale && parts.len() == 1 {
                parts.push(parts[0].clone());
            }
            key.axes()
                .iter()
                .zip(parts)
                .map(|(channel, part)| (*channel, SignedNumber::parse(&part)))
                .collect()
        }
        TransformKey::Matrix => Vec::new(),
    }
}

/// Compute fallback/from/to channel values for the transform keys of a
/// tween, each combined against the decomposed `current` matrix
pub fn unify_transforms(
    uc: &UnitConverter<'_>,
    current: &Mat4,
    from: &PropertyMap,
    to: &PropertyMap,
) -> TransformTriple {
    let before = decompose_matrix(current).channels();

    let transform_base = |map: &PropertyMap| {
        map.get("transform")
            .and_then(|list| decompose_list(uc, &list.to_string()))
    };

    let mut from_set = transform_base(from).unwrap_or_default();
    for (key, value) in from {
        let Some(transform_key) = TransformKey::parse(key) else {
            continue;
        };
        for (channel, n) in key_values(transform_key, value) {
            let combined = uc.combine(channel.name(), &before[&channel], &n);
            from_set.insert(channel, combined);
        }
    }

    let mut to_set = transform_base(to).unwrap_or_else(|| from_set.clone());
    for (key, value) in to {
        let Some(transform_key) = TransformKey::parse(key) else {
            continue;
        };
        for (channel, n) in key_values(transform_key, value) {
            let prior = from_set.get(&channel).unwrap_or(&before[&channel]);
            let combined = uc.combine(channel.name(), prior, &n);
            to_set.insert(channel, combined);
        }
    }

    let mut channels: Vec<TransformChannel> = from_set.keys().copied().collect();
    for channel in to_set.keys() {
        if !channels.contains(channel) {
            channels.push(*channel);
        }
    }

    let mut triple = TransformTriple::default();
    for channel in channels {
        let name = channel.name();
        let base = &before[&channel];
        let (fallback, _) = uc.resolve_endpoints(name, base, None, from_set.get(&channel));
        let (start, end) =
            uc.resolve_endpoints(name, base, from_set.get(&channel), to_set.get(&channel));
        triple.fallback.insert(channel, signed_tokens(&fallback));
        triple.from.insert(channel, signed_tokens(&start));
        triple.to.insert(channel, signed_tokens(&end));
    }
    triple
}

// ============================================================================
// Reassembly
// ============================================================================

/// Reassemble channel values into a transform string.
///
/// Channels at their identity value are skipped; the rest are emitted in the
/// order translate3d, rotateX, rotateY, rotate, scale, scaleZ, skewX, skewY.
pub fn build_transform_string(values: &IndexMap<TransformChannel, String>) -> String {
    use TransformChannel::*;

    let numeric = |ch: TransformChannel| {
        values
            .get(&ch)
            .and_then(|v| v.parse::<SignedNumber>().ok())
            .map(|n| n.value)
    };
    let differs = |ch: TransformChannel| numeric(ch).is_some_and(|v| v != ch.identity());
    let text = |ch: TransformChannel, default: &str| {
        values.get(&ch).cloned().unwrap_or_else(|| default.to_string())
    };

    let mut parts = Vec::new();
    if differs(TranslateX) || differs(TranslateY) || differs(TranslateZ) {
        parts.push(format!(
            "translate3d({}, {}, {})",
            text(TranslateX, "0px"),
            text(TranslateY, "0px"),
            text(TranslateZ, "0px")
        ));
    }
    if differs(RotateX) {
        parts.push(format!("rotateX({})", text(RotateX, "0deg")));
    }
    if differs(RotateY) {
        parts.push(format!("rotateY({})", text(RotateY, "0deg")));
    }
    if differs(RotateZ) {
        parts.push(format!("rotate({})", text(RotateZ, "0deg")));
    }
    if differs(ScaleX) || differs(ScaleY) {
        parts.push(format!("scale({}, {})", text(ScaleX, "1"), text(ScaleY, "1")));
    }
    if differs(ScaleZ) {
        parts.push(format!("scaleZ({})", text(ScaleZ, "1")));
    }
    if differs(SkewX) {
        parts.push(format!("skewX({})", text(SkewX, "0deg")));
    }
    if differs(SkewY) {
        parts.push(format!("skewY({})", text(SkewY, "0deg")));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::FixedLengths;
    use crate::value::property_map;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_decompose_identity() {
        assert_eq!(decompose_matrix(&Mat4::IDENTITY), Decomposed::default());
    }

    #[test]
    fn test_decompose_translate_rotate_scale() {
        let m = parse_transform("translate(10px, 20px) rotate(30deg) scale(2, 3)").unwrap();
        let d = decompose_matrix(&m);
        assert_eq!(d.translate, [10.0, 20.0, 0.0]);
        assert_eq!(d.rotate, [0.0, 0.0, 30.0]);
        assert_eq!(d.scale, [2.0, 3.0, 1.0]);
        assert_eq!(d.skew, [0.0, 0.0]);
    }

    #[test]
    fn test_decompose_skew() {
        let m = parse_transform("skewX(20deg)").unwrap();
        let d = decompose_matrix(&m);
        assert!(close(d.skew[0], 20.0), "{:?}", d);
    }

    #[test]
    fn test_parse_matrix_function() {
        let m = parse_transform("matrix(1, 0, 0, 1, 15, 25)").unwrap();
        assert_eq!(m.cols[3], [15.0, 25.0, 0.0, 1.0]);
        assert!(parse_transform("none").unwrap().is_identity());
        assert!(parse_transform("wobble(3)").is_err());
        assert!(parse_transform("translate(10%)").is_err());
    }

    #[test]
    fn test_matrix_to_absolute() {
        let ctx = FixedLengths {
            element: (200.0, 80.0),
            ..FixedLengths::default()
        };
        let uc = UnitConverter::new(&ctx);
        assert_eq!(
            matrix_to_absolute(&uc, "translate(50%, 25%) rotate(10deg)"),
            "translate(100px, 20px) rotate(10deg)"
        );
        assert_eq!(matrix_to_absolute(&uc, "translateX(1rem)"), "translateX(16px)");
    }

    #[test]
    fn test_build_order_and_identity_skip() {
        let mut values = IndexMap::new();
        values.insert(TransformChannel::SkewY, "5deg".to_string());
        values.insert(TransformChannel::ScaleX, "2".to_string());
        values.insert(TransformChannel::RotateZ, "45deg".to_string());
        values.insert(TransformChannel::TranslateX, "10px".to_string());
        values.insert(TransformChannel::RotateX, "0deg".to_string());
        values.insert(TransformChannel::ScaleZ, "1".to_string());
        assert_eq!(
            build_transform_string(&values),
            "translate3d(10px, 0px, 0px) rotate(45deg) scale(2, 1) skewY(5deg)"
        );
    }

    #[test]
    fn test_build_identity_is_empty() {
        let values: IndexMap<_, _> = Decomposed::default()
            .channels()
            .into_iter()
            .map(|(ch, n)| (ch, n.to_string()))
            .collect();
        assert_eq!(build_transform_string(&values), "");
    }

    #[test]
    fn test_unify_against_current_matrix() {
        let ctx = FixedLengths::default();
        let uc = UnitConverter::new(&ctx);
        let current = Mat4::translation(30.0, 0.0, 0.0);
        let from = PropertyMap::new();
        let to = property_map([("x", PropertyValue::from("+=20px")), ("scale", 2.0.into())]);
        let triple = unify_transforms(&uc, &current, &from, &to);

        assert_eq!(
            triple.from[&TransformChannel::TranslateX],
            vec![Token::Number(30.0), Token::text("px")]
        );
        assert_eq!(
            triple.to[&TransformChannel::TranslateX],
            vec![Token::Number(50.0), Token::text("px")]
        );
        assert_eq!(
            triple.to[&TransformChannel::ScaleY],
            vec![Token::Number(2.0), Token::text("")]
        );
        assert_eq!(
            triple.fallback[&TransformChannel::ScaleX],
            vec![Token::Number(1.0), Token::text("")]
        );
    }

    #[test]
    fn test_transform_list_in_descriptor() {
        let ctx = FixedLengths::default();
        let uc = UnitConverter::new(&ctx);
        let to = property_map([("transform", "rotate(90deg)")]);
        let triple = unify_transforms(&uc, &Mat4::IDENTITY, &PropertyMap::new(), &to);
        assert_eq!(triple.to.len(), 11);
        assert_eq!(
            triple.to[&TransformChannel::RotateZ],
            vec![Token::Number(90.0), Token::text("deg")]
        );
        assert_eq!(
            triple.from[&TransformChannel::RotateZ],
            vec![Token::Number(0.0), Token::text("deg")]
        );
    }
}
