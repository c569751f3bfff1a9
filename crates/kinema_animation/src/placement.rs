//! Time placement expressions
//!
//! Where a child lands on a timeline: an absolute time in seconds or an
//! expression such as `"mid+=0.5"`, `"<"`, `">-=250ms"` or `"-=25%"`.

use std::fmt;

use indexmap::IndexMap;
use kinema_core::{KinemaError, Result};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, char, digit0, digit1, one_of, satisfy},
    combinator::{all_consuming, map, not, opt, recognize, value},
    multi::many0,
    sequence::{pair, terminated, tuple},
    IResult,
};
use serde::Deserialize;

use crate::controller::non_zero;

/// Durations at or above this are treated as unbounded
pub const UNBOUNDED: f64 = 1e8;

/// A placement as given by the caller
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Placement {
    /// Absolute time in seconds
    Time(f64),
    Expr(String),
}

impl From<f64> for Placement {
    fn from(t: f64) -> Self {
        Placement::Time(t)
    }
}

impl From<&str> for Placement {
    fn from(s: &str) -> Self {
        Placement::Expr(s.to_string())
    }
}

impl From<String> for Placement {
    fn from(s: String) -> Self {
        Placement::Expr(s)
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Time(t) => write!(f, "{t}"),
            Placement::Expr(s) => f.write_str(s),
        }
    }
}

/// What an expression is measured from
#[derive(Clone, Debug, PartialEq)]
pub enum Anchor {
    Label(String),
    /// `<`: start of the previous item
    PreviousStart,
    /// `>`: end of the previous item
    PreviousEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Millis,
    Percent,
}

/// Parsed form of `(label|<|>)?([+-]=)?number?(s|ms|%)?`
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementExpr {
    pub anchor: Option<Anchor>,
    /// `Some(-1.0)` for `-=`, `Some(1.0)` for `+=`
    pub delta: Option<f64>,
    pub amount: Option<f64>,
    pub unit: TimeUnit,
}

impl PlacementExpr {
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || KinemaError::InvalidPlacement(text.to_string());
        let (_, expr) = all_consuming(placement_expr::<nom::error::Error<&str>>)(text.trim())
            .map_err(|_| invalid())?;
        if expr.amount.is_none() && (expr.delta.is_some() || expr.unit != TimeUnit::Seconds) {
            return Err(invalid());
        }
        Ok(expr)
    }

    /// Measured from a reference point rather than from zero
    pub fn is_additive(&self) -> bool {
        self.anchor.is_some() || self.unit == TimeUnit::Percent || self.delta.is_some()
    }
}

/// Label names: a letter, then word characters or hyphens.
///
/// A hyphen directly followed by `=` belongs to a `-=` delta.
fn label_name<'a, E: nom::error::ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        alpha1,
        many0(alt((
            recognize(satisfy(|c: char| c.is_alphanumeric() || c == '_')),
            recognize(terminated(char('-'), not(char('=')))),
        ))),
    ))(input)
}

fn anchor<'a, E: nom::error::ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Anchor, E> {
    alt((
        value(Anchor::PreviousStart, char('<')),
        value(Anchor::PreviousEnd, char('>')),
        map(label_name, |name: &str| Anchor::Label(name.to_string())),
    ))(input)
}

fn delta<'a, E: nom::error::ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, f64, E> {
    alt((value(1.0, tag("+=")), value(-1.0, tag("-="))))(input)
}

fn amount<'a, E: nom::error::ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, f64, E> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        alt((recognize(tuple((digit0, char('.'), digit1))), digit1)),
    )))(input)?;
    match text.parse::<f64>() {
        Ok(n) => Ok((rest, n)),
        Err(_) => Err(nom::Err::Error(E::from_error_kind(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

fn unit<'a, E: nom::error::ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, TimeUnit, E> {
    alt((
        value(TimeUnit::Millis, tag("ms")),
        value(TimeUnit::Seconds, tag("s")),
        value(TimeUnit::Percent, tag("%")),
    ))(input)
}

fn placement_expr<'a, E: nom::error::ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, PlacementExpr, E> {
    map(
        tuple((opt(anchor), opt(delta), opt(amount), opt(unit))),
        |(anchor, delta, amount, unit)| PlacementExpr {
            anchor,
            delta,
            amount,
            unit: unit.unwrap_or(TimeUnit::Seconds),
        },
    )(input)
}

/// Timeline state a placement is resolved against
#[derive(Clone, Copy, Debug)]
pub struct PlacementContext<'a> {
    /// Start and end of the last attached child, `0` when empty
    pub previous_start: f64,
    pub previous_end: f64,
    /// Total duration of the last attached child
    pub previous_total: Option<f64>,
    /// Duration of the timeline itself
    pub parent_duration: f64,
    /// Total duration of the item being placed, if any
    pub item_total: Option<f64>,
    pub labels: &'a IndexMap<String, f64>,
}

impl PlacementContext<'_> {
    /// Absolute time of `expr`.
    ///
    /// A missing label is an error; the caller falls back to the previous
    /// end.
    pub fn resolve(&self, expr: &PlacementExpr) -> Result<f64> {
        let start = match &expr.anchor {
            Some(Anchor::Label(name)) => *self
                .labels
                .get(name)
                .ok_or_else(|| KinemaError::UnknownLabel(name.clone()))?,
            Some(Anchor::PreviousStart) => self.previous_start,
            Some(Anchor::PreviousEnd) | None => self.previous_end,
        };

        let is_label = matches!(expr.anchor, Some(Anchor::Label(_)));
        let multiplier = match expr.unit {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Millis => 1.0 / 1000.0,
            TimeUnit::Percent => match self.item_total {
                None => self.parent_duration / 100.0,
                Some(total) if expr.delta.is_some() || is_label => non_zero(total) / 100.0,
                Some(_) => non_zero(self.previous_total.unwrap_or(0.0)) / 100.0,
            },
        };

        let amount = expr.amount.unwrap_or(0.0) * expr.delta.unwrap_or(1.0);
        let base = if expr.is_additive() { start } else { 0.0 };
        let time = base + amount * multiplier;
        Ok(if time.is_finite() { time } else { self.previous_end })
    }

    /// Resolve a caller placement, reporting failures and falling back to
    /// the previous end
    pub fn place(&self, placement: Option<&Placement>) -> f64 {
        let text = match placement {
            Some(Placement::Time(t)) => return *t,
            Some(Placement::Expr(text)) if !text.trim().is_empty() => text,
            _ => {
                if self.previous_end >= UNBOUNDED {
                    kinema_core::diagnostics::warn(
                        kinema_core::WarningKind::InvalidOption,
                        "placing an item after an unbounded one never starts it",
                    );
                }
                return self.previous_end;
            }
        };
        match PlacementExpr::parse(text).and_then(|expr| self.resolve(&expr)) {
            Ok(time) => time,
            Err(err) => {
                kinema_core::diagnostics::report(&err);
                self.previous_end
            }
        }
    }
}
