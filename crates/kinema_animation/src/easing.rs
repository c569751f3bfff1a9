//! Easing functions for animations
//!
//! Every curve maps `[0, 1]` to a value that starts at 0 and ends at 1;
//! back and elastic curves overshoot in between.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use kinema_core::diagnostics;
use kinema_core::{KinemaError, Result};
use nom::{
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt},
    multi::separated_list0,
    number::complete::double,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use serde::Deserialize;

/// Custom easing function
pub type EaseFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Easing function type
#[derive(Clone, Default, Deserialize)]
#[serde(from = "String")]
pub enum Easing {
    #[default]
    Linear,
    /// `x^(p+1)`
    PowerIn(f64),
    PowerOut(f64),
    PowerInOut(f64),
    /// Rounds to the nearest of `n` steps
    Steps(u32),
    BounceIn,
    BounceOut,
    BounceInOut,
    /// Damped oscillation with the given frequency
    ElasticIn(f64),
    ElasticOut(f64),
    ElasticInOut(f64),
    /// Overshoot by the given magnitude
    BackIn(f64),
    BackOut(f64),
    BackInOut(f64),
    CubicBezier(f64, f64, f64, f64),
    Custom(EaseFn),
}

pub const DEFAULT_POWER: f64 = 1.0;
pub const DEFAULT_STEPS: u32 = 3;
pub const DEFAULT_FREQUENCY: f64 = 6.0;
pub const DEFAULT_MAGNITUDE: f64 = 1.70158;

impl Easing {
    /// Default controller ease
    pub fn power_in_out() -> Self {
        Easing::PowerInOut(DEFAULT_POWER)
    }

    pub fn custom(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Easing::Custom(Arc::new(f))
    }

    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::PowerIn(p) => t.powf(p + 1.0),
            Easing::PowerOut(p) => 1.0 - (1.0 - t).powf(p + 1.0),
            Easing::PowerInOut(p) => {
                if t < 0.5 {
                    0.5 * (2.0 * t).powf(p + 1.0)
                } else {
                    1.0 - 0.5 * (2.0 * (1.0 - t)).powf(p + 1.0)
                }
            }
            Easing::Steps(n) => {
                let step = 1.0 / (*n).max(1) as f64;
                ((t + step / 2.0) / step).floor() * step
            }
            Easing::BounceIn => 1.0 - bounce_out(1.0 - t),
            Easing::BounceOut => bounce_out(t),
            Easing::BounceInOut => {
                if t < 0.5 {
                    0.5 * (1.0 - bounce_out(1.0 - t * 2.0))
                } else {
                    0.5 * bounce_out(t * 2.0 - 1.0) + 0.5
                }
            }
            Easing::ElasticIn(f) => 1.0 - elastic_out(1.0 - t, *f),
            Easing::ElasticOut(f) => elastic_out(t, *f),
            Easing::ElasticInOut(f) => {
                if t < 0.5 {
                    (1.0 - elastic_out(1.0 - t * 2.0, *f)) * 0.5
                } else {
                    elastic_out(t * 2.0 - 1.0, *f) * 0.5 + 0.5
                }
            }
            Easing::BackIn(m) => back_in(t, *m),
            Easing::BackOut(m) => back_out(t, *m),
            Easing::BackInOut(m) => {
                if t < 0.5 {
                    0.5 * back_in(t * 2.0, *m)
                } else {
                    0.5 * back_out(t * 2.0 - 1.0, *m) + 0.5
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
            Easing::Custom(f) => f(t),
        }
    }

    /// Parse `name` or `name(args)`.
    ///
    /// Unknown names are reported and yield [`Easing::Linear`].
    pub fn parse(text: &str) -> Self {
        match Self::try_parse(text) {
            Ok(ease) => ease,
            Err(err) => {
                diagnostics::report(&err);
                Easing::Linear
            }
        }
    }

    pub fn try_parse(text: &str) -> Result<Self> {
        let invalid = || KinemaError::InvalidEase(text.to_string());
        let (_, (name, args)) =
            all_consuming(ease_call::<nom::error::Error<&str>>)(text.trim()).map_err(|_| invalid())?;
        let arg = |i: usize, default: f64| args.get(i).copied().unwrap_or(default);

        let ease = match name {
            "none" | "linear" => Easing::Linear,
            "powerIn" => Easing::PowerIn(arg(0, DEFAULT_POWER)),
            "powerOut" => Easing::PowerOut(arg(0, DEFAULT_POWER)),
            "powerInOut" => Easing::PowerInOut(arg(0, DEFAULT_POWER)),
            "steps" => {
                let n = arg(0, DEFAULT_STEPS as f64);
                if n < 1.0 {
                    return Err(invalid());
                }
                Easing::Steps(n as u32)
            }
            "bounceIn" => Easing::BounceIn,
            "bounceOut" => Easing::BounceOut,
            "bounceInOut" => Easing::BounceInOut,
            "elasticIn" => Easing::ElasticIn(arg(0, DEFAULT_FREQUENCY)),
            "elasticOut" => Easing::ElasticOut(arg(0, DEFAULT_FREQUENCY)),
            "elasticInOut" => Easing::ElasticInOut(arg(0, DEFAULT_FREQUENCY)),
            "backIn" => Easing::BackIn(arg(0, DEFAULT_MAGNITUDE)),
            "backOut" => Easing::BackOut(arg(0, DEFAULT_MAGNITUDE)),
            "backInOut" => Easing::BackInOut(arg(0, DEFAULT_MAGNITUDE)),
            "cubicBezier" | "cubic-bezier" => match args.as_slice() {
                [x1, y1, x2, y2] => Easing::CubicBezier(*x1, *y1, *x2, *y2),
                _ => return Err(invalid()),
            },
            // CSS keywords
            "ease" => Easing::CubicBezier(0.25, 0.1, 0.25, 1.0),
            "ease-in" => Easing::CubicBezier(0.42, 0.0, 1.0, 1.0),
            "ease-out" => Easing::CubicBezier(0.0, 0.0, 0.58, 1.0),
            "ease-in-out" => Easing::CubicBezier(0.42, 0.0, 0.58, 1.0),
            _ => return Err(invalid()),
        };
        Ok(ease)
    }
}

/// `name` or `name(a, b, ...)`
fn ease_call<'a, E: nom::error::ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (&'a str, Vec<f64>), E> {
    let arguments = delimited(
        char('('),
        separated_list0(char(','), delimited(multispace0, double, multispace0)),
        preceded(multispace0, char(')')),
    );
    pair(
        take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_'),
        terminated(map(opt(arguments), Option::unwrap_or_default), multispace0),
    )(input)
}

fn bounce_out(mut x: f64) -> f64 {
    const N: f64 = 7.5625;
    const D: f64 = 2.75;
    if x < 1.0 / D {
        N * x * x
    } else if x < 2.0 / D {
        x -= 1.5 / D;
        N * x * x + 0.75
    } else if x < 2.5 / D {
        x -= 2.25 / D;
        N * x * x + 0.9375
    } else {
        x -= 2.625 / D;
        N * x * x + 0.984375
    }
}

fn elastic_out(x: f64, frequency: f64) -> f64 {
    if x < 0.0 {
        return 0.0;
    }
    if x > 1.0 {
        return 1.0;
    }
    let decay = 0.025f64.powf(x);
    let oscillation = x.powf(frequency * frequency);
    1.0 + (x * frequency * PI - PI / 2.0).sin() * decay * (1.0 - oscillation) * (1.0 - x)
}

fn back_in(x: f64, m: f64) -> f64 {
    x * x * ((m + 1.0) * x - m)
}

fn back_out(x: f64, m: f64) -> f64 {
    let x = x - 1.0;
    1.0 + x * x * ((m + 1.0) * x + m)
}

/// Cubic bezier easing calculation (matches CSS / browser implementations).
///
/// Uses Newton-Raphson with binary-search fallback for robustness.
fn cubic_bezier_ease(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // Endpoints are always exact
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    // Solve for parameter `p` where bezier_x(p) == t using Newton-Raphson,
    // falling back to binary search if the slope is too flat.
    let mut p = t;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - t;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2);
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = t;
    for _ in 0..30 {
        let val = bezier_sample(p, x1, x2);
        if (val - t).abs() < 1e-7 {
            break;
        }
        if val < t {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2)
}

/// Evaluate cubic bezier at parameter t: B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

/// Derivative of cubic bezier: B'(t) = 3(1-t)²·p1 + 6(1-t)t·(p2-p1) + 3t²·(1-p2)
#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}

impl FromStr for Easing {
    type Err = KinemaError;

    fn from_str(s: &str) -> Result<Self> {
        Easing::try_parse(s)
    }
}

impl From<String> for Easing {
    fn from(s: String) -> Self {
        Easing::parse(&s)
    }
}

impl From<&str> for Easing {
    fn from(s: &str) -> Self {
        Easing::parse(s)
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Easing::Linear => f.write_str("linear"),
            Easing::PowerIn(p) => write!(f, "powerIn({p})"),
            Easing::PowerOut(p) => write!(f, "powerOut({p})"),
            Easing::PowerInOut(p) => write!(f, "powerInOut({p})"),
            Easing::Steps(n) => write!(f, "steps({n})"),
            Easing::BounceIn => f.write_str("bounceIn"),
            Easing::BounceOut => f.write_str("bounceOut"),
            Easing::BounceInOut => f.write_str("bounceInOut"),
            Easing::ElasticIn(v) => write!(f, "elasticIn({v})"),
            Easing::ElasticOut(v) => write!(f, "elasticOut({v})"),
            Easing::ElasticInOut(v) => write!(f, "elasticInOut({v})"),
            Easing::BackIn(v) => write!(f, "backIn({v})"),
            Easing::BackOut(v) => write!(f, "backOut({v})"),
            Easing::BackInOut(v) => write!(f, "backInOut({v})"),
            Easing::CubicBezier(a, b, c, d) => write!(f, "cubicBezier({a}, {b}, {c}, {d})"),
            Easing::Custom(_) => f.write_str("custom"),
        }
    }
}

impl PartialEq for Easing {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Easing::Custom(a), Easing::Custom(b)) => Arc::ptr_eq(a, b),
            (Easing::Custom(_), _) | (_, Easing::Custom(_)) => false,
            _ => self.to_string() == other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_core::diagnostics::{with_warning_sink, CollectingSink};
    use kinema_core::WarningKind;

    const ALL: [&str; 16] = [
        "linear",
        "powerIn(2)",
        "powerOut",
        "powerInOut(3)",
        "steps(4)",
        "bounceIn",
        "bounceOut",
        "bounceInOut",
        "elasticIn",
        "elasticOut(4)",
        "elasticInOut",
        "backIn",
        "backOut",
        "backInOut(2)",
        "cubicBezier(0.1, 0.7, 1.0, 0.1)",
        "ease-in-out",
    ];

    #[test]
    fn test_endpoints() {
        for name in ALL {
            let ease = Easing::parse(name);
            assert!(ease.apply(0.0).abs() < 1e-9, "{name} at 0");
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-9, "{name} at 1");
        }
    }

    #[test]
    fn test_power_curves() {
        assert_eq!(Easing::PowerIn(1.0).apply(0.5), 0.25);
        assert_eq!(Easing::PowerOut(1.0).apply(0.5), 0.75);
        assert_eq!(Easing::power_in_out().apply(0.25), 0.125);
        assert_eq!(Easing::power_in_out().apply(0.5), 0.5);
    }

    #[test]
    fn test_steps_round_to_nearest() {
        let ease = Easing::Steps(4);
        assert_eq!(ease.apply(0.1), 0.0);
        assert_eq!(ease.apply(0.2), 0.25);
        assert_eq!(ease.apply(0.9), 1.0);
    }

    #[test]
    fn test_back_overshoots() {
        assert!(Easing::BackIn(DEFAULT_MAGNITUDE).apply(0.2) < 0.0);
        assert!(Easing::BackOut(DEFAULT_MAGNITUDE).apply(0.8) > 1.0);
    }

    #[test]
    fn test_cubic_bezier_keyword() {
        let ease = Easing::parse("ease-in-out");
        assert_eq!(ease, Easing::CubicBezier(0.42, 0.0, 0.58, 1.0));
        assert!((ease.apply(0.5) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(Easing::parse("powerOut(2)"), Easing::PowerOut(2.0));
        assert_eq!(Easing::parse(" elasticIn( 3 ) "), Easing::ElasticIn(3.0));
        assert_eq!(Easing::parse("backOut()"), Easing::BackOut(DEFAULT_MAGNITUDE));
        assert_eq!("none".parse::<Easing>(), Ok(Easing::Linear));
    }

    #[test]
    fn test_unknown_ease_warns() {
        let sink = Arc::new(CollectingSink::new());
        let ease = with_warning_sink(sink.clone(), || Easing::parse("wobble(2)"));
        assert_eq!(ease, Easing::Linear);
        assert_eq!(sink.count(WarningKind::Parse), 1);
        assert!(Easing::try_parse("cubicBezier(1, 2)").is_err());
    }

    #[test]
    fn test_custom() {
        let ease = Easing::custom(|t| t * t);
        assert_eq!(ease.apply(0.5), 0.25);
        assert_eq!(ease, ease.clone());
        assert_ne!(ease, Easing::custom(|t| t * t));
    }

    #[test]
    fn test_display_round_trip() {
        for name in ALL {
            let ease = Easing::parse(name);
            assert_eq!(Easing::parse(&ease.to_string()), ease);
        }
    }
}
