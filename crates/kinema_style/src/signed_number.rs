//! Signed numbers
//!
//! A number with an optional unit and an optional `+=`/`-=` prefix marking
//! it as a delta against a prior value (`"+=10px"`, `"45deg"`, `".5"`).

use std::fmt;
use std::str::FromStr;

use kinema_core::diagnostics;
use kinema_core::{KinemaError, Result};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::{all_consuming, opt},
    error::ParseError as NomParseError,
    IResult,
};

use crate::parse::{number, ws};

/// Number with unit and relative flag
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignedNumber {
    /// `true` for `+=`/`-=` deltas
    pub relative: bool,
    /// Magnitude, already negated for `-=`
    pub value: f64,
    /// Unit suffix, empty when absent
    pub unit: String,
}

impl SignedNumber {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            relative: false,
            value,
            unit: unit.into(),
        }
    }

    pub fn relative(value: f64, unit: impl Into<String>) -> Self {
        Self {
            relative: true,
            value,
            unit: unit.into(),
        }
    }

    /// `(false, 0, "")`, the substitute for unparseable input
    pub fn zero() -> Self {
        Self::default()
    }

    /// Parse leniently: malformed text is reported and yields [`SignedNumber::zero`]
    pub fn parse(text: &str) -> Self {
        match text.parse() {
            Ok(n) => n,
            Err(err) => {
                diagnostics::report(&err);
                Self::zero()
            }
        }
    }

    /// Whether `text` matches `[+-]=? number unit?`
    pub fn is_signable(text: &str) -> bool {
        text.parse::<SignedNumber>().is_ok()
    }

    /// The unit, or `default` when none was given
    pub fn unit_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.unit.is_empty() {
            default
        } else {
            &self.unit
        }
    }

    /// Same number with `unit` filled in when it has none
    pub fn with_default_unit(mut self, unit: &str) -> Self {
        if self.unit.is_empty() {
            self.unit = unit.to_string();
        }
        self
    }
}

impl FromStr for SignedNumber {
    type Err = KinemaError;

    fn from_str(s: &str) -> Result<Self> {
        all_consuming(parse_signed_number::<nom::error::Error<&str>>)(s)
            .map(|(_, n)| n)
            .map_err(|_| KinemaError::InvalidNumber(s.to_string()))
    }
}

/// Renders `value` and `unit` without the relative prefix
impl fmt::Display for SignedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

impl From<f64> for SignedNumber {
    fn from(value: f64) -> Self {
        Self::new(value, "")
    }
}

/// `\s*([+-]=)?\s*number\s*([a-z%Q]+)?\s*`
pub(crate) fn parse_signed_number<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, SignedNumber, E> {
    let (input, _) = ws(input)?;
    let (input, op) = opt(alt((tag("+="), tag("-="))))(input)?;
    let (input, _) = ws(input)?;
    let (input, value) = number(input)?;
    let (input, _) = ws(input)?;
    let (input, unit) = opt(take_while1(|c: char| {
        c.is_ascii_lowercase() || c == '%' || c == 'Q'
    }))(input)?;
    let (input, _) = ws(input)?;

    let sign = if op == Some("-=") { -1.0 } else { 1.0 };
    Ok((
        input,
        SignedNumber {
            relative: op.is_some(),
            value: value * sign,
            unit: unit.unwrap_or("").to_string(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_core::diagnostics::{with_warning_sink, CollectingSink};
    use kinema_core::WarningKind;
    use std::sync::Arc;

    #[test]
    fn test_parse_relative() {
        assert_eq!(
            SignedNumber::parse("+=10px"),
            SignedNumber::relative(10.0, "px")
        );
        assert_eq!(
            SignedNumber::parse("-=2.5rem"),
            SignedNumber::relative(-2.5, "rem")
        );
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(SignedNumber::parse(" 45deg "), SignedNumber::new(45.0, "deg"));
        assert_eq!(SignedNumber::parse(".5"), SignedNumber::new(0.5, ""));
        assert_eq!(SignedNumber::parse("-3Q"), SignedNumber::new(-3.0, "Q"));
        assert_eq!(SignedNumber::parse("50%"), SignedNumber::new(50.0, "%"));
    }

    #[test]
    fn test_parse_invalid_reports() {
        let sink = Arc::new(CollectingSink::new());
        let n = with_warning_sink(sink.clone(), || SignedNumber::parse("auto"));
        assert_eq!(n, SignedNumber::zero());
        assert_eq!(sink.count(WarningKind::Parse), 1);
    }

    #[test]
    fn test_is_signable() {
        assert!(SignedNumber::is_signable("10"));
        assert!(SignedNumber::is_signable("+=1turn"));
        assert!(!SignedNumber::is_signable("red"));
        assert!(!SignedNumber::is_signable("10px 20px"));
        assert!(!SignedNumber::is_signable("10PX"));
    }

    #[test]
    fn test_display() {
        assert_eq!(SignedNumber::new(10.0, "px").to_string(), "10px");
        assert_eq!(SignedNumber::new(0.25, "").to_string(), "0.25");
    }
}
