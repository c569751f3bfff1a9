//! Shared nom building blocks

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{opt, recognize, value},
    error::{ErrorKind, ParseError as NomParseError},
    sequence::tuple,
    IResult,
};

/// Skip optional whitespace
pub(crate) fn ws<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    value((), multispace0)(input)
}

/// Parse `[+-]?\d*\.?\d+` with an optional exponent
///
/// Unlike `nom::number::complete::float` this leaves `1em` as `1` + `em`.
pub(crate) fn number<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, f64, E> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        alt((recognize(tuple((digit0, char('.'), digit1))), digit1)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;
    match text.parse::<f64>() {
        Ok(n) => Ok((rest, n)),
        Err(_) => Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Float))),
    }
}

/// Parse an identifier (alphanumeric, hyphen, underscore)
pub(crate) fn identifier<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')(input)
}

/// Split on `separator` outside parentheses, trimming each part and
/// dropping empty ones. Whitespace as separator splits on any run of it.
pub fn split_top_level(input: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for c in input.chars() {
        let is_separator = if separator.is_whitespace() {
            c.is_whitespace()
        } else {
            c == separator
        };
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            _ if is_separator && depth == 0 => {
                let part = current.trim();
                if !part.is_empty() {
                    parts.push(part.to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    let part = current.trim();
    if !part.is_empty() {
        parts.push(part.to_string());
    }
    parts
}
