//! Color parsing
//!
//! Colors are normalized to `[r, g, b, a]` (0–255, 0–255, 0–255, 0–1) so
//! they interpolate channel by channel.
//!
//! Supported: hex (`#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`), `rgb()`/`rgba()`
//! and `hsl()`/`hsla()` in comma or space syntax, every CSS named color and
//! `transparent`. Keywords with no closed form (`currentcolor`, `inherit`,
//! system colors) are resolved through a probe supplied by the target.

use kinema_core::diagnostics;
use kinema_core::{KinemaError, Result, Rgba};
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::char,
    combinator::{all_consuming, opt},
    error::{ErrorKind, ParseError as NomParseError},
    IResult,
};

use crate::parse::{number, ws};
use crate::token::Token;

// ============================================================================
// Public API
// ============================================================================

/// Parse a color with a closed-form definition
pub fn parse_color(input: &str) -> Result<Rgba> {
    let input = input.trim();
    if let Ok((_, color)) = all_consuming(parse_hex_color::<nom::error::Error<&str>>)(input) {
        return Ok(color);
    }
    if let Ok((_, color)) = all_consuming(parse_rgb_function::<nom::error::Error<&str>>)(input) {
        return Ok(color);
    }
    if let Ok((_, color)) = all_consuming(parse_hsl_function::<nom::error::Error<&str>>)(input) {
        return Ok(color);
    }
    parse_named_color(input).ok_or_else(|| KinemaError::InvalidColor(input.to_string()))
}

/// Whether `input` denotes a color, including keyword colors that need a probe
pub fn is_color(input: &str) -> bool {
    parse_color(input).is_ok() || is_keyword_color(input.trim())
}

/// Resolve a color, asking `probe` for keyword colors.
///
/// Anything unresolvable is reported and becomes transparent.
pub fn resolve_color(input: &str, probe: &dyn Fn(&str) -> Option<Rgba>) -> Rgba {
    match parse_color(input) {
        Ok(color) => color,
        Err(err) => match probe(input.trim()) {
            Some(color) => color,
            None => {
                diagnostics::report(&err);
                Rgba::TRANSPARENT
            }
        },
    }
}

/// Tokens `rgba( r , g , b , a )`
pub fn color_tokens(color: Rgba) -> Vec<Token> {
    vec![
        Token::text("rgba("),
        Token::Number(color.r),
        Token::text(","),
        Token::Number(color.g),
        Token::text(","),
        Token::Number(color.b),
        Token::text(","),
        Token::Number(color.a),
        Token::text(")"),
    ]
}

fn is_keyword_color(input: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "currentcolor",
        "inherit",
        "initial",
        "unset",
        "revert",
        "canvas",
        "canvastext",
        "linktext",
        "visitedtext",
        "activetext",
        "buttonface",
        "buttontext",
        "buttonborder",
        "field",
        "fieldtext",
        "highlight",
        "highlighttext",
        "selecteditem",
        "selecteditemtext",
        "mark",
        "marktext",
        "graytext",
        "accentcolor",
        "accentcolortext",
    ];
    let lower = input.to_ascii_lowercase();
    KEYWORDS.contains(&lower.as_str())
}

// ============================================================================
// Parsers
// ============================================================================

/// Parse hex color: #RGB, #RGBA, #RRGGBB or #RRGGBBAA
fn parse_hex_color<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Rgba, E> {
    let (rest, _) = char('#')(input)?;
    let (rest, hex) = take_while1(|c: char| c.is_ascii_hexdigit())(rest)?;

    let digits: Vec<u8> = match hex.len() {
        3 | 4 => hex
            .chars()
            .filter_map(|c| c.to_digit(16))
            .map(|d| (d * 17) as u8)
            .collect(),
        6 | 8 => (0..hex.len() / 2)
            .filter_map(|i| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok())
            .collect(),
        _ => {
            return Err(nom::Err::Error(E::from_error_kind(
                input,
                ErrorKind::LengthValue,
            )));
        }
    };

    let alpha = digits.get(3).map(|a| *a as f64 / 255.0).unwrap_or(1.0);
    Ok((
        rest,
        Rgba::new(digits[0] as f64, digits[1] as f64, digits[2] as f64, alpha),
    ))
}

/// Separator between channels: comma or whitespace
fn channel_separator<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    let (input, _) = ws(input)?;
    let (input, _) = opt(char(','))(input)?;
    ws(input)
}

/// Optional alpha after `,` or `/`; percentages become fractions
fn alpha_channel<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, f64, E> {
    let (input, _) = ws(input)?;
    let (input, _) = alt((char(','), char('/')))(input)?;
    let (input, _) = ws(input)?;
    let (input, a) = number(input)?;
    let (input, percent) = opt(char('%'))(input)?;
    Ok((input, if percent.is_some() { a / 100.0 } else { a }))
}

/// rgb channel: number (0–255) or percentage
fn rgb_channel<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, f64, E> {
    let (input, v) = number(input)?;
    let (input, percent) = opt(char('%'))(input)?;
    Ok((input, if percent.is_some() { v * 2.55 } else { v }))
}

/// Parse rgb(r, g, b) / rgba(r, g, b, a) / rgb(r g b / a)
fn parse_rgb_function<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Rgba, E> {
    let (input, _) = alt((tag_no_case("rgba"), tag_no_case("rgb")))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char('(')(input)?;
    let (input, _) = ws(input)?;
    let (input, r) = rgb_channel(input)?;
    let (input, _) = channel_separator(input)?;
    let (input, g) = rgb_channel(input)?;
    let (input, _) = channel_separator(input)?;
    let (input, b) = rgb_channel(input)?;
    let (input, a) = opt(alpha_channel)(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(')')(input)?;

    Ok((input, Rgba::new(r, g, b, a.unwrap_or(1.0))))
}

/// Parse hsl(h, s%, l%) / hsla(h, s%, l%, a) / hsl(h s l / a)
fn parse_hsl_function<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Rgba, E> {
    let (input, _) = alt((tag_no_case("hsla"), tag_no_case("hsl")))(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char('(')(input)?;
    let (input, _) = ws(input)?;
    let (input, h) = number(input)?;
    let (input, hue_unit) = opt(alt((tag("deg"), tag("turn"), tag("grad"), tag("rad"))))(input)?;
    let (input, _) = channel_separator(input)?;
    let (input, s) = number(input)?;
    let (input, _) = opt(char('%'))(input)?;
    let (input, _) = channel_separator(input)?;
    let (input, l) = number(input)?;
    let (input, _) = opt(char('%'))(input)?;
    let (input, a) = opt(alpha_channel)(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char(')')(input)?;

    let degrees = match hue_unit {
        Some("turn") => h * 360.0,
        Some("grad") => h * 0.9,
        Some("rad") => h.to_degrees(),
        _ => h,
    };
    let (r, g, b) = hsl_to_rgb(degrees, s / 100.0, l / 100.0);
    Ok((input, Rgba::new(r, g, b, a.unwrap_or(1.0))))
}

/// HSL (degrees, 0–1, 0–1) to rounded 0–255 channels
fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let h = h.rem_euclid(360.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (
        ((r + m) * 255.0).round(),
        ((g + m) * 255.0).round(),
        ((b + m) * 255.0).round(),
    )
}

/// Parse named colors
fn parse_named_color(name: &str) -> Option<Rgba> {
    let lower = name.to_ascii_lowercase();
    if lower == "transparent" {
        return Some(Rgba::TRANSPARENT);
    }
    NAMED_COLORS
        .binary_search_by(|(n, _)| n.cmp(&lower.as_str()))
        .ok()
        .map(|i| {
            let rgb = NAMED_COLORS[i].1;
            Rgba::rgb(
                ((rgb >> 16) & 0xff) as f64,
                ((rgb >> 8) & 0xff) as f64,
                (rgb & 0xff) as f64,
            )
        })
}

/// CSS named colors, sorted by name
static NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xf0f8ff),
    ("antiquewhite", 0xfaebd7),
    ("aqua", 0x00ffff),
    ("aquamarine", 0x7fffd4),
    ("azure", 0xf0ffff),
    ("beige", 0xf5f5dc),
    ("bisque", 0xffe4c4),
    ("black", 0x000000),
    ("blanchedalmond", 0xffebcd),
    ("blue", 0x0000ff),
    ("blueviolet", 0x8a2be2),
    ("brown", 0xa52a2a),
    ("burlywood", 0xdeb887),
    ("cadetblue", 0x5f9ea0),
    ("chartreuse", 0x7fff00),
    ("chocolate", 0xd2691e),
    ("coral", 0xff7f50),
    ("cornflowerblue", 0x6495ed),
    ("cornsilk", 0xfff8dc),
    ("crimson", 0xdc143c),
    ("cyan", 0x00ffff),
    ("darkblue", 0x00008b),
    ("darkcyan", 0x008b8b),
    ("darkgoldenrod", 0xb8860b),
    ("darkgray", 0xa9a9a9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xa9a9a9),
    ("darkkhaki", 0xbdb76b),
    ("darkmagenta", 0x8b008b),
    ("darkolivegreen", 0x556b2f),
    ("darkorange", 0xff8c00),
    ("darkorchid", 0x9932cc),
    ("darkred", 0x8b0000),
    ("darksalmon", 0xe9967a),
    ("darkseagreen", 0x8fbc8f),
    ("darkslateblue", 0x483d8b),
    ("darkslategray", 0x2f4f4f),
    ("darkslategrey", 0x2f4f4f),
    ("darkturquoise", 0x00ced1),
    ("darkviolet", 0x9400d3),
    ("deeppink", 0xff1493),
    ("deepskyblue", 0x00bfff),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1e90ff),
    ("firebrick", 0xb22222),
    ("floralwhite", 0xfffaf0),
    ("forestgreen", 0x228b22),
    ("fuchsia", 0xff00ff),
    ("gainsboro", 0xdcdcdc),
    ("ghostwhite", 0xf8f8ff),
    ("gold", 0xffd700),
    ("goldenrod", 0xdaa520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xadff2f),
    ("grey", 0x808080),
    ("honeydew", 0xf0fff0),
    ("hotpink", 0xff69b4),
    ("indianred", 0xcd5c5c),
    ("indigo", 0x4b0082),
    ("ivory", 0xfffff0),
    ("khaki", 0xf0e68c),
    ("lavender", 0xe6e6fa),
    ("lavenderblush", 0xfff0f5),
    ("lawngreen", 0x7cfc00),
    ("lemonchiffon", 0xfffacd),
    ("lightblue", 0xadd8e6),
    ("lightcoral", 0xf08080),
    ("lightcyan", 0xe0ffff),
    ("lightgoldenrodyellow", 0xfafad2),
    ("lightgray", 0xd3d3d3),
    ("lightgreen", 0x90ee90),
    ("lightgrey", 0xd3d3d3),
    ("lightpink", 0xffb6c1),
    ("lightsalmon", 0xffa07a),
    ("lightseagreen", 0x20b2aa),
    ("lightskyblue", 0x87cefa),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xb0c4de),
    ("lightyellow", 0xffffe0),
    ("lime", 0x00ff00),
    ("limegreen", 0x32cd32),
    ("linen", 0xfaf0e6),
    ("magenta", 0xff00ff),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66cdaa),
    ("mediumblue", 0x0000cd),
    ("mediumorchid", 0xba55d3),
    ("mediumpurple", 0x9370db),
    ("mediumseagreen", 0x3cb371),
    ("mediumslateblue", 0x7b68ee),
    ("mediumspringgreen", 0x00fa9a),
    ("mediumturquoise", 0x48d1cc),
    ("mediumvioletred", 0xc71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xf5fffa),
    ("mistyrose", 0xffe4e1),
    ("moccasin", 0xffe4b5),
    ("navajowhite", 0xffdead),
    ("navy", 0x000080),
    ("oldlace", 0xfdf5e6),
    ("olive", 0x808000),
    ("olivedrab", 0x6b8e23),
    ("orange", 0xffa500),
    ("orangered", 0xff4500),
    ("orchid", 0xda70d6),
    ("palegoldenrod", 0xeee8aa),
    ("palegreen", 0x98fb98),
    ("paleturquoise", 0xafeeee),
    ("palevioletred", 0xdb7093),
    ("papayawhip", 0xffefd5),
    ("peachpuff", 0xffdab9),
    ("peru", 0xcd853f),
    ("pink", 0xffc0cb),
    ("plum", 0xdda0dd),
    ("powderblue", 0xb0e0e6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xff0000),
    ("rosybrown", 0xbc8f8f),
    ("royalblue", 0x4169e1),
    ("saddlebrown", 0x8b4513),
    ("salmon", 0xfa8072),
    ("sandybrown", 0xf4a460),
    ("seagreen", 0x2e8b57),
    ("seashell", 0xfff5ee),
    ("sienna", 0xa0522d),
    ("silver", 0xc0c0c0),
    ("skyblue", 0x87ceeb),
    ("slateblue", 0x6a5acd),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xfffafa),
    ("springgreen", 0x00ff7f),
    ("steelblue", 0x4682b4),
    ("tan", 0xd2b48c),
    ("teal", 0x008080),
    ("thistle", 0xd8bfd8),
    ("tomato", 0xff6347),
    ("turquoise", 0x40e0d0),
    ("violet", 0xee82ee),
    ("wheat", 0xf5deb3),
    ("white", 0xffffff),
    ("whitesmoke", 0xf5f5f5),
    ("yellow", 0xffff00),
    ("yellowgreen", 0x9acd32),
];
