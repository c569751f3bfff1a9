//! Multi-value properties
//!
//! Shadows, filter lists, positions and corner radii hold several values
//! each. Both sides are parsed into the same shape (padding the shorter one
//! with neutral entries) and every item is unified on its own.

use crate::parse::split_top_level;
use crate::property::MultiValueKind;
use crate::token::Token;
use crate::unify::Unifier;

// ============================================================================
// Shadows
// ============================================================================

/// One `box-shadow`/`text-shadow` entry
#[derive(Clone, Debug, PartialEq)]
pub struct Shadow {
    pub x: String,
    pub y: String,
    pub blur: String,
    pub spread: String,
    pub color: String,
}

impl Shadow {
    /// Zero offsets, transparent
    pub fn neutral() -> Self {
        Self {
            x: "0px".to_string(),
            y: "0px".to_string(),
            blur: "0px".to_string(),
            spread: "0px".to_string(),
            color: "rgba(0,0,0,0)".to_string(),
        }
    }
}

/// Parse a comma separated shadow list. `none` is a single neutral shadow.
pub fn parse_shadows(input: &str) -> Vec<Shadow> {
    let input = input.trim();
    if input.is_empty() || input == "none" {
        return vec![Shadow::neutral()];
    }
    split_top_level(input, ',')
        .iter()
        .map(|shadow| {
            let parts = split_top_level(shadow, ' ');
            let color = parts.iter().find(|p| crate::color::is_color(p)).cloned();
            let mut lengths = parts.iter().filter(|p| Some(*p) != color.as_ref());
            let mut next = || lengths.next().cloned().unwrap_or_else(|| "0px".to_string());
            Shadow {
                x: next(),
                y: next(),
                blur: next(),
                spread: next(),
                color: color.clone().unwrap_or_else(|| "currentcolor".to_string()),
            }
        })
        .collect()
}

/// Flatten two shadow lists into equal-length item lists.
///
/// Each shadow contributes `x y blur (spread) color sep`, where `sep` is
/// `","` between shadows and empty after the last one. The shorter list is
/// padded with neutral shadows.
pub fn shadow_items(with_spread: bool, from: &str, to: &str) -> (Vec<String>, Vec<String>) {
    let mut a = parse_shadows(from);
    let mut b = parse_shadows(to);
    let count = a.len().max(b.len());
    a.resize(count, Shadow::neutral());
    b.resize(count, Shadow::neutral());

    let flatten = |shadows: &[Shadow]| {
        let mut items = Vec::new();
        for (i, s) in shadows.iter().enumerate() {
            items.extend([s.x.clone(), s.y.clone(), s.blur.clone()]);
            if with_spread {
                items.push(s.spread.clone());
            }
            items.push(s.color.clone());
            items.push(if i + 1 < count { "," } else { "" }.to_string());
        }
        items
    };
    (flatten(&a), flatten(&b))
}

pub(crate) fn unify_shadows(
    unifier: &Unifier<'_>,
    with_spread: bool,
    from: &str,
    to: &str,
) -> (Vec<Token>, Vec<Token>) {
    let (a, b) = shadow_items(with_spread, from, to);
    let per_shadow = if with_spread { 6 } else { 5 };
    let mut out = (Vec::new(), Vec::new());

    for (i, (start, end)) in a.iter().zip(&b).enumerate() {
        let slot = i % per_shadow;
        if slot == per_shadow - 1 {
            if !start.is_empty() {
                out.0.push(Token::text(", "));
                out.1.push(Token::text(", "));
            }
            continue;
        }
        if slot > 0 {
            out.0.push(Token::text(" "));
            out.1.push(Token::text(" "));
        }
        let (x, y) = if slot == per_shadow - 2 {
            unifier.color_pair(start, end)
        } else {
            unifier.unify_scalar("", Some(start), Some(end), start)
        };
        out.0.extend(x);
        out.1.extend(y);
    }
    out
}

// ============================================================================
// Filters
// ============================================================================

/// Identity argument of a filter function
pub fn filter_default(name: &str) -> Option<&'static str> {
    let value = match name {
        "blur" => "0px",
        "brightness" | "contrast" | "opacity" | "saturate" => "100%",
        "grayscale" | "invert" | "sepia" => "0",
        "hue-rotate" => "0deg",
        "drop-shadow" => "0px 0px 0px rgba(0,0,0,0)",
        _ => return None,
    };
    Some(value)
}

/// `blur(2px) drop-shadow(0 0 2px red)` -> `[(blur, 2px), (drop-shadow, ..)]`
pub fn parse_filters(input: &str) -> Vec<(String, String)> {
    let input = input.trim();
    if input == "none" {
        return Vec::new();
    }
    split_top_level(input, ' ')
        .into_iter()
        .filter_map(|function| {
            let open = function.find('(')?;
            let args = function[open + 1..].strip_suffix(')')?;
            Some((function[..open].trim().to_string(), args.trim().to_string()))
        })
        .collect()
}

type FilterList = Vec<(String, String)>;

/// Align two filter lists on their common name prefix, padding the rest
/// with identity arguments
pub fn align_filters(from: &str, to: &str) -> (FilterList, FilterList) {
    let a = parse_filters(from);
    let b = parse_filters(to);
    let common = a
        .iter()
        .zip(&b)
        .take_while(|(x, y)| x.0 == y.0)
        .count();

    let mut from_out: FilterList = a[..common].to_vec();
    let mut to_out: FilterList = b[..common].to_vec();
    let with_default = |(name, args): &(String, String)| {
        let default = filter_default(name).map(str::to_string).unwrap_or_else(|| args.clone());
        (name.clone(), default)
    };

    if common == a.len() {
        for f in &b[common..] {
            from_out.push(with_default(f));
            to_out.push(f.clone());
        }
    } else if common == b.len() {
        for f in &a[common..] {
            from_out.push(f.clone());
            to_out.push(with_default(f));
        }
    } else {
        for f in &a[common..] {
            from_out.push(f.clone());
            to_out.push(with_default(f));
        }
        for f in &b[common..] {
            from_out.push(with_default(f));
            to_out.push(f.clone());
        }
    }
    (from_out, to_out)
}

pub(crate) fn unify_filters(unifier: &Unifier<'_>, from: &str, to: &str) -> (Vec<Token>, Vec<Token>) {
    let (a, b) = align_filters(from, to);
    let mut out = (Vec::new(), Vec::new());

    for (i, ((name, start), (_, end))) in a.iter().zip(&b).enumerate() {
        if i > 0 {
            out.0.push(Token::text(" "));
            out.1.push(Token::text(" "));
        }
        let (x, y) = if name == "drop-shadow" {
            unify_shadows(unifier, false, start, end)
        } else {
            unifier.unify_scalar(name, Some(start), Some(end), start)
        };
        out.0.push(Token::text(format!("{name}(")));
        out.1.push(Token::text(format!("{name}(")));
        out.0.extend(x);
        out.1.extend(y);
        out.0.push(Token::text(")"));
        out.1.push(Token::text(")"));
    }
    out
}

// ============================================================================
// Positions and corner radii
// ============================================================================

/// Normalize a position into `slots` values (`x y` or `x y z`).
///
/// `left`/`top` map to `0%`, `center` to `50%`, `right`/`bottom` to `100%`;
/// a missing x or y is `50%`, a missing z is `0px`.
pub fn parse_position(slots: usize, input: &str) -> Vec<String> {
    let mut res: [Option<String>; 3] = [None, None, None];
    for part in split_top_level(input, ' ') {
        match part.as_str() {
            "left" | "right" => res[0] = Some(part),
            "top" | "bottom" => res[1] = Some(part),
            _ => {
                if let Some(slot) = res.iter_mut().take(slots).find(|s| s.is_none()) {
                    *slot = Some(part);
                }
            }
        }
    }
    res.into_iter()
        .take(slots)
        .enumerate()
        .map(|(i, value)| {
            let value = value.unwrap_or_else(|| if i == 2 { "0px" } else { "50%" }.to_string());
            match value.as_str() {
                "left" | "top" => "0%".to_string(),
                "center" => "50%".to_string(),
                "right" | "bottom" => "100%".to_string(),
                _ => value,
            }
        })
        .collect()
}

const POSITION_AXES: [&str; 3] = ["elw", "elh", ""];

pub(crate) fn unify_position(
    unifier: &Unifier<'_>,
    kind: MultiValueKind,
    from: &str,
    to: &str,
    fallback: &str,
) -> (Vec<Token>, Vec<Token>) {
    let slots = kind.position_slots();
    let a = parse_position(slots, from);
    let b = parse_position(slots, to);
    let f = parse_position(slots, fallback);
    unify_axes(unifier, &POSITION_AXES[..slots], &a, &b, &f)
}

/// `"h v"` with a single value duplicated
pub fn split_corner_radius(input: &str) -> Vec<String> {
    let mut parts = split_top_level(input, ' ');
    match parts.len() {
        0 => vec!["0px".to_string(), "0px".to_string()],
        1 => {
            parts.push(parts[0].clone());
            parts
        }
        _ => {
            parts.truncate(2);
            parts
        }
    }
}

pub(crate) fn unify_corner_radius(
    unifier: &Unifier<'_>,
    from: &str,
    to: &str,
    fallback: &str,
) -> (Vec<Token>, Vec<Token>) {
    let a = split_corner_radius(from);
    let b = split_corner_radius(to);
    let f = split_corner_radius(fallback);
    unify_axes(unifier, &POSITION_AXES[..2], &a, &b, &f)
}

fn unify_axes(
    unifier: &Unifier<'_>,
    axes: &[&str],
    from: &[String],
    to: &[String],
    fallback: &[String],
) -> (Vec<Token>, Vec<Token>) {
    let mut out = (Vec::new(), Vec::new());
    for (i, axis) in axes.iter().enumerate() {
        if i > 0 {
            out.0.push(Token::text(" "));
            out.1.push(Token::text(" "));
        }
        let (x, y) = unifier.unify_scalar(
            axis,
            from.get(i).map(String::as_str),
            to.get(i).map(String::as_str),
            fallback.get(i).map(String::as_str).unwrap_or_default(),
        );
        out.0.extend(x);
        out.1.extend(y);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(name: &str, args: &str) -> (String, String) {
        (name.to_string(), args.to_string())
    }

    #[test]
    fn test_box_shadow_against_none() {
        let (a, b) = shadow_items(true, "0px 0px 2px red", "none");
        assert_eq!(a.len(), 6);
        assert_eq!(b.len(), 6);
        assert_eq!(a, vec!["0px", "0px", "2px", "0px", "red", ""]);
        assert_eq!(b[4], "rgba(0,0,0,0)");
    }

    #[test]
    fn test_text_shadow_against_none() {
        let (a, b) = shadow_items(false, "none", "1px 1px blue");
        assert_eq!((a.len(), b.len()), (5, 5));
        assert_eq!(a[3], "rgba(0,0,0,0)");
        assert_eq!(b, vec!["1px", "1px", "0px", "blue", ""]);
    }

    #[test]
    fn test_shadow_list_padding() {
        let (a, b) = shadow_items(true, "1px 1px red, 2px 2px blue", "3px 3px green");
        assert_eq!((a.len(), b.len()), (12, 12));
        assert_eq!(a[5], ",");
        assert_eq!(b[5], ",");
        assert_eq!(b[10], "rgba(0,0,0,0)");
    }

    #[test]
    fn test_filter_common_prefix() {
        let (a, b) = align_filters("blur(2px) sepia(1)", "blur(4px)");
        assert_eq!(a, vec![filter("blur", "2px"), filter("sepia", "1")]);
        assert_eq!(b, vec![filter("blur", "4px"), filter("sepia", "0")]);
    }

    #[test]
    fn test_filter_mismatch_concatenates() {
        let (a, b) = align_filters("brightness(50%)", "hue-rotate(90deg)");
        let names: Vec<&str> = a.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["brightness", "hue-rotate"]);
        assert_eq!(a[1].1, "0deg");
        assert_eq!(b[0].1, "100%");
        assert_eq!(b[1].1, "90deg");
    }

    #[test]
    fn test_filter_nested_parens() {
        let filters = parse_filters("drop-shadow(0 0 2px rgb(0, 0, 0)) blur(1px)");
        assert_eq!(filters[0], filter("drop-shadow", "0 0 2px rgb(0, 0, 0)"));
        assert_eq!(filters[1], filter("blur", "1px"));
        assert!(parse_filters("none").is_empty());
    }

    #[test]
    fn test_position_keywords() {
        assert_eq!(parse_position(2, "right top"), vec!["100%", "0%"]);
        assert_eq!(parse_position(2, "top"), vec!["50%", "0%"]);
        assert_eq!(parse_position(3, "10px 20px"), vec!["10px", "20px", "0px"]);
        assert_eq!(parse_position(3, "center"), vec!["50%", "50%", "0px"]);
    }

    #[test]
    fn test_corner_radius_split() {
        assert_eq!(split_corner_radius("4px"), vec!["4px", "4px"]);
        assert_eq!(split_corner_radius("4px 8px"), vec!["4px", "8px"]);
    }
}
