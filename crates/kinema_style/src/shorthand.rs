//! Shorthand expansion
//!
//! `border`, `outline`, `margin`, `padding` and `borderRadius` are split into
//! their longhands before unification so each longhand interpolates on its
//! own.

use crate::color::is_color;
use crate::parse::split_top_level;
use crate::property::ShorthandKind;
use crate::signed_number::SignedNumber;

const BORDER_STYLES: [&str; 10] = [
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

/// Expand `key: value` into longhand `(key, value)` pairs
pub fn expand_shorthand(kind: ShorthandKind, key: &str, value: &str) -> Vec<(String, String)> {
    match kind {
        ShorthandKind::Stroke => expand_stroke(key, value),
        ShorthandKind::Sides => expand_sides(key, value),
        ShorthandKind::BorderRadius => expand_border_radius(value),
    }
}

/// `1px solid red` -> `{key}Width`, `{key}Style`, `{key}Color`.
///
/// `none` stands for `#fff solid 0px`; unrecognized tokens are skipped.
fn expand_stroke(key: &str, value: &str) -> Vec<(String, String)> {
    let value = value.replacen("none", "#fff solid 0px", 1);
    let mut out: Vec<(String, String)> = Vec::new();
    let mut set = |suffix: &str, token: &str| {
        let name = format!("{key}{suffix}");
        match out.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = token.to_string(),
            None => out.push((name, token.to_string())),
        }
    };
    for token in split_top_level(&value, ' ') {
        if BORDER_STYLES.contains(&token.as_str()) {
            set("Style", &token);
        } else if is_color(&token) {
            set("Color", &token);
        } else if SignedNumber::is_signable(&token) {
            set("Width", &token);
        }
    }
    out
}

/// `T R B L` with the usual CSS fill-in rules
fn expand_sides(key: &str, value: &str) -> Vec<(String, String)> {
    let parts = split_top_level(value, ' ');
    let Some(top) = parts.first().cloned() else {
        return Vec::new();
    };
    let right = parts.get(1).cloned().unwrap_or_else(|| top.clone());
    let bottom = parts.get(2).cloned().unwrap_or_else(|| top.clone());
    let left = parts.get(3).cloned().unwrap_or_else(|| right.clone());
    vec![
        (format!("{key}Top"), top),
        (format!("{key}Right"), right),
        (format!("{key}Bottom"), bottom),
        (format!("{key}Left"), left),
    ]
}

fn expand_corners(values: &[String]) -> [String; 4] {
    match values {
        [a] => [a.clone(), a.clone(), a.clone(), a.clone()],
        [a, b] => [a.clone(), b.clone(), a.clone(), b.clone()],
        [a, b, c] => [a.clone(), b.clone(), c.clone(), b.clone()],
        [a, b, c, d, ..] => [a.clone(), b.clone(), c.clone(), d.clone()],
        [] => Default::default(),
    }
}

/// `h1 h2 / v1 v2` -> four corner longhands holding `"h v"`
fn expand_border_radius(value: &str) -> Vec<(String, String)> {
    let mut halves = value.splitn(2, '/');
    let horizontal = split_top_level(halves.next().unwrap_or_default(), ' ');
    let vertical = halves
        .next()
        .map(|v| split_top_level(v, ' '))
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| horizontal.clone());

    let h = expand_corners(&horizontal);
    let v = expand_corners(&vertical);
    [
        "borderTopLeftRadius",
        "borderTopRightRadius",
        "borderBottomRightRadius",
        "borderBottomLeftRadius",
    ]
    .iter()
    .enumerate()
    .map(|(i, corner)| (corner.to_string(), format!("{} {}", h[i], v[i])))
    .collect()
}
