//! Interpolation tokens
//!
//! Unified values are flat token lists: numbers that interpolate and text
//! (units, separators, function names) that does not. Concatenating a list
//! yields the CSS value again.

use std::fmt;

/// One piece of a unified value
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Text(String),
}

impl Token {
    pub fn text(s: impl Into<String>) -> Self {
        Token::Text(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Token::Number(n) => Some(*n),
            Token::Text(_) => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", clean_zero(*n)),
            Token::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Token {
    fn from(n: f64) -> Self {
        Token::Number(n)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Token::Text(s.to_string())
    }
}

/// Round to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn clean_zero(n: f64) -> f64 {
    if n == 0.0 {
        0.0
    } else {
        n
    }
}

/// Interpolate one token pair.
///
/// Numbers blend linearly, rounded to 4 decimals. Anything else is
/// discrete: the start token holds for every `progress < 1` and the end
/// token appears only at `progress >= 1`, so a text change such as
/// `solid` to `dashed` lands when the tween completes rather than on its
/// first frame.
pub fn lerp_token(from: &Token, to: &Token, progress: f64) -> Token {
    match (from, to) {
        (Token::Number(a), Token::Number(b)) => {
            Token::Number(round_to((1.0 - progress) * a + progress * b, 4))
        }
        _ if progress >= 1.0 => to.clone(),
        _ => from.clone(),
    }
}

/// Interpolate two equal-length token lists
pub fn lerp_tokens(from: &[Token], to: &[Token], progress: f64) -> Vec<Token> {
    from.iter()
        .enumerate()
        .map(|(i, start)| match to.get(i) {
            Some(end) => lerp_token(start, end, progress),
            None => start.clone(),
        })
        .collect()
}

/// Concatenate tokens into a value string
pub fn render_tokens(tokens: &[Token]) -> String {
    tokens.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_numbers() {
        let a = vec![Token::Number(0.0), Token::text("px")];
        let b = vec![Token::Number(100.0), Token::text("px")];
        assert_eq!(render_tokens(&lerp_tokens(&a, &b, 0.25)), "25px");
    }

    #[test]
    fn test_text_switches_at_end() {
        let a = Token::text("solid");
        let b = Token::text("dashed");
        assert_eq!(lerp_token(&a, &b, 0.0), a);
        assert_eq!(lerp_token(&a, &b, 0.99), a);
        assert_eq!(lerp_token(&a, &b, 1.0), b);
    }

    #[test]
    fn test_text_holds_through_first_frame() {
        let a = vec![Token::Number(1.0), Token::text("px "), Token::text("solid")];
        let b = vec![Token::Number(3.0), Token::text("px "), Token::text("dashed")];
        assert_eq!(render_tokens(&lerp_tokens(&a, &b, 0.01)), "1.02px solid");
        assert_eq!(render_tokens(&lerp_tokens(&a, &b, 1.0)), "3px dashed");
    }

    #[test]
    fn test_rounding() {
        let t = lerp_token(&Token::Number(0.0), &Token::Number(1.0), 1.0 / 3.0);
        assert_eq!(t, Token::Number(0.3333));
        assert_eq!(Token::Number(-0.0).to_string(), "0");
    }
}
