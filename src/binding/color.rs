//! Compact hex color literals.
//!
//! Accepted lengths are 1, 2, 3, 6, and 8 hex digits after the `#`.
//! The 1- and 2-digit forms expand to grayscale; note the 2-digit form
//! replicates the whole pair (`#AB` → R=G=B=0xAB) rather than acting as a
//! 1-digit-plus-alpha shorthand. That is not a standard shorthand, but it
//! is the historically tested behavior and is kept as-is.

use regex::Regex;
use std::sync::LazyLock;

use crate::scene::Rgba;

/// The classifier's notion of a hex literal: `#` + 3/4/6/8 digits.
/// Deliberately narrower than what [`parse_hex_color`] accepts: a bare
/// `#A` in an untyped slot reads as text, not color.
pub static HEX_LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
        .expect("valid hex literal pattern")
});

static HEX_BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F]{1,8})$").expect("valid hex body pattern"));

fn pair_to_unit(hi: char, lo: char) -> f64 {
    let hi = hi.to_digit(16).expect("hex digit") as f64;
    let lo = lo.to_digit(16).expect("hex digit") as f64;
    (hi * 16.0 + lo) / 255.0
}

/// Parse a compact hex literal into a normalized color.
///
/// Expansion per digit count:
/// - 1: replicate the digit into one pair, grayscale
/// - 2: replicate the pair for R, G, B (non-standard, see module docs)
/// - 3: each digit doubled (standard short form)
/// - 6: standard RGB
/// - 8: RGB plus trailing alpha pair
///
/// Any other length or non-hex content returns `None`.
pub fn parse_hex_color(input: &str) -> Option<Rgba> {
    let s = input.trim();
    let hex = &HEX_BODY_RE.captures(s)?[1];
    let d: Vec<char> = hex.chars().collect();
    let (r, g, b, a) = match d.len() {
        1 => {
            let v = pair_to_unit(d[0], d[0]);
            (v, v, v, 1.0)
        }
        2 => {
            let v = pair_to_unit(d[0], d[1]);
            (v, v, v, 1.0)
        }
        3 => (
            pair_to_unit(d[0], d[0]),
            pair_to_unit(d[1], d[1]),
            pair_to_unit(d[2], d[2]),
            1.0,
        ),
        6 => (
            pair_to_unit(d[0], d[1]),
            pair_to_unit(d[2], d[3]),
            pair_to_unit(d[4], d[5]),
            1.0,
        ),
        8 => (
            pair_to_unit(d[0], d[1]),
            pair_to_unit(d[2], d[3]),
            pair_to_unit(d[4], d[5]),
            pair_to_unit(d[6], d[7]),
        ),
        _ => return None,
    };
    Some(Rgba::new(r, g, b, a))
}
