//! Text helpers shared by every output writer.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

fn filename_disallowed() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"[^A-Za-z0-9_ .-]").expect("static filename pattern"))
}

fn discriminator() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\s*#\d+$").expect("static discriminator pattern"))
}

/// Lower-cased ASCII file stem: accents are decomposed and dropped, then
/// anything other than letters, digits, underscores, spaces, dots and
/// hyphens is removed.
pub fn filename_fmt(raw: &str) -> String {
    let ascii: String = raw.nfd().filter(|c| c.is_ascii()).collect();
    let lowered = ascii.to_ascii_lowercase();
    filename_disallowed().replace_all(&lowered, "").into_owned()
}

pub fn text_fmt(raw: &str) -> String {
    raw.to_uppercase()
}

/// Non-numeric (or empty) input counts as zero.
pub fn parse_lenient_int(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(0)
}

/// Sign and significant digits of an integer of any width; anything that
/// is not `[+-]digits` after trimming is zero.
fn lenient_digits(raw: &str) -> (Ordering, &str) {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return (Ordering::Equal, "");
    }
    let digits = digits.trim_start_matches('0');
    match (digits.is_empty(), negative) {
        (true, _) => (Ordering::Equal, ""),
        (false, true) => (Ordering::Less, digits),
        (false, false) => (Ordering::Greater, digits),
    }
}

/// Compares two scores as integers without a width limit, with the same
/// leniency as [`parse_lenient_int`].
pub fn cmp_lenient_int(a: &str, b: &str) -> Ordering {
    let (sign_a, digits_a) = lenient_digits(a);
    let (sign_b, digits_b) = lenient_digits(b);
    sign_a.cmp(&sign_b).then_with(|| {
        let magnitude = digits_a
            .len()
            .cmp(&digits_b.len())
            .then_with(|| digits_a.cmp(digits_b));
        if sign_a == Ordering::Less {
            magnitude.reverse()
        } else {
            magnitude
        }
    })
}

/// `Name#1234` is shown as `Name`.
pub fn strip_discriminator(tag: &str) -> String {
    discriminator().replace(tag, "").into_owned()
}
