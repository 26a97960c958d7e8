//! Lenient margin option.
//!
//! Existing build files put anything in `margin`: integers, floats,
//! numeric strings, or junk. The value is read as an integer prefix and
//! clamped to zero.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Pixel spacing between packed images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margin(pub u32);

impl Margin {
    pub fn pixels(self) -> u32 {
        self.0
    }
}

impl std::str::FromStr for Margin {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Margin(parse_margin(s)))
    }
}

/// Parse a margin the way an integer-prefix parse does.
///
/// Leading whitespace and one sign are accepted, then decimal digits up to
/// the first non-digit. No digits, or a negative value, yields 0.
pub fn parse_margin(input: &str) -> u32 {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };

    if digits.is_empty() || negative {
        return 0;
    }

    digits.parse::<u64>().map_or(u32::MAX, clamp_u32)
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn from_float(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value.trunc() as u32
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMargin {
    Int(i64),
    Float(f64),
    Text(String),
    Flag(bool),
    Null(()),
}

impl<'de> Deserialize<'de> for Margin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pixels = match RawMargin::deserialize(deserializer)? {
            RawMargin::Int(value) => u64::try_from(value).map_or(0, clamp_u32),
            RawMargin::Float(value) => from_float(value),
            RawMargin::Text(text) => parse_margin(&text),
            RawMargin::Flag(_) | RawMargin::Null(()) => 0,
        };
        Ok(Margin(pixels))
    }
}

impl Serialize for Margin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_margin_plain_number() {
        assert_eq!(parse_margin("12"), 12);
        assert_eq!(parse_margin("  7"), 7);
        assert_eq!(parse_margin("+3"), 3);
    }

    #[test]
    fn test_parse_margin_leading_digits() {
        assert_eq!(parse_margin("12px"), 12);
        assert_eq!(parse_margin("2.9"), 2);
    }

    #[test]
    fn test_parse_margin_non_numeric_is_zero() {
        assert_eq!(parse_margin("abc"), 0);
        assert_eq!(parse_margin(""), 0);
        assert_eq!(parse_margin("px12"), 0);
    }

    #[test]
    fn test_parse_margin_negative_is_zero() {
        assert_eq!(parse_margin("-5"), 0);
    }

    #[test]
    fn test_parse_margin_overflow_saturates() {
        assert_eq!(parse_margin("99999999999999999999999"), u32::MAX);
    }

    #[test]
    fn test_deserialize_margin_variants() {
        let cases = [
            ("4", 4),
            ("-4", 0),
            ("2.7", 2),
            ("\"8\"", 8),
            ("\"abc\"", 0),
            ("true", 0),
            ("~", 0),
        ];
        for (yaml, expected) in cases {
            let margin: Margin = serde_yaml::from_str(yaml).unwrap();
            assert_eq!(margin.pixels(), expected, "margin from {yaml}");
        }
    }
}
