//! Fixed-point price type.
//!
//! Prices are held as `i64` micros (1e-6 units). Decimal strings are parsed
//! deterministically into micros with no floats in between, so `40.9` stays
//! `40.9` through storage, arithmetic and display.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Micros per whole unit.
pub const MICROS_SCALE: i64 = 1_000_000;

/// A non-negative unit price at 1e-6 scale.
///
/// There is intentionally no `From<i64>`: use [`Price::from_micros`] when a raw
/// integer is known to be a price (e.g. a storage column), or parse a decimal
/// string.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

impl Price {
    /// Wrap raw micros. Negative values are rejected.
    pub fn from_micros(micros: i64) -> Result<Self> {
        if micros < 0 {
            return Err(anyhow!("negative price not allowed: {micros} micros"));
        }
        Ok(Price(micros))
    }

    /// Raw micros, for storage columns.
    #[inline]
    pub const fn micros(self) -> i64 {
        self.0
    }
}

/// Parse a decimal string into micros.
/// Accepts an optional `+` sign. Rejects negatives, more than 6 decimal places
/// (rounding ambiguity), and any non-digit characters.
impl FromStr for Price {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("empty price"));
        }
        let s = s.strip_prefix('+').unwrap_or(s);
        if s.is_empty() || s == "." {
            return Err(anyhow!("price has no digits"));
        }
        if s.starts_with('-') {
            return Err(anyhow!("negative price not allowed"));
        }

        let mut parts = s.split('.');
        let int_part = parts.next().unwrap_or("0");
        let frac_part = parts.next();
        if parts.next().is_some() {
            return Err(anyhow!("invalid decimal format: {s}"));
        }

        let int_part = if int_part.is_empty() { "0" } else { int_part };
        if !int_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(anyhow!("invalid integer part: {int_part}"));
        }
        let int_val: i64 = int_part
            .parse()
            .with_context(|| format!("parse int part failed: {int_part}"))?;

        let frac_micros = match frac_part {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(anyhow!("invalid fractional part: {frac}"));
                }
                if frac.len() > 6 {
                    return Err(anyhow!("too many decimals: {s}"));
                }
                format!("{frac:0<6}")
                    .parse::<i64>()
                    .with_context(|| format!("parse frac part failed: {frac}"))?
            }
        };

        int_val
            .checked_mul(MICROS_SCALE)
            .and_then(|v| v.checked_add(frac_micros))
            .map(Price)
            .ok_or_else(|| anyhow!("price overflow: {s}"))
    }
}

/// Trailing zeros trimmed, at least one fractional digit: `40.9`, `10.0`.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.0 / MICROS_SCALE;
        let frac = format!("{:06}", self.0 % MICROS_SCALE);
        let frac = frac.trim_end_matches('0');
        let frac = if frac.is_empty() { "0" } else { frac };
        // `{:^w}` and friends only apply padding through `pad`.
        f.pad(&format!("{units}.{frac}"))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[test]
    fn parses_decimal_strings_to_micros() {
        assert_eq!(p("0").micros(), 0);
        assert_eq!(p("1").micros(), 1_000_000);
        assert_eq!(p("1.0").micros(), 1_000_000);
        assert_eq!(p("40.9").micros(), 40_900_000);
        assert_eq!(p("001.2300").micros(), 1_230_000);
        assert_eq!(p("+5.000001").micros(), 5_000_001);
        assert_eq!(p(".5").micros(), 500_000);
        assert_eq!(p("7.").micros(), 7_000_000);
    }

    #[test]
    fn rejects_negative_and_garbage() {
        assert!("-1".parse::<Price>().is_err());
        assert!("".parse::<Price>().is_err());
        assert!("abc".parse::<Price>().is_err());
        assert!("1.2.3".parse::<Price>().is_err());
        assert!("1e3".parse::<Price>().is_err());
        assert!(Price::from_micros(-1).is_err());
    }

    #[test]
    fn rejects_rounding_ambiguity() {
        assert!("1.0000000".parse::<Price>().is_err());
        assert!("1.1234567".parse::<Price>().is_err());
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(p("40.9").to_string(), "40.9");
        assert_eq!(p("10").to_string(), "10.0");
        assert_eq!(p("0.000001").to_string(), "0.000001");
        assert_eq!(p("300.40").to_string(), "300.4");
    }

    #[test]
    fn display_honours_alignment() {
        assert_eq!(format!("{:>6}", p("1.5")), "   1.5");
        assert_eq!(format!("{:^7}", p("1.5")), "  1.5  ");
    }

    #[test]
    fn serde_uses_decimal_strings() {
        let json = serde_json::to_string(&p("85.3")).unwrap();
        assert_eq!(json, "\"85.3\"");
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p("85.3"));
        assert!(serde_json::from_str::<Price>("\"-2\"").is_err());
    }
}
