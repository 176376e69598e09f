//! Search parameters submitted to an engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coords::BlockPos;
use crate::error::{RequestError, SeedError};

/// Layer searched when no explicit layer is configured.
pub const DEFAULT_LAYER: i32 = -60;

/// Vertical context the engine should search in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(i32)]
pub enum Floor {
    #[default]
    Overworld = 0,
    NetherFloor = 1,
    NetherCeiling = 2,
}

impl Floor {
    /// Value passed across the engine boundary.
    #[must_use]
    pub const fn selector(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overworld => "overworld",
            Self::NetherFloor => "nether-floor",
            Self::NetherCeiling => "nether-ceiling",
        }
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Floor {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "overworld" => Ok(Self::Overworld),
            "nether-floor" => Ok(Self::NetherFloor),
            "nether-ceiling" => Ok(Self::NetherCeiling),
            other => Err(RequestError::UnknownFloor(other.to_string())),
        }
    }
}

/// Everything an engine needs to start a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub seed: i64,
    pub floor: Floor,
    pub min: BlockPos,
    pub max: BlockPos,
}

impl SearchRequest {
    #[must_use]
    pub const fn new(seed: i64, floor: Floor, min: BlockPos, max: BlockPos) -> Self {
        Self {
            seed,
            floor,
            min,
            max,
        }
    }

    /// Square region `[-range, range]` on x and z, one block tall at `layer`.
    pub fn symmetric(
        seed: i64,
        floor: Floor,
        range: i32,
        layer: i32,
    ) -> Result<Self, RequestError> {
        if range < 0 {
            return Err(RequestError::NegativeRange(range));
        }
        Ok(Self::new(
            seed,
            floor,
            BlockPos::new(-range, layer, -range),
            BlockPos::new(range, layer, range),
        ))
    }
}

/// Parse a textual seed into the 64-bit value handed to the engine.
///
/// Accepts decimal with an optional sign, or unsigned `0x`, `0o` and `0b`
/// literals of any width. The value is reduced modulo 2^64 and read as two's
/// complement, the way a 64-bit engine parameter receives it. Blank text is
/// seed `0`.
pub fn parse_seed(text: &str) -> Result<i64, SeedError> {
    let trimmed = text.trim();
    let invalid = || SeedError::Invalid(trimmed.to_string());
    if trimmed.is_empty() {
        return Ok(0);
    }

    let prefixed = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| trimmed.strip_prefix(prefix).map(|rest| (radix, rest)));
    let (negative, radix, digits) = match prefixed {
        Some((radix, rest)) => (false, radix, rest),
        None => match trimmed.as_bytes()[0] {
            b'-' => (true, 10, &trimmed[1..]),
            b'+' => (false, 10, &trimmed[1..]),
            _ => (false, 10, trimmed),
        },
    };
    if digits.is_empty() {
        return Err(invalid());
    }

    let mut value = 0u64;
    for ch in digits.chars() {
        let digit = ch.to_digit(radix).ok_or_else(invalid)?;
        value = value.wrapping_mul(u64::from(radix)).wrapping_add(u64::from(digit));
    }
    if negative {
        value = value.wrapping_neg();
    }
    Ok(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_seeds() {
        assert_eq!(parse_seed("0"), Ok(0));
        assert_eq!(parse_seed(" 12345 "), Ok(12345));
        assert_eq!(parse_seed("-42"), Ok(-42));
        assert_eq!(parse_seed("+7"), Ok(7));
    }

    #[test]
    fn keeps_full_precision_beyond_float_range() {
        // 2^53 + 1 is not representable as an f64.
        assert_eq!(parse_seed("9007199254740993"), Ok(9_007_199_254_740_993));
        assert_eq!(parse_seed("-9223372036854775808"), Ok(i64::MIN));
        assert_eq!(parse_seed("9223372036854775807"), Ok(i64::MAX));
    }

    #[test]
    fn wraps_unsigned_64_bit_values() {
        assert_eq!(parse_seed("18446744073709551615"), Ok(-1));
        assert_eq!(parse_seed("9223372036854775808"), Ok(i64::MIN));
        assert_eq!(parse_seed("0xFFFFFFFFFFFFFFFF"), Ok(-1));
    }

    #[test]
    fn wider_values_reduce_modulo_two_to_the_64() {
        assert_eq!(parse_seed("18446744073709551616"), Ok(0));
        assert_eq!(parse_seed("18446744073709551617"), Ok(1));
        assert_eq!(parse_seed("-9223372036854775809"), Ok(i64::MAX));
        assert_eq!(parse_seed("0x1FFFFFFFFFFFFFFFF"), Ok(-1));
    }

    #[test]
    fn blank_text_is_seed_zero() {
        assert_eq!(parse_seed(""), Ok(0));
        assert_eq!(parse_seed("   "), Ok(0));
    }

    #[test]
    fn rejects_garbage_and_signed_prefixed_literals() {
        assert!(matches!(parse_seed("12a"), Err(SeedError::Invalid(_))));
        assert!(matches!(parse_seed("--1"), Err(SeedError::Invalid(_))));
        assert!(matches!(parse_seed("-"), Err(SeedError::Invalid(_))));
        assert!(matches!(parse_seed("0x"), Err(SeedError::Invalid(_))));
        assert!(matches!(parse_seed("-0x10"), Err(SeedError::Invalid(_))));
        assert!(matches!(parse_seed("1 2"), Err(SeedError::Invalid(_))));
    }

    #[test]
    fn parses_prefixed_seeds() {
        assert_eq!(parse_seed("0x10"), Ok(16));
        assert_eq!(parse_seed("0o17"), Ok(15));
        assert_eq!(parse_seed("0b101"), Ok(5));
    }

    #[test]
    fn symmetric_request_spans_both_axes() {
        let request = SearchRequest::symmetric(5, Floor::Overworld, 16, DEFAULT_LAYER).unwrap();
        assert_eq!(request.min, BlockPos::new(-16, -60, -16));
        assert_eq!(request.max, BlockPos::new(16, -60, 16));
        assert!(SearchRequest::symmetric(5, Floor::Overworld, -1, DEFAULT_LAYER).is_err());
    }

    #[test]
    fn floor_names_round_trip_through_text() {
        assert_eq!("nether_floor".parse::<Floor>().unwrap(), Floor::NetherFloor);
        assert_eq!("Overworld".parse::<Floor>().unwrap(), Floor::Overworld);
        assert_eq!(Floor::NetherCeiling.selector(), 2);
        assert!("sky".parse::<Floor>().is_err());
    }
}
