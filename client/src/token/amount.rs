//! # Token Amounts & Decimal Scaling
//!
//! A [`TokenAmount`] is an integer count of the ledger's smallest unit.
//! `value = 123_456_789` with 8 decimals means 1.23456789 tokens. The
//! ledger only ever sees the integer; the decimal string exists for humans.
//!
//! ## Design Decisions
//!
//! - **`u128`, not floats.** Ledger amounts are arbitrary-precision
//!   non-negative integers, and IEEE doubles silently lose precision above
//!   2^53 base units. A u128 holds every balance any real token will ever
//!   mint, and the scaler refuses decimals counts that could overflow it.
//! - **Truncate, never round.** Converting "1.234567891" at 8 decimals
//!   keeps 123456789 and drops the ninth digit. Rounding up could submit
//!   more than the user typed, and a ledger is the wrong place to be
//!   generous with other people's money.
//! - **Strings on the wire.** In human-readable formats the amount
//!   serializes as a decimal string so JSON consumers cannot mangle it
//!   through a double. Binary formats get the raw integer.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::MAX_DECIMALS;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced when parsing a human-entered decimal amount.
///
/// Every variant is a local validation failure: nothing here has touched
/// the network, and the user can correct the input and try again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The input was empty (or all whitespace).
    #[error("amount is empty")]
    Empty,

    /// The input carried a leading minus sign. Ledger amounts are
    /// non-negative by construction.
    #[error("amount '{input}' is negative")]
    Negative {
        /// The offending input, echoed back for error surfaces.
        input: String,
    },

    /// The input contained a character that is neither a digit nor a
    /// single decimal point.
    #[error("amount '{input}' contains non-numeric character '{found}'")]
    NotNumeric {
        /// The offending input.
        input: String,
        /// The first character that failed validation.
        found: char,
    },

    /// The input had decimal-point structure problems: more than one
    /// point, or a point with no digits on either side.
    #[error("amount '{input}' is not a well-formed decimal")]
    Malformed {
        /// The offending input.
        input: String,
    },

    /// The decimals count itself is outside what a u128 can scale.
    #[error("decimals {got} exceeds supported maximum {max}")]
    DecimalsOutOfRange {
        /// The decimals value requested.
        got: u8,
        /// The largest supported value.
        max: u8,
    },

    /// The scaled value does not fit in 128 bits.
    #[error("amount '{input}' overflows the 128-bit base-unit range")]
    Overflow {
        /// The offending input.
        input: String,
    },
}

// ---------------------------------------------------------------------------
// TokenAmount
// ---------------------------------------------------------------------------

/// An amount of tokens in base units (the smallest indivisible
/// denomination).
///
/// Construction from user input goes through [`TokenAmount::from_decimal`],
/// which is the only place decimal strings are interpreted. Arithmetic is
/// checked — an overflowing add is a bug surfaced, not a balance wrapped.
///
/// # Examples
///
/// ```
/// use zenith_client::token::TokenAmount;
///
/// let amount = TokenAmount::from_decimal("1.23456789", 8).unwrap();
/// assert_eq!(amount.value(), 123_456_789);
/// assert_eq!(amount.display_decimal(8), "1.23456789");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(u128);

impl TokenAmount {
    /// Zero tokens. The starting balance of every account ever created.
    pub const ZERO: TokenAmount = TokenAmount(0);

    /// Wraps a raw base-unit value.
    pub const fn new(value: u128) -> Self {
        TokenAmount(value)
    }

    /// Returns the raw base-unit value.
    pub const fn value(&self) -> u128 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. `None` on overflow.
    pub fn checked_add(&self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    /// Checked subtraction. `None` when `other` exceeds `self`.
    pub fn checked_sub(&self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(TokenAmount)
    }

    /// Saturating subtraction, flooring at zero. For display math only —
    /// anything that moves money uses the checked variant.
    pub fn saturating_sub(&self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.saturating_sub(other.0))
    }

    /// Parses a human-entered decimal string into base units.
    ///
    /// Multiplies by 10^`decimals` and truncates (floors) toward zero:
    /// fractional digits beyond `decimals` are dropped, never rounded up.
    /// Rejects empty, negative, and non-numeric input. `decimals = 0` is
    /// the valid degenerate case where the result is simply the integer
    /// part.
    pub fn from_decimal(input: &str, decimals: u8) -> Result<TokenAmount, AmountError> {
        if decimals > MAX_DECIMALS {
            return Err(AmountError::DecimalsOutOfRange {
                got: decimals,
                max: MAX_DECIMALS,
            });
        }

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        if trimmed.starts_with('-') {
            return Err(AmountError::Negative {
                input: trimmed.to_string(),
            });
        }

        let (whole_part, frac_part) = match trimmed.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (trimmed, ""),
        };

        // "." alone, or a second decimal point hiding in the fraction.
        if (whole_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
            return Err(AmountError::Malformed {
                input: trimmed.to_string(),
            });
        }

        for c in whole_part.chars().chain(frac_part.chars()) {
            if !c.is_ascii_digit() {
                return Err(AmountError::NotNumeric {
                    input: trimmed.to_string(),
                    found: c,
                });
            }
        }

        let overflow = || AmountError::Overflow {
            input: trimmed.to_string(),
        };

        let whole: u128 = if whole_part.is_empty() {
            0
        } else {
            whole_part.parse().map_err(|_| overflow())?
        };

        // Keep at most `decimals` fractional digits; the rest truncate away.
        // Safe to slice by bytes: every character was just verified ASCII.
        let kept = &frac_part[..frac_part.len().min(decimals as usize)];
        let frac: u128 = if kept.is_empty() {
            0
        } else {
            // At most 38 ASCII digits, so this parse cannot overflow, but
            // the map_err keeps the error path uniform.
            kept.parse().map_err(|_| overflow())?
        };

        let scale = 10u128.pow(decimals as u32);
        // Promote the kept digits to exactly `decimals` places.
        let frac_scale = 10u128.pow((decimals as usize - kept.len()) as u32);

        whole
            .checked_mul(scale)
            .and_then(|w| w.checked_add(frac * frac_scale))
            .map(TokenAmount)
            .ok_or_else(overflow)
    }

    /// Renders the amount as a decimal string with exactly `decimals`
    /// fractional digits.
    ///
    /// Display only. The output must never be parsed back into an outgoing
    /// request — requests carry the integer base units directly.
    pub fn display_decimal(&self, decimals: u8) -> String {
        // Clamp rather than error: this path renders UI text, and a bogus
        // decimals count should not take the balance display down with it.
        let decimals = decimals.min(MAX_DECIMALS);
        if decimals == 0 {
            return self.0.to_string();
        }
        let divisor = 10u128.pow(decimals as u32);
        let whole = self.0 / divisor;
        let frac = self.0 % divisor;
        format!("{}.{:0>width$}", whole, frac, width = decimals as usize)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        TokenAmount(value as u128)
    }
}

impl From<u128> for TokenAmount {
    fn from(value: u128) -> Self {
        TokenAmount(value)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            nat_string::serialize(&self.0, serializer)
        } else {
            serializer.serialize_u128(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            nat_string::deserialize(deserializer).map(TokenAmount)
        } else {
            u128::deserialize(deserializer).map(TokenAmount)
        }
    }
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

/// Serde helpers for u128 naturals carried as decimal strings in
/// human-readable formats.
///
/// Deserialization also accepts plain JSON integers, because hand-written
/// fixtures and lenient gateways both produce them and rejecting `42` where
/// `"42"` is expected helps nobody.
pub(crate) mod nat_string {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        struct NatVisitor;

        impl<'de> Visitor<'de> for NatVisitor {
            type Value = u128;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or its decimal-string form")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.parse()
                    .map_err(|_| E::custom(format!("invalid natural number: '{}'", v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
                Ok(v)
            }
        }

        deserializer.deserialize_any(NatVisitor)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- 1. Scaling happy paths ----------------------------------------------

    #[test]
    fn scales_eight_decimal_amount() {
        let amount = TokenAmount::from_decimal("1.23456789", 8).unwrap();
        assert_eq!(amount.value(), 123_456_789);
    }

    #[test]
    fn truncates_excess_fractional_digits() {
        // The ninth digit is dropped, not rounded up — even though it is a 1
        // here and a 9 below.
        let amount = TokenAmount::from_decimal("1.234567891", 8).unwrap();
        assert_eq!(amount.value(), 123_456_789);

        let amount = TokenAmount::from_decimal("1.234567899", 8).unwrap();
        assert_eq!(amount.value(), 123_456_789);
    }

    #[test]
    fn zero_is_zero_at_every_decimals() {
        for d in [0u8, 1, 8, 18, 38] {
            assert_eq!(TokenAmount::from_decimal("0", d).unwrap(), TokenAmount::ZERO);
        }
    }

    #[test]
    fn decimals_zero_floors_the_input() {
        assert_eq!(TokenAmount::from_decimal("7", 0).unwrap().value(), 7);
        assert_eq!(TokenAmount::from_decimal("7.999", 0).unwrap().value(), 7);
        assert_eq!(TokenAmount::from_decimal("0.1", 0).unwrap().value(), 0);
    }

    #[test]
    fn accepts_bare_fraction_and_trailing_point() {
        assert_eq!(TokenAmount::from_decimal(".5", 8).unwrap().value(), 50_000_000);
        assert_eq!(TokenAmount::from_decimal("3.", 8).unwrap().value(), 300_000_000);
    }

    #[test]
    fn pads_short_fractions() {
        assert_eq!(TokenAmount::from_decimal("1.2", 8).unwrap().value(), 120_000_000);
        assert_eq!(TokenAmount::from_decimal("0.00000001", 8).unwrap().value(), 1);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(TokenAmount::from_decimal("  42.5 ", 2).unwrap().value(), 4250);
    }

    // -- 2. Scaling rejections -----------------------------------------------

    #[test]
    fn rejects_empty_input() {
        assert_eq!(TokenAmount::from_decimal("", 8), Err(AmountError::Empty));
        assert_eq!(TokenAmount::from_decimal("   ", 8), Err(AmountError::Empty));
    }

    #[test]
    fn rejects_negative_input() {
        assert!(matches!(
            TokenAmount::from_decimal("-1", 8),
            Err(AmountError::Negative { .. })
        ));
        assert!(matches!(
            TokenAmount::from_decimal("-0.0001", 8),
            Err(AmountError::Negative { .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_input() {
        let err = TokenAmount::from_decimal("12a4", 8).unwrap_err();
        assert_eq!(
            err,
            AmountError::NotNumeric {
                input: "12a4".to_string(),
                found: 'a'
            }
        );
        assert!(matches!(
            TokenAmount::from_decimal("1,5", 8),
            Err(AmountError::NotNumeric { found: ',', .. })
        ));
        assert!(matches!(
            TokenAmount::from_decimal("+3", 8),
            Err(AmountError::NotNumeric { found: '+', .. })
        ));
    }

    #[test]
    fn rejects_malformed_decimals() {
        assert!(matches!(
            TokenAmount::from_decimal(".", 8),
            Err(AmountError::Malformed { .. })
        ));
        assert!(matches!(
            TokenAmount::from_decimal("1.2.3", 8),
            Err(AmountError::Malformed { .. })
        ));
    }

    #[test]
    fn rejects_unsupported_decimals() {
        let err = TokenAmount::from_decimal("1", 39).unwrap_err();
        assert_eq!(err, AmountError::DecimalsOutOfRange { got: 39, max: 38 });
        // The maximum itself is fine.
        assert!(TokenAmount::from_decimal("1", 38).is_ok());
    }

    #[test]
    fn rejects_overflowing_amounts() {
        // u128::MAX is ~3.4e38; 39 nines in the whole part cannot fit.
        let huge = "9".repeat(39);
        assert!(matches!(
            TokenAmount::from_decimal(&huge, 0),
            Err(AmountError::Overflow { .. })
        ));
        // Fits as an integer, overflows once scaled by 10^8.
        let edge = u128::MAX.to_string();
        assert!(matches!(
            TokenAmount::from_decimal(&edge, 8),
            Err(AmountError::Overflow { .. })
        ));
    }

    // -- 3. Display ----------------------------------------------------------

    #[test]
    fn display_decimal_pads_to_width() {
        assert_eq!(TokenAmount::new(123_456_789).display_decimal(8), "1.23456789");
        assert_eq!(TokenAmount::new(150_000_000).display_decimal(8), "1.50000000");
        assert_eq!(TokenAmount::new(1).display_decimal(8), "0.00000001");
        assert_eq!(TokenAmount::ZERO.display_decimal(8), "0.00000000");
    }

    #[test]
    fn display_decimal_handles_zero_decimals() {
        assert_eq!(TokenAmount::new(42).display_decimal(0), "42");
    }

    #[test]
    fn display_is_raw_base_units() {
        assert_eq!(TokenAmount::new(123_456_789).to_string(), "123456789");
    }

    #[test]
    fn round_trip_reconstructs_truncated_input() {
        // display(from(a, d), d) equals a truncated to d fractional digits
        // and padded to d places. Truncation, never rounding.
        let cases = [
            ("1.23456789", 8, "1.23456789"),
            ("1.234567891", 8, "1.23456789"),
            ("1.2", 8, "1.20000000"),
            ("0", 8, "0.00000000"),
            ("7.999", 0, "7"),
            ("1000000", 2, "1000000.00"),
        ];
        for (input, decimals, expected) in cases {
            let amount = TokenAmount::from_decimal(input, decimals).unwrap();
            assert_eq!(
                amount.display_decimal(decimals),
                expected,
                "input '{}' at {} decimals",
                input,
                decimals
            );
        }
    }

    // -- 4. Arithmetic -------------------------------------------------------

    #[test]
    fn checked_arithmetic() {
        let a = TokenAmount::new(100);
        let b = TokenAmount::new(40);
        assert_eq!(a.checked_add(b), Some(TokenAmount::new(140)));
        assert_eq!(a.checked_sub(b), Some(TokenAmount::new(60)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(b.saturating_sub(a), TokenAmount::ZERO);
        assert_eq!(TokenAmount::new(u128::MAX).checked_add(TokenAmount::new(1)), None);
    }

    #[test]
    fn ordering_follows_value() {
        assert!(TokenAmount::new(1) < TokenAmount::new(2));
        assert!(TokenAmount::ZERO.is_zero());
        assert!(!TokenAmount::new(1).is_zero());
    }

    // -- 5. Serde ------------------------------------------------------------

    #[test]
    fn json_serializes_as_decimal_string() {
        // 2^53 + 1 is exactly the value a double-based consumer would corrupt.
        let amount = TokenAmount::new(9_007_199_254_740_993);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"9007199254740993\"");

        let recovered: TokenAmount = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, amount);
    }

    #[test]
    fn json_accepts_bare_integers() {
        let recovered: TokenAmount = serde_json::from_str("42").unwrap();
        assert_eq!(recovered, TokenAmount::new(42));
    }

    #[test]
    fn json_rejects_garbage_strings() {
        assert!(serde_json::from_str::<TokenAmount>("\"12x\"").is_err());
        assert!(serde_json::from_str::<TokenAmount>("\"-5\"").is_err());
    }

    #[test]
    fn bincode_round_trips_raw_integer() {
        let amount = TokenAmount::new(u128::MAX - 7);
        let bytes = bincode::serialize(&amount).unwrap();
        let recovered: TokenAmount = bincode::deserialize(&bytes).unwrap();
        assert_eq!(recovered, amount);
    }
}
