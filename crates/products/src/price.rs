//! Fixed-point product price.
//!
//! Prices are checked against `NUMERIC(8, 2)` from the digits the caller actually
//! wrote. Submitted text is never pushed through a float or a bounded decimal
//! before the check, so nothing is rounded on the way in.

use rust_decimal::Decimal;
use serde::de::{self, MapAccess, Unexpected, Visitor, value::MapAccessDeserializer};
use serde::{Deserialize, Deserializer, Serialize};

use catalog_core::{DomainError, DomainResult, ValueObject};

/// Total significant digits a price may carry.
pub const PRICE_MAX_DIGITS: u32 = 8;
/// Digits after the decimal point.
pub const PRICE_DECIMAL_PLACES: u32 = 2;

const FIELD: &str = "price";

/// A price that fits `NUMERIC(8, 2)` exactly.
///
/// Construction never rounds: a value with a non-zero digit past the second decimal
/// place is rejected. Trailing zeros are not significant, so `1.500` is `1.50`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "Decimal")]
pub struct Price(Decimal);

impl ValueObject for Price {}

impl Price {
    pub fn new(value: Decimal) -> DomainResult<Self> {
        let normalized = value.normalize();
        check(Precision::of(
            i128::from(digit_count(normalized.mantissa().unsigned_abs())),
            i128::from(normalized.scale()),
        ))?;

        let mut stored = normalized;
        stored.rescale(PRICE_DECIMAL_PLACES);
        Ok(Self(stored))
    }

    /// Parse user input (form text or a JSON literal). Unparsable input is a field
    /// error, not a panic.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DomainError::field(FIELD, "This field is required."));
        }
        let numeral =
            Numeral::parse(trimmed).ok_or_else(|| DomainError::field(FIELD, "Enter a number."))?;
        check(numeral.precision())?;
        Self::new(numeral.to_decimal())
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let input = PriceInput::deserialize(deserializer)?;
        input.parse().map_err(de::Error::custom)
    }
}

/// A price exactly as it was submitted, before validation.
///
/// Deserializes from a JSON string or number, keeping the literal digits.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PriceInput(String);

impl PriceInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> DomainResult<Price> {
        Price::parse(&self.0)
    }
}

impl From<&str> for PriceInput {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for PriceInput {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<Decimal> for PriceInput {
    fn from(value: Decimal) -> Self {
        Self(value.to_string())
    }
}

impl From<Price> for PriceInput {
    fn from(price: Price) -> Self {
        Self(price.to_string())
    }
}

impl<'de> Deserialize<'de> for PriceInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PriceInputVisitor)
    }
}

struct PriceInputVisitor;

impl<'de> Visitor<'de> for PriceInputVisitor {
    type Value = PriceInput;

    fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("a decimal number or a string holding one")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(PriceInput::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(PriceInput(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(PriceInput(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(PriceInput(v.to_string()))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
        Ok(PriceInput(v.to_string()))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
        Ok(PriceInput(v.to_string()))
    }

    /// serde_json only hands over a float when it prints back to the literal that
    /// was read; otherwise the number arrives through `visit_map`.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() {
            return Err(E::invalid_value(Unexpected::Float(v), &self));
        }
        Ok(PriceInput(v.to_string()))
    }

    /// JSON numbers with arbitrary precision arrive as a single-entry map holding
    /// their literal text.
    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let number = serde_json::Number::deserialize(MapAccessDeserializer::new(map))?;
        Ok(PriceInput(number.to_string()))
    }
}

/// Significant digits and decimal places of a value, zeros on either end dropped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Precision {
    digits: i128,
    decimals: i128,
}

impl Precision {
    /// `significant` digits with the point `scale` places from the right; a negative
    /// scale stands for trailing zeros before the point.
    fn of(significant: i128, scale: i128) -> Self {
        if scale <= 0 {
            Self {
                digits: significant - scale,
                decimals: 0,
            }
        } else if scale > significant {
            Self {
                digits: scale,
                decimals: scale,
            }
        } else {
            Self {
                digits: significant,
                decimals: scale,
            }
        }
    }
}

fn check(precision: Precision) -> DomainResult<()> {
    let max_digits = i128::from(PRICE_MAX_DIGITS);
    let max_decimals = i128::from(PRICE_DECIMAL_PLACES);

    if precision.digits > max_digits {
        return Err(DomainError::field(
            FIELD,
            format!("Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total."),
        ));
    }
    if precision.decimals > max_decimals {
        return Err(DomainError::field(
            FIELD,
            format!("Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places."),
        ));
    }
    if precision.digits - precision.decimals > max_digits - max_decimals {
        return Err(DomainError::field(
            FIELD,
            format!(
                "Ensure that there are no more than {} digits before the decimal point.",
                PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES
            ),
        ));
    }
    Ok(())
}

/// A decimal literal (`-12.50`, `.5`, `1e3`) reduced to its significant digits.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Numeral {
    negative: bool,
    /// No leading or trailing zeros; empty for zero.
    significant: String,
    scale: i128,
}

impl Numeral {
    fn parse(text: &str) -> Option<Self> {
        let (negative, unsigned) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        let (mantissa, exponent) = match unsigned.find(|c: char| c == 'e' || c == 'E') {
            Some(at) => (&unsigned[..at], unsigned[at + 1..].parse::<i64>().ok()?),
            None => (unsigned, 0),
        };
        let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        let digits = format!("{whole}{fraction}");
        let leading_trimmed = digits.trim_start_matches('0');
        let significant = leading_trimmed.trim_end_matches('0');
        let trailing_zeros = (leading_trimmed.len() - significant.len()) as i128;
        let scale = fraction.len() as i128 - i128::from(exponent) - trailing_zeros;

        Some(if significant.is_empty() {
            Self {
                negative,
                significant: String::new(),
                scale: 0,
            }
        } else {
            Self {
                negative,
                significant: significant.to_string(),
                scale,
            }
        })
    }

    fn precision(&self) -> Precision {
        if self.significant.is_empty() {
            return Precision::of(1, 0);
        }
        Precision::of(self.significant.len() as i128, self.scale)
    }

    /// Exact value. Only called once the precision check has passed, so at most
    /// eight digits remain.
    fn to_decimal(&self) -> Decimal {
        let mut mantissa: i64 = self.significant.parse().unwrap_or(0);
        let mut scale = self.scale;
        while scale < 0 {
            mantissa *= 10;
            scale += 1;
        }
        if self.negative {
            mantissa = -mantissa;
        }
        Decimal::new(mantissa, scale as u32)
    }
}

fn digit_count(mut n: u128) -> u32 {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}
