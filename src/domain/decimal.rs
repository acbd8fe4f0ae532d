//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Provides the strict boundary parse, the zero-fallback parse used for
//! already-accepted data, and the percentage helpers every formula uses.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lossless decimal numeric type for money, volumes and rates.
///
/// Backed by rust_decimal to avoid floating-point drift. Arithmetic never
/// panics: overflow saturates to [`Decimal::MAX`] / [`Decimal::MIN`] and
/// division by zero yields zero, both logged at `warn`.
///
/// Serializes to JSON number (not string) by default and accepts either a
/// JSON number or a numeric string on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    /// Largest representable value; overflowing results saturate here.
    pub const MAX: Decimal = Decimal(RustDecimal::MAX);
    /// Smallest representable value.
    pub const MIN: Decimal = Decimal(RustDecimal::MIN);

    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        let trimmed = s.trim();
        RustDecimal::from_str(trimmed)
            .or_else(|_| RustDecimal::from_scientific(trimmed))
            .map(Decimal)
    }

    /// Parse a Decimal, treating blank or malformed input as zero.
    ///
    /// Only for values that were already accepted into the data model;
    /// user input goes through [`Decimal::from_str_canonical`].
    pub fn parse_or_zero(s: &str) -> Self {
        match Self::from_str_canonical(s) {
            Ok(value) => value,
            Err(_) => {
                if !s.trim().is_empty() {
                    tracing::debug!(raw = %s, "non-numeric value treated as zero");
                }
                Decimal::zero()
            }
        }
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// The multiplicative identity (1).
    pub fn one() -> Self {
        Decimal(RustDecimal::ONE)
    }

    /// Returns the value 100.
    pub fn hundred() -> Self {
        Decimal(RustDecimal::ONE_HUNDRED)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// `self * percent / 100`, saturating like the operators. The percent
    /// is scaled first so only a result beyond range saturates.
    pub fn percent_of(self, percent: Decimal) -> Self {
        self * (percent / Decimal::hundred())
    }

    /// Division that yields zero instead of panicking on a zero divisor.
    pub fn checked_ratio(self, divisor: Decimal) -> Self {
        if divisor.is_zero() {
            Decimal::zero()
        } else {
            self / divisor
        }
    }

    /// Round to `scale` decimal places, midpoint away from zero.
    pub fn round_money(self, scale: u32) -> Self {
        Decimal(
            self.0
                .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

/// Value substituted when an operation leaves the representable range:
/// the bound on the side the exact result lies.
fn saturated(
    op: &'static str,
    lhs: RustDecimal,
    rhs: RustDecimal,
    result: Option<RustDecimal>,
    negative: bool,
) -> Decimal {
    match result {
        Some(value) => Decimal(value),
        None => {
            tracing::warn!(op, lhs = %lhs, rhs = %rhs, "decimal overflow, result saturated");
            if negative {
                Decimal::MIN
            } else {
                Decimal::MAX
            }
        }
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        saturated("add", self.0, rhs.0, self.0.checked_add(rhs.0), self.0.is_sign_negative())
    }
}

impl std::ops::AddAssign for Decimal {
    fn add_assign(&mut self, rhs: Decimal) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        saturated("sub", self.0, rhs.0, self.0.checked_sub(rhs.0), self.0.is_sign_negative())
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        let negative = self.0.is_sign_negative() != rhs.0.is_sign_negative();
        saturated("mul", self.0, rhs.0, self.0.checked_mul(rhs.0), negative)
    }
}

/// Division by zero yields zero.
impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, rhs: Decimal) -> Decimal {
        if rhs.is_zero() {
            tracing::warn!(lhs = %self.0, "decimal division by zero, result is zero");
            return Decimal::zero();
        }
        let negative = self.0.is_sign_negative() != rhs.0.is_sign_negative();
        saturated("div", self.0, rhs.0, self.0.checked_div(rhs.0), negative)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), |acc, d| acc + d)
    }
}

/// Parses JSON numbers and numeric strings. `lenient` decides what
/// happens to anything else.
struct DecimalVisitor {
    lenient: bool,
}

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        Ok(Decimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        RustDecimal::from_u64(v)
            .map(Decimal)
            .ok_or_else(|| E::custom(format!("{} out of decimal range", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        // Shortest round-trip formatting keeps 0.1 as 0.1.
        match Decimal::from_str_canonical(&v.to_string()) {
            Ok(d) => Ok(d),
            Err(_) if self.lenient => Ok(Decimal::zero()),
            Err(e) => Err(E::custom(e)),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        if self.lenient {
            return Ok(Decimal::parse_or_zero(v));
        }
        Decimal::from_str_canonical(v).map_err(E::custom)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Decimal, E> {
        if self.lenient {
            Ok(Decimal::zero())
        } else {
            Err(E::invalid_type(de::Unexpected::Unit, &self))
        }
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor { lenient: false })
    }
}

/// Serde adapter for fields where a blank, null or non-numeric value must
/// read as zero (volumes and rates typed in by hand upstream).
pub mod lenient {
    use super::{Decimal, DecimalVisitor};
    use serde::{Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        deserializer.deserialize_any(DecimalVisitor { lenient: true })
    }
}

/// Serde adapter for optional overrides: null, blank and non-numeric
/// values read as absent so the caller's fallback applies.
pub mod lenient_opt {
    use super::{Decimal, RustDecimal};
    use rust_decimal::prelude::FromPrimitive;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serialize, Serializer};
    use std::fmt;

    struct OptionalDecimalVisitor;

    impl<'de> Visitor<'de> for OptionalDecimalVisitor {
        type Value = Option<Decimal>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an optional decimal number or numeric string")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(
            self,
            deserializer: D,
        ) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_any(self)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(Decimal::from(v)))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(RustDecimal::from_u64(v).map(Decimal))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Decimal::from_str_canonical(&v.to_string()).ok())
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            match Decimal::from_str_canonical(v) {
                Ok(d) => Ok(Some(d)),
                Err(_) => {
                    if !v.trim().is_empty() {
                        tracing::debug!(value = v, "non-numeric value read as absent");
                    }
                    Ok(None)
                }
            }
        }
    }

    pub fn serialize<S: Serializer>(
        value: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        deserializer.deserialize_option(OptionalDecimalVisitor)
    }
}
