//! Voting-power amount type.
//!
//! Amounts are fixed-point integers (u128 raw token units) to avoid
//! floating-point errors. The smallest unit is 1 raw.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};

/// Denominator for relative sub-delegation allowances (parts-per-100000).
pub const ALLOWANCE_SCALE: u128 = 100_000;

/// A voting-power (or balance) amount in raw token units.
///
/// Internally stored as u128 for precision. On the wire amounts are decimal
/// strings (like on-chain uint256 values in JSON-RPC); plain JSON integers
/// up to u64 range are accepted on input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VotePower(u128);

impl VotePower {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Exact `floor(self * parts / ALLOWANCE_SCALE)`.
    ///
    /// Decomposed as `q * parts + (r * parts) / SCALE` with
    /// `q = self / SCALE`, `r = self % SCALE`, which is an exact floor.
    /// The saturating multiplies only engage when the true product exceeds
    /// u128 range, in which case the result is at least `self` and callers
    /// clamping to a ceiling `<= self` still observe the exact value.
    pub fn scale(self, parts: u128) -> Self {
        let q = self.0 / ALLOWANCE_SCALE;
        let r = self.0 % ALLOWANCE_SCALE;
        let whole = q.saturating_mul(parts);
        let frac = r.saturating_mul(parts) / ALLOWANCE_SCALE;
        Self(whole.saturating_add(frac))
    }
}

impl Add for VotePower {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for VotePower {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for VotePower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for VotePower {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VotePower {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(U128Visitor).map(Self)
    }
}

struct U128Visitor;

impl<'de> Visitor<'de> for U128Visitor {
    type Value = u128;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an unsigned amount as a decimal string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
        Ok(v.into())
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
        Ok(v)
    }
}

/// Serde adapter for raw `u128` fields: decimal string on the wire, with
/// the same lenient input handling as [`VotePower`].
pub mod u128_str {
    use super::U128Visitor;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        deserializer.deserialize_any(U128Visitor)
    }
}
