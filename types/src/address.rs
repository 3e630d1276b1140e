//! Chain account address type with `0x` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A chain account address, always prefixed with `0x`.
///
/// Stored as a lowercase hex string. Log decoding happens upstream, so this
/// type only normalizes and carries the value. Deserialization goes through
/// [`TryFrom<String>`], so checksummed (mixed-case) input from a journal
/// maps to the same value as its lowercase form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Address(String);

/// A string that is not a `0x`-prefixed hex address.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid address {0:?}: expected 0x-prefixed hex")]
pub struct AddressParseError(String);

impl Address {
    /// The standard prefix for all chain addresses.
    pub const PREFIX: &'static str = "0x";

    /// The zero address, used by the token contract for mints and burns.
    pub const ZERO: &'static str = "0x0000000000000000000000000000000000000000";

    /// Create a new address from a raw string, normalizing to lowercase.
    ///
    /// # Panics
    /// Panics if the string does not start with `0x`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s: String = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with 0x");
        Self(s.to_lowercase())
    }

    /// The zero address.
    pub fn zero() -> Self {
        Self(Self::ZERO.to_string())
    }

    /// Whether this is the zero address (mint/burn marker).
    pub fn is_zero(&self) -> bool {
        self.0 == Self::ZERO
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX)
            && self.0.len() > Self::PREFIX.len()
            && self.0[Self::PREFIX.len()..].chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    /// Parse and normalize untrusted input. Stricter than [`Address::new`]:
    /// the payload must be non-empty hex.
    fn try_from(s: String) -> Result<Self, Self::Error> {
        let lower = s.to_lowercase();
        let hex_payload = lower
            .strip_prefix(Self::PREFIX)
            .filter(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_hexdigit()));
        match hex_payload {
            Some(_) => Ok(Self(lower)),
            None => Err(AddressParseError(s)),
        }
    }
}
