//! Timestamp type used throughout the indexer.
//!
//! Timestamps are Unix epoch seconds (UTC), taken verbatim from block
//! headers. The indexer never consults the wall clock — time advances only
//! as blocks arrive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero). Doubles as the "no active window" sentinel on
    /// grant close boundaries.
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn is_epoch(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    pub fn saturating_sub_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_sentinel() {
        assert!(Timestamp::EPOCH.is_epoch());
        assert!(!Timestamp::new(1).is_epoch());
    }

    #[test]
    fn saturating_arithmetic() {
        assert_eq!(Timestamp::new(10).saturating_sub_secs(30), Timestamp::EPOCH);
        assert_eq!(
            Timestamp::new(u64::MAX).saturating_add_secs(1).as_secs(),
            u64::MAX
        );
    }
}
