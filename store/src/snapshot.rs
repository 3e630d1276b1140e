//! Daily time-bucketed snapshots of balances and voting power.
//!
//! One record per (address, day bucket); writes within the same day replace
//! the record, so each bucket holds the last value observed that day.

use crate::StoreError;
use delegraph_types::{Address, Timestamp, VotePower};
use serde::{Deserialize, Serialize};

/// Length of one snapshot bucket.
pub const DAY_SECONDS: u64 = 86_400;

/// The UTC midnight opening the day bucket that contains `at`.
pub fn day_start(at: Timestamp) -> Timestamp {
    Timestamp::new(at.as_secs() / DAY_SECONDS * DAY_SECONDS)
}

/// An account's token balance as of one day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBalance {
    pub account: Address,
    /// Day-bucket open timestamp (UTC midnight).
    pub date: Timestamp,
    pub balance: VotePower,
}

/// A delegate's directly-delegated voting power as of one day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDelegate {
    pub delegate: Address,
    /// Day-bucket open timestamp (UTC midnight).
    pub date: Timestamp,
    pub direct_power: VotePower,
}

/// Trait for daily snapshot storage operations.
pub trait SnapshotStore {
    fn get_daily_balance(
        &self,
        account: &Address,
        date: Timestamp,
    ) -> Result<Option<DailyBalance>, StoreError>;
    fn put_daily_balance(&self, snapshot: &DailyBalance) -> Result<(), StoreError>;
    fn get_daily_delegate(
        &self,
        delegate: &Address,
        date: Timestamp,
    ) -> Result<Option<DailyDelegate>, StoreError>;
    fn put_daily_delegate(&self, snapshot: &DailyDelegate) -> Result<(), StoreError>;
    fn daily_balance_count(&self) -> Result<u64, StoreError>;
    fn daily_delegate_count(&self) -> Result<u64, StoreError>;
}
