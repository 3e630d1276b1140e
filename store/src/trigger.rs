//! Recomputation-trigger storage trait.
//!
//! Triggers mark future (or just-passed) grant window boundaries at which
//! the propagator must re-evaluate a grant even though no event arrives at
//! that instant. Backends maintain a timestamp-keyed secondary index (the
//! trigger container) transactionally with every put/delete so due triggers
//! can be range-scanned per block.

use crate::StoreError;
use delegraph_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};

/// Which window boundary a trigger fires for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Boundary {
    /// The window's open boundary (`not_valid_before`).
    Start,
    /// One tick past the window's close boundary (`not_valid_after + 1`).
    End,
}

/// Identity of a trigger: one per (pair, boundary).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerKey {
    pub from: Address,
    pub to: Address,
    pub boundary: Boundary,
}

/// A pending recomputation marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub from: Address,
    pub to: Address,
    pub boundary: Boundary,
    /// The timestamp at which recomputation must occur.
    pub at: Timestamp,
}

impl Trigger {
    pub fn key(&self) -> TriggerKey {
        TriggerKey {
            from: self.from.clone(),
            to: self.to.clone(),
            boundary: self.boundary,
        }
    }
}

/// Trait for trigger storage operations.
pub trait TriggerStore {
    fn get_trigger(&self, key: &TriggerKey) -> Result<Option<Trigger>, StoreError>;
    /// Insert or move a trigger, re-indexing its timestamp bucket.
    fn put_trigger(&self, trigger: &Trigger) -> Result<(), StoreError>;
    /// Remove a trigger and its bucket entry. Absent keys are a no-op.
    fn delete_trigger(&self, key: &TriggerKey) -> Result<(), StoreError>;
    /// All triggers with `from_ts <= at <= to_ts`, in (timestamp, key) order.
    fn triggers_due(
        &self,
        from_ts: Timestamp,
        to_ts: Timestamp,
    ) -> Result<Vec<Trigger>, StoreError>;
    fn trigger_count(&self) -> Result<u64, StoreError>;
}
