//! Sub-delegation grant storage trait.

use crate::StoreError;
use delegraph_types::{Address, Timestamp, VotePower};
use serde::{Deserialize, Serialize};

/// How a grant's allowance field is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllowanceKind {
    /// Fixed cap in raw token units, independent of the ceiling.
    Absolute,
    /// Fraction of the current ceiling, in parts-per-100000.
    Relative,
}

/// Key of the current sub-delegation rule for an ordered (from, to) pair.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GrantKey {
    pub from: Address,
    pub to: Address,
}

/// The current sub-delegation rule for a (from, to) pair.
///
/// Rule fields are replaced wholesale on each new grant event for the same
/// pair; `applied_power` is the cache that makes delta application possible
/// and is carried across replacements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubDelegationGrant {
    pub from: Address,
    pub to: Address,
    pub max_redelegations: u32,
    pub blocks_before_vote_closes: u32,
    /// Open boundary of the validity window.
    pub not_valid_before: Timestamp,
    /// Close boundary of the validity window. `Timestamp::EPOCH` (zero) is a
    /// sentinel meaning the grant has no active window and never applies.
    pub not_valid_after: Timestamp,
    /// Opaque custom-rule contract address, passed through to consumers.
    pub custom_rule: Address,
    pub allowance_kind: AllowanceKind,
    /// Raw units (Absolute) or parts-per-100000 of the ceiling (Relative).
    #[serde(with = "delegraph_types::u128_str")]
    pub allowance: u128,
    /// Power last applied to the recipient by the propagator.
    pub applied_power: VotePower,
}

impl SubDelegationGrant {
    pub fn key(&self) -> GrantKey {
        GrantKey {
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }

    /// Window membership at `reference_time`. A zero close boundary is the
    /// "never applies" sentinel, not an open-ended window.
    pub fn is_active_at(&self, reference_time: Timestamp) -> bool {
        !self.not_valid_after.is_epoch()
            && self.not_valid_before <= reference_time
            && reference_time <= self.not_valid_after
    }
}

/// Trait for grant storage operations.
pub trait GrantStore {
    fn get_grant(&self, key: &GrantKey) -> Result<Option<SubDelegationGrant>, StoreError>;
    /// Full replace of the rule for the grant's (from, to) pair.
    fn put_grant(&self, grant: &SubDelegationGrant) -> Result<(), StoreError>;
    /// All grants whose recipient is `to` (secondary index).
    fn grants_to(&self, to: &Address) -> Result<Vec<SubDelegationGrant>, StoreError>;
    fn grant_count(&self) -> Result<u64, StoreError>;
}
