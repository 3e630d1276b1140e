//! Delegate storage trait.

use crate::StoreError;
use delegraph_types::{Address, VotePower};
use serde::{Deserialize, Serialize};

/// A governance delegate, created on its first vote-power event.
///
/// Invariant after every committed mutation:
/// `total_power == direct_power + sub_power`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegate {
    pub address: Address,
    /// Power held directly (token-contract vote checkpoints).
    pub direct_power: VotePower,
    /// Power received through currently-applied sub-delegation grants.
    pub sub_power: VotePower,
    /// Always `direct_power + sub_power`.
    pub total_power: VotePower,
    /// Whether this address is a resolved proxy account.
    pub is_proxy: bool,
    /// The owner this address proxies for, when `is_proxy`.
    pub proxy_of: Option<Address>,
}

impl Delegate {
    /// A zero-valued delegate for an address not yet persisted.
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            direct_power: VotePower::ZERO,
            sub_power: VotePower::ZERO,
            total_power: VotePower::ZERO,
            is_proxy: false,
            proxy_of: None,
        }
    }
}

/// Trait for delegate storage operations. Delegates are never deleted.
pub trait DelegateStore {
    fn get_delegate(&self, address: &Address) -> Result<Option<Delegate>, StoreError>;
    fn put_delegate(&self, delegate: &Delegate) -> Result<(), StoreError>;
    fn delegate_count(&self) -> Result<u64, StoreError>;
    /// Iterate all delegates (used by summary/reporting consumers).
    fn iter_delegates(&self) -> Result<Vec<Delegate>, StoreError>;
}
