//! Token-holder account storage trait.

use crate::StoreError;
use delegraph_types::{Address, VotePower};
use serde::{Deserialize, Serialize};

/// A token-holder account, created on its first balance-affecting event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    /// Current token balance in raw units. Never negative.
    pub balance: VotePower,
    /// Current delegation target, if the holder has delegated.
    pub delegated_to: Option<Address>,
}

impl Account {
    /// A zero-valued account for an address not yet persisted.
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            balance: VotePower::ZERO,
            delegated_to: None,
        }
    }
}

/// Trait for account storage operations. Accounts are never deleted.
pub trait AccountStore {
    fn get_account(&self, address: &Address) -> Result<Option<Account>, StoreError>;
    fn put_account(&self, account: &Account) -> Result<(), StoreError>;
    fn account_count(&self) -> Result<u64, StoreError>;
}
