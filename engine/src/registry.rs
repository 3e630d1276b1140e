//! Get-or-create accessors for accounts and delegates.
//!
//! "Not found" is never an error here — a missing entity is the normal
//! create-default path. Defaults are not persisted until a caller mutates
//! and saves. Entities are never deleted.

use crate::error::EngineError;
use crate::resolver::ProxyResolver;
use crate::session::Session;
use delegraph_store::{day_start, Account, DailyBalance, DailyDelegate, Delegate, Store};
use delegraph_types::{Address, Timestamp, VotePower};

impl<S: Store, R: ProxyResolver> Session<S, R> {
    /// Load an account, or a zero-valued one if absent (not persisted).
    pub fn get_or_create_account(&self, address: &Address) -> Result<Account, EngineError> {
        Ok(self
            .store
            .get_account(address)?
            .unwrap_or_else(|| Account::empty(address.clone())))
    }

    /// Load a delegate, or a zero-valued one if absent (not persisted).
    pub fn get_or_create_delegate(&self, address: &Address) -> Result<Delegate, EngineError> {
        Ok(self
            .store
            .get_delegate(address)?
            .unwrap_or_else(|| Delegate::empty(address.clone())))
    }

    /// Add `value` to an account's balance and persist.
    pub fn credit_balance(&self, address: &Address, value: VotePower) -> Result<(), EngineError> {
        let mut account = self.get_or_create_account(address)?;
        account.balance = account.balance.checked_add(value).ok_or_else(|| {
            EngineError::Consistency(format!("balance overflow for {address}"))
        })?;
        self.store.put_account(&account)?;
        Ok(())
    }

    /// Subtract `value` from an account's balance and persist.
    ///
    /// Underflow means the event stream debited more than the account holds,
    /// which only an ordering or upstream-data violation can produce.
    pub fn debit_balance(&self, address: &Address, value: VotePower) -> Result<(), EngineError> {
        let mut account = self.get_or_create_account(address)?;
        account.balance = account.balance.checked_sub(value).ok_or_else(|| {
            EngineError::Consistency(format!(
                "balance underflow for {address}: {} - {value}",
                account.balance
            ))
        })?;
        self.store.put_account(&account)?;
        Ok(())
    }

    /// Record a holder's new delegation target.
    pub fn set_delegation_target(
        &self,
        delegator: &Address,
        target: &Address,
    ) -> Result<(), EngineError> {
        let mut account = self.get_or_create_account(delegator)?;
        account.delegated_to = Some(target.clone());
        self.store.put_account(&account)?;
        Ok(())
    }

    /// Overwrite a delegate's direct power from a vote checkpoint and keep
    /// `total_power` consistent. Returns the persisted record.
    pub fn set_direct_power(
        &self,
        delegate: &Address,
        new_power: VotePower,
    ) -> Result<Delegate, EngineError> {
        let mut record = self.get_or_create_delegate(delegate)?;
        record.direct_power = new_power;
        record.total_power = record.direct_power.checked_add(record.sub_power).ok_or_else(
            || EngineError::Consistency(format!("total power overflow for {delegate}")),
        )?;
        self.store.put_delegate(&record)?;
        Ok(record)
    }

    /// Record the account's current balance in the day bucket containing
    /// `at`. Repeated writes within a day keep the last value.
    pub fn snapshot_balance(&self, address: &Address, at: Timestamp) -> Result<(), EngineError> {
        let account = self.get_or_create_account(address)?;
        self.store.put_daily_balance(&DailyBalance {
            account: address.clone(),
            date: day_start(at),
            balance: account.balance,
        })?;
        Ok(())
    }

    /// Record the delegate's current direct power in the day bucket
    /// containing `at`.
    pub fn snapshot_direct_power(
        &self,
        delegate: &Address,
        at: Timestamp,
    ) -> Result<(), EngineError> {
        let record = self.get_or_create_delegate(delegate)?;
        self.store.put_daily_delegate(&DailyDelegate {
            delegate: delegate.clone(),
            date: day_start(at),
            direct_power: record.direct_power,
        })?;
        Ok(())
    }
}
