//! In-memory storage backend — thread-safe, deterministic.
//!
//! Backs the replay driver and every test. Each table is a Mutex-guarded
//! map; the trigger timestamp index is a BTreeMap so due triggers can be
//! range-scanned in order. Index maintenance happens inside the same call
//! that mutates the primary table, so the two can never diverge.

use delegraph_store::{
    Account, AccountStore, DailyBalance, DailyDelegate, Delegate, DelegateStore, GrantKey,
    GrantStore, ProxyRecord, ProxyStore, SnapshotStore, StoreError, SubDelegationGrant,
    Trigger, TriggerKey, TriggerStore,
};
use delegraph_types::{Address, Timestamp};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

/// An in-memory implementation of every store trait.
pub struct MemoryStore {
    accounts: Mutex<HashMap<String, Account>>,
    delegates: Mutex<HashMap<String, Delegate>>,
    grants: Mutex<HashMap<GrantKey, SubDelegationGrant>>,
    /// Secondary index: recipient address → grant keys.
    grants_by_to: Mutex<HashMap<String, BTreeSet<GrantKey>>>,
    proxies: Mutex<HashMap<String, ProxyRecord>>,
    triggers: Mutex<HashMap<TriggerKey, Trigger>>,
    /// Secondary index: due timestamp → trigger keys (the trigger container).
    trigger_buckets: Mutex<BTreeMap<u64, BTreeSet<TriggerKey>>>,
    /// Daily snapshots, keyed (address, day-bucket open timestamp).
    daily_balances: Mutex<HashMap<(String, u64), DailyBalance>>,
    daily_delegates: Mutex<HashMap<(String, u64), DailyDelegate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            delegates: Mutex::new(HashMap::new()),
            grants: Mutex::new(HashMap::new()),
            grants_by_to: Mutex::new(HashMap::new()),
            proxies: Mutex::new(HashMap::new()),
            triggers: Mutex::new(HashMap::new()),
            trigger_buckets: Mutex::new(BTreeMap::new()),
            daily_balances: Mutex::new(HashMap::new()),
            daily_delegates: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for MemoryStore {
    fn get_account(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.lock().unwrap().get(address.as_str()).cloned())
    }

    fn put_account(&self, account: &Account) -> Result<(), StoreError> {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.address.as_str().to_string(), account.clone());
        Ok(())
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        Ok(self.accounts.lock().unwrap().len() as u64)
    }
}

impl DelegateStore for MemoryStore {
    fn get_delegate(&self, address: &Address) -> Result<Option<Delegate>, StoreError> {
        Ok(self.delegates.lock().unwrap().get(address.as_str()).cloned())
    }

    fn put_delegate(&self, delegate: &Delegate) -> Result<(), StoreError> {
        self.delegates
            .lock()
            .unwrap()
            .insert(delegate.address.as_str().to_string(), delegate.clone());
        Ok(())
    }

    fn delegate_count(&self) -> Result<u64, StoreError> {
        Ok(self.delegates.lock().unwrap().len() as u64)
    }

    fn iter_delegates(&self) -> Result<Vec<Delegate>, StoreError> {
        let mut all: Vec<Delegate> = self.delegates.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(all)
    }
}

impl GrantStore for MemoryStore {
    fn get_grant(&self, key: &GrantKey) -> Result<Option<SubDelegationGrant>, StoreError> {
        Ok(self.grants.lock().unwrap().get(key).cloned())
    }

    fn put_grant(&self, grant: &SubDelegationGrant) -> Result<(), StoreError> {
        let key = grant.key();
        self.grants_by_to
            .lock()
            .unwrap()
            .entry(grant.to.as_str().to_string())
            .or_default()
            .insert(key.clone());
        self.grants.lock().unwrap().insert(key, grant.clone());
        Ok(())
    }

    fn grants_to(&self, to: &Address) -> Result<Vec<SubDelegationGrant>, StoreError> {
        let index = self.grants_by_to.lock().unwrap();
        let grants = self.grants.lock().unwrap();
        let Some(keys) = index.get(to.as_str()) else {
            return Ok(Vec::new());
        };
        keys.iter()
            .map(|k| {
                grants.get(k).cloned().ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "grant index points at missing record {}→{}",
                        k.from, k.to
                    ))
                })
            })
            .collect()
    }

    fn grant_count(&self) -> Result<u64, StoreError> {
        Ok(self.grants.lock().unwrap().len() as u64)
    }
}

impl ProxyStore for MemoryStore {
    fn get_proxy(&self, owner: &Address) -> Result<Option<ProxyRecord>, StoreError> {
        Ok(self.proxies.lock().unwrap().get(owner.as_str()).cloned())
    }

    fn put_proxy(&self, record: &ProxyRecord) -> Result<(), StoreError> {
        self.proxies
            .lock()
            .unwrap()
            .insert(record.owner.as_str().to_string(), record.clone());
        Ok(())
    }

    fn proxy_count(&self) -> Result<u64, StoreError> {
        Ok(self.proxies.lock().unwrap().len() as u64)
    }
}

impl TriggerStore for MemoryStore {
    fn get_trigger(&self, key: &TriggerKey) -> Result<Option<Trigger>, StoreError> {
        Ok(self.triggers.lock().unwrap().get(key).cloned())
    }

    fn put_trigger(&self, trigger: &Trigger) -> Result<(), StoreError> {
        let key = trigger.key();
        let mut triggers = self.triggers.lock().unwrap();
        let mut buckets = self.trigger_buckets.lock().unwrap();
        if let Some(old) = triggers.get(&key) {
            if old.at != trigger.at {
                remove_from_bucket(&mut buckets, old.at, &key);
            }
        }
        buckets
            .entry(trigger.at.as_secs())
            .or_default()
            .insert(key.clone());
        triggers.insert(key, trigger.clone());
        Ok(())
    }

    fn delete_trigger(&self, key: &TriggerKey) -> Result<(), StoreError> {
        let mut triggers = self.triggers.lock().unwrap();
        let mut buckets = self.trigger_buckets.lock().unwrap();
        if let Some(old) = triggers.remove(key) {
            remove_from_bucket(&mut buckets, old.at, key);
        }
        Ok(())
    }

    fn triggers_due(
        &self,
        from_ts: Timestamp,
        to_ts: Timestamp,
    ) -> Result<Vec<Trigger>, StoreError> {
        let triggers = self.triggers.lock().unwrap();
        let buckets = self.trigger_buckets.lock().unwrap();
        let mut due = Vec::new();
        for (_, keys) in buckets.range(from_ts.as_secs()..=to_ts.as_secs()) {
            for key in keys {
                let trigger = triggers.get(key).ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "trigger bucket points at missing record {}→{}",
                        key.from, key.to
                    ))
                })?;
                due.push(trigger.clone());
            }
        }
        Ok(due)
    }

    fn trigger_count(&self) -> Result<u64, StoreError> {
        Ok(self.triggers.lock().unwrap().len() as u64)
    }
}

impl SnapshotStore for MemoryStore {
    fn get_daily_balance(
        &self,
        account: &Address,
        date: Timestamp,
    ) -> Result<Option<DailyBalance>, StoreError> {
        Ok(self
            .daily_balances
            .lock()
            .unwrap()
            .get(&(account.as_str().to_string(), date.as_secs()))
            .cloned())
    }

    fn put_daily_balance(&self, snapshot: &DailyBalance) -> Result<(), StoreError> {
        self.daily_balances.lock().unwrap().insert(
            (snapshot.account.as_str().to_string(), snapshot.date.as_secs()),
            snapshot.clone(),
        );
        Ok(())
    }

    fn get_daily_delegate(
        &self,
        delegate: &Address,
        date: Timestamp,
    ) -> Result<Option<DailyDelegate>, StoreError> {
        Ok(self
            .daily_delegates
            .lock()
            .unwrap()
            .get(&(delegate.as_str().to_string(), date.as_secs()))
            .cloned())
    }

    fn put_daily_delegate(&self, snapshot: &DailyDelegate) -> Result<(), StoreError> {
        self.daily_delegates.lock().unwrap().insert(
            (snapshot.delegate.as_str().to_string(), snapshot.date.as_secs()),
            snapshot.clone(),
        );
        Ok(())
    }

    fn daily_balance_count(&self) -> Result<u64, StoreError> {
        Ok(self.daily_balances.lock().unwrap().len() as u64)
    }

    fn daily_delegate_count(&self) -> Result<u64, StoreError> {
        Ok(self.daily_delegates.lock().unwrap().len() as u64)
    }
}

fn remove_from_bucket(
    buckets: &mut BTreeMap<u64, BTreeSet<TriggerKey>>,
    at: Timestamp,
    key: &TriggerKey,
) {
    if let Some(set) = buckets.get_mut(&at.as_secs()) {
        set.remove(key);
        if set.is_empty() {
            buckets.remove(&at.as_secs());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delegraph_store::Boundary;

    fn addr(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n))
    }

    fn trigger(from: u8, to: u8, boundary: Boundary, at: u64) -> Trigger {
        Trigger {
            from: addr(from),
            to: addr(to),
            boundary,
            at: Timestamp::new(at),
        }
    }

    #[test]
    fn account_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_account(&addr(1)).unwrap(), None);
        let account = Account::empty(addr(1));
        store.put_account(&account).unwrap();
        assert_eq!(store.get_account(&addr(1)).unwrap(), Some(account));
        assert_eq!(store.account_count().unwrap(), 1);
    }

    #[test]
    fn triggers_due_respects_range() {
        let store = MemoryStore::new();
        store.put_trigger(&trigger(1, 2, Boundary::Start, 100)).unwrap();
        store.put_trigger(&trigger(3, 4, Boundary::Start, 150)).unwrap();
        store.put_trigger(&trigger(5, 6, Boundary::Start, 201)).unwrap();

        let due = store
            .triggers_due(Timestamp::new(100), Timestamp::new(200))
            .unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].at, Timestamp::new(100));
        assert_eq!(due[1].at, Timestamp::new(150));
    }

    #[test]
    fn put_trigger_moves_bucket_entry() {
        let store = MemoryStore::new();
        store.put_trigger(&trigger(1, 2, Boundary::Start, 100)).unwrap();
        store.put_trigger(&trigger(1, 2, Boundary::Start, 300)).unwrap();

        assert!(store
            .triggers_due(Timestamp::new(0), Timestamp::new(200))
            .unwrap()
            .is_empty());
        let due = store
            .triggers_due(Timestamp::new(300), Timestamp::new(300))
            .unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(store.trigger_count().unwrap(), 1);
    }

    #[test]
    fn delete_trigger_clears_bucket() {
        let store = MemoryStore::new();
        let t = trigger(1, 2, Boundary::End, 100);
        store.put_trigger(&t).unwrap();
        store.delete_trigger(&t.key()).unwrap();
        assert!(store
            .triggers_due(Timestamp::new(0), Timestamp::new(1000))
            .unwrap()
            .is_empty());
        assert_eq!(store.trigger_count().unwrap(), 0);
        // Deleting an absent key is a no-op.
        store.delete_trigger(&t.key()).unwrap();
    }

    #[test]
    fn grants_to_uses_recipient_index() {
        let store = MemoryStore::new();
        let mut g = SubDelegationGrant {
            from: addr(1),
            to: addr(9),
            max_redelegations: 0,
            blocks_before_vote_closes: 0,
            not_valid_before: Timestamp::EPOCH,
            not_valid_after: Timestamp::new(10),
            custom_rule: Address::zero(),
            allowance_kind: delegraph_store::AllowanceKind::Absolute,
            allowance: 5,
            applied_power: delegraph_types::VotePower::ZERO,
        };
        store.put_grant(&g).unwrap();
        g.from = addr(2);
        store.put_grant(&g).unwrap();
        g.to = addr(8);
        store.put_grant(&g).unwrap();

        assert_eq!(store.grants_to(&addr(9)).unwrap().len(), 2);
        assert_eq!(store.grants_to(&addr(8)).unwrap().len(), 1);
        assert_eq!(store.grants_to(&addr(7)).unwrap().len(), 0);
        assert_eq!(store.grant_count().unwrap(), 3);
    }

    #[test]
    fn daily_snapshots_replace_within_a_bucket() {
        use delegraph_types::VotePower;

        let store = MemoryStore::new();
        let day = Timestamp::new(86_400);
        store
            .put_daily_balance(&DailyBalance {
                account: addr(1),
                date: day,
                balance: VotePower::new(10),
            })
            .unwrap();
        store
            .put_daily_balance(&DailyBalance {
                account: addr(1),
                date: day,
                balance: VotePower::new(25),
            })
            .unwrap();
        store
            .put_daily_balance(&DailyBalance {
                account: addr(1),
                date: Timestamp::new(172_800),
                balance: VotePower::new(25),
            })
            .unwrap();

        assert_eq!(store.daily_balance_count().unwrap(), 2);
        assert_eq!(
            store.get_daily_balance(&addr(1), day).unwrap().unwrap().balance,
            VotePower::new(25)
        );
        assert_eq!(store.get_daily_balance(&addr(2), day).unwrap(), None);

        store
            .put_daily_delegate(&DailyDelegate {
                delegate: addr(3),
                date: day,
                direct_power: VotePower::new(7),
            })
            .unwrap();
        assert_eq!(store.daily_delegate_count().unwrap(), 1);
        assert_eq!(
            store
                .get_daily_delegate(&addr(3), day)
                .unwrap()
                .unwrap()
                .direct_power,
            VotePower::new(7)
        );
    }
}
