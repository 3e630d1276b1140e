//! Abstract storage traits for the delegraph indexer.
//!
//! Every storage backend (in-memory for deterministic replay/testing, or an
//! embedded database) implements these traits. The rest of the codebase
//! depends only on the traits.

pub mod account;
pub mod delegate;
pub mod error;
pub mod grant;
pub mod proxy;
pub mod snapshot;
pub mod trigger;

pub use account::{Account, AccountStore};
pub use delegate::{Delegate, DelegateStore};
pub use error::StoreError;
pub use grant::{AllowanceKind, GrantKey, GrantStore, SubDelegationGrant};
pub use proxy::{ProxyRecord, ProxyStore};
pub use snapshot::{day_start, DailyBalance, DailyDelegate, SnapshotStore, DAY_SECONDS};
pub use trigger::{Boundary, Trigger, TriggerKey, TriggerStore};

/// The full repository surface the engine operates over.
///
/// Blanket-implemented for any backend providing every per-concern trait.
pub trait Store:
    AccountStore + DelegateStore + GrantStore + ProxyStore + SnapshotStore + TriggerStore
{
}

impl<T> Store for T where
    T: AccountStore + DelegateStore + GrantStore + ProxyStore + SnapshotStore + TriggerStore
{
}
