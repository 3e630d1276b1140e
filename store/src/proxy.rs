//! Proxy-address mapping storage trait.

use crate::StoreError;
use delegraph_types::Address;
use serde::{Deserialize, Serialize};

/// Cached result of one external proxy resolution. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub owner: Address,
    pub proxy: Address,
}

/// Trait for the owner → proxy-account mapping.
pub trait ProxyStore {
    fn get_proxy(&self, owner: &Address) -> Result<Option<ProxyRecord>, StoreError>;
    fn put_proxy(&self, record: &ProxyRecord) -> Result<(), StoreError>;
    fn proxy_count(&self) -> Result<u64, StoreError>;
}
