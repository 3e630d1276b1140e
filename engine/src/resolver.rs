//! Proxy-account resolution with an at-most-once external call.
//!
//! A delegator's proxy account is a deterministic secondary address obtained
//! from one external synchronous read. The mapping is cached forever: the
//! first [`Session::resolve_proxy`] for an owner performs the call, every
//! later access is a pure cache read, and [`Session::lookup_proxy`] never
//! resolves at all — that is the form used on the propagator's hot path.

use crate::error::EngineError;
use crate::session::Session;
use delegraph_store::{ProxyRecord, Store};
use delegraph_types::Address;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Failure of the single external capability. There is no retry or timeout
/// semantics — resolution either completes or fails the current event.
#[derive(Debug, Error)]
#[error("proxy resolution failed for {owner}: {reason}")]
pub struct ResolveError {
    pub owner: Address,
    pub reason: String,
}

/// The external capability that maps an owner to its proxy account.
/// Blocking and synchronous; kept off the propagator's hot path.
pub trait ProxyResolver {
    fn resolve(&self, owner: &Address) -> Result<Address, ResolveError>;
}

impl<S: Store, R: ProxyResolver> Session<S, R> {
    /// Return the owner's proxy account, resolving and caching it on first
    /// use. Marks the resolved proxy's delegate record (`is_proxy`,
    /// `proxy_of`) so the propagator can recognize it without a lookup
    /// through the mapping.
    pub fn resolve_proxy(&self, owner: &Address) -> Result<Address, EngineError> {
        if let Some(record) = self.store.get_proxy(owner)? {
            return Ok(record.proxy);
        }
        let proxy = self.resolver.resolve(owner)?;
        self.store.put_proxy(&ProxyRecord {
            owner: owner.clone(),
            proxy: proxy.clone(),
        })?;
        let mut delegate = self.get_or_create_delegate(&proxy)?;
        delegate.is_proxy = true;
        delegate.proxy_of = Some(owner.clone());
        self.store.put_delegate(&delegate)?;
        tracing::debug!(owner = %owner, proxy = %proxy, "resolved proxy account");
        Ok(proxy)
    }

    /// Cache-only read of the owner's proxy account. Never resolves.
    pub fn lookup_proxy(&self, owner: &Address) -> Result<Option<Address>, EngineError> {
        Ok(self.store.get_proxy(owner)?.map(|r| r.proxy))
    }
}

/// A programmable resolver for tests and offline replay: serves from a fixed
/// table and counts external calls.
#[derive(Default)]
pub struct StaticProxyResolver {
    table: HashMap<Address, Address>,
    calls: AtomicUsize,
}

impl StaticProxyResolver {
    pub fn new(table: HashMap<Address, Address>) -> Self {
        Self {
            table,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_entry(mut self, owner: Address, proxy: Address) -> Self {
        self.table.insert(owner, proxy);
        self
    }

    /// Number of external calls performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl ProxyResolver for StaticProxyResolver {
    fn resolve(&self, owner: &Address) -> Result<Address, ResolveError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.table.get(owner).cloned().ok_or_else(|| ResolveError {
            owner: owner.clone(),
            reason: "no entry in static table".to_string(),
        })
    }
}

impl<T: ProxyResolver> ProxyResolver for &T {
    fn resolve(&self, owner: &Address) -> Result<Address, ResolveError> {
        (**self).resolve(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use delegraph_store::DelegateStore;
    use delegraph_store_memory::MemoryStore;

    fn addr(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n))
    }

    #[test]
    fn resolves_at_most_once_per_owner() {
        let resolver = StaticProxyResolver::default().with_entry(addr(1), addr(0x10));
        let session = Session::new(MemoryStore::new(), &resolver, EngineConfig::default());

        assert_eq!(session.resolve_proxy(&addr(1)).unwrap(), addr(0x10));
        assert_eq!(session.resolve_proxy(&addr(1)).unwrap(), addr(0x10));
        assert_eq!(session.resolve_proxy(&addr(1)).unwrap(), addr(0x10));
        assert_eq!(resolver.calls(), 1);
    }

    #[test]
    fn resolution_marks_proxy_delegate() {
        let resolver = StaticProxyResolver::default().with_entry(addr(1), addr(0x10));
        let session = Session::new(MemoryStore::new(), &resolver, EngineConfig::default());
        session.resolve_proxy(&addr(1)).unwrap();

        let proxy = session.store().get_delegate(&addr(0x10)).unwrap().unwrap();
        assert!(proxy.is_proxy);
        assert_eq!(proxy.proxy_of, Some(addr(1)));
    }

    #[test]
    fn lookup_never_resolves() {
        let resolver = StaticProxyResolver::default().with_entry(addr(1), addr(0x10));
        let session = Session::new(MemoryStore::new(), &resolver, EngineConfig::default());

        assert_eq!(session.lookup_proxy(&addr(1)).unwrap(), None);
        assert_eq!(resolver.calls(), 0);

        session.resolve_proxy(&addr(1)).unwrap();
        assert_eq!(session.lookup_proxy(&addr(1)).unwrap(), Some(addr(0x10)));
        assert_eq!(resolver.calls(), 1);
    }

    #[test]
    fn unresolvable_owner_fails_the_event() {
        let resolver = StaticProxyResolver::default();
        let session = Session::new(MemoryStore::new(), &resolver, EngineConfig::default());
        assert!(matches!(
            session.resolve_proxy(&addr(9)).unwrap_err(),
            crate::EngineError::Resolve(_)
        ));
    }
}
