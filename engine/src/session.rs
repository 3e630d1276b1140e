//! Per-run processing context.

use crate::config::EngineConfig;
use crate::resolver::ProxyResolver;
use delegraph_store::Store;

/// Explicit context for one processing session.
///
/// Owns the store handle, the external proxy-resolver client, and the engine
/// configuration. Every engine operation is a method on this type; no state
/// lives anywhere else.
pub struct Session<S, R> {
    pub(crate) store: S,
    pub(crate) resolver: R,
    pub(crate) config: EngineConfig,
}

impl<S: Store, R: ProxyResolver> Session<S, R> {
    pub fn new(store: S, resolver: R, config: EngineConfig) -> Self {
        Self {
            store,
            resolver,
            config,
        }
    }

    /// The underlying store, for downstream readers (summaries, reports).
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
