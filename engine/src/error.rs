use crate::resolver::ResolveError;
use delegraph_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage I/O failure — aborts the current event or trigger and is
    /// surfaced to the driving pipeline, never retried inside the core.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The single external capability (proxy resolution) failed.
    #[error("proxy resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// A numeric invariant was violated at runtime (negative power, balance
    /// underflow). Indicates an ordering or upstream-data violation; fatal.
    #[error("consistency violation: {0}")]
    Consistency(String),
}
