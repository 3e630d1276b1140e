//! Voting-power propagation engine.
//!
//! The engine maintains, as derived state over an abstract keyed store, each
//! governance delegate's voting power: power held directly plus power
//! received through time-bounded, amount-bounded sub-delegation grants.
//!
//! All work happens through a [`Session`] — an explicit per-run context that
//! owns the store handle, the external proxy-resolver client, and the engine
//! configuration. There is no ambient or process-wide state.
//!
//! - [`propagator`]: computes a grant's currently-applied power and applies
//!   the delta to the recipient's aggregate.
//! - [`scheduler`]: keeps recomputation triggers in sync with grant window
//!   boundaries and performs the per-block catch-up scan.
//! - [`resolver`]: cached, resolve-at-most-once proxy account lookup.
//! - [`registry`]: get-or-create accessors for accounts and delegates.

pub mod config;
pub mod error;
pub mod propagator;
pub mod registry;
pub mod resolver;
pub mod scheduler;
mod session;

pub use config::{EngineConfig, DEFAULT_TRIGGER_LOOKBACK};
pub use error::EngineError;
pub use resolver::{ProxyResolver, ResolveError, StaticProxyResolver};
pub use session::Session;
