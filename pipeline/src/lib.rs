//! Ordered event processing for the delegraph indexer.
//!
//! Events arrive one at a time in strictly increasing (block number, log
//! index) order. The [`Processor`] dispatches each event into the engine,
//! and after the last event of a block the per-block trigger scan runs with
//! that block's timestamp. [`replay`] drives both from a flat event stream.

pub mod error;
pub mod event;
pub mod processor;

pub use error::PipelineError;
pub use event::{ChainEvent, EventKind, EventMeta, GrantRules, GrantSpec};
pub use processor::{replay, Processor, ReplayStats};
