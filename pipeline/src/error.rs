use delegraph_engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Correctness depends on strictly increasing (block, log index) order;
    /// a violation means the upstream feed re-delivered or skipped.
    #[error("out-of-order event: block {block} log {log_index} after block {last_block} log {last_log_index}")]
    OutOfOrder {
        block: u64,
        log_index: u64,
        last_block: u64,
        last_log_index: u64,
    },
}
