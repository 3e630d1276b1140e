//! Engine configuration.

/// Default trailing window for the per-block trigger scan, in seconds.
///
/// Blocks do not arrive exactly once per second, so a boundary timestamp can
/// fall between two consecutive block timestamps; the scan re-examines this
/// many seconds behind each block to catch it. Recomputation is idempotent,
/// so overlapping scans across blocks are harmless.
pub const DEFAULT_TRIGGER_LOOKBACK: u64 = 600;

/// Tunable parameters for a processing session.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Size of the trigger catch-up scan window, in seconds.
    pub trigger_lookback: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trigger_lookback: DEFAULT_TRIGGER_LOOKBACK,
        }
    }
}
