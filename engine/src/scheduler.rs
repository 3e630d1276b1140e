//! The trigger scheduler.
//!
//! State changes are driven only by discrete events, but a grant's window
//! boundaries are points in continuous time that can fall between blocks.
//! The scheduler keeps one pending trigger per (pair, boundary) at the
//! boundary timestamp, and a bounded per-block catch-up scan re-invokes the
//! propagator for every trigger due in a trailing window.
//!
//! The start and end requirements are deliberately asymmetric — start while
//! the open boundary is strictly ahead of the reference time, end once the
//! close boundary is strictly behind it. This is observed reference behavior
//! and is pinned by tests below; the end trigger schedules one more pass at
//! `not_valid_after + 1` after an already-observed expiry.

use crate::error::EngineError;
use crate::resolver::ProxyResolver;
use crate::session::Session;
use delegraph_store::{Boundary, GrantKey, Store, SubDelegationGrant, Trigger, TriggerKey};
use delegraph_types::Timestamp;

impl<S: Store, R: ProxyResolver> Session<S, R> {
    /// Bring the grant's start/end triggers in line with `reference_time`:
    /// remove triggers whose requirement no longer holds, ensure one exists
    /// at each still-required boundary timestamp.
    pub(crate) fn refresh_triggers(
        &self,
        grant: &SubDelegationGrant,
        reference_time: Timestamp,
    ) -> Result<(), EngineError> {
        let require_start = grant.not_valid_before > reference_time;
        // A zero close boundary is the "never applies" sentinel; there is no
        // end boundary to fire for.
        let require_end =
            !grant.not_valid_after.is_epoch() && grant.not_valid_after < reference_time;

        self.sync_trigger(grant, Boundary::Start, require_start, grant.not_valid_before)?;
        self.sync_trigger(
            grant,
            Boundary::End,
            require_end,
            grant.not_valid_after.saturating_add_secs(1),
        )?;
        Ok(())
    }

    fn sync_trigger(
        &self,
        grant: &SubDelegationGrant,
        boundary: Boundary,
        required: bool,
        at: Timestamp,
    ) -> Result<(), EngineError> {
        let key = TriggerKey {
            from: grant.from.clone(),
            to: grant.to.clone(),
            boundary,
        };
        if !required {
            self.store.delete_trigger(&key)?;
            return Ok(());
        }
        match self.store.get_trigger(&key)? {
            Some(existing) if existing.at == at => Ok(()),
            _ => {
                self.store.put_trigger(&Trigger {
                    from: grant.from.clone(),
                    to: grant.to.clone(),
                    boundary,
                    at,
                })?;
                Ok(())
            }
        }
    }

    /// Per-block catch-up scan. Re-evaluates every grant with a trigger due
    /// in `[block_timestamp - lookback, block_timestamp]`. Recomputation is
    /// idempotent, so triggers already satisfied by an earlier block in the
    /// window are harmless to re-fire. Returns the number of recomputations.
    pub fn scan(&self, block_timestamp: Timestamp) -> Result<usize, EngineError> {
        let window_start = block_timestamp.saturating_sub_secs(self.config.trigger_lookback);
        let due = self.store.triggers_due(window_start, block_timestamp)?;
        let mut fired = 0;
        for trigger in due {
            let key = GrantKey {
                from: trigger.from.clone(),
                to: trigger.to.clone(),
            };
            match self.store.get_grant(&key)? {
                Some(grant) => {
                    self.recompute(&grant, block_timestamp)?;
                    fired += 1;
                }
                None => {
                    self.store.delete_trigger(&trigger.key())?;
                }
            }
        }
        if fired > 0 {
            tracing::debug!(
                block_timestamp = %block_timestamp,
                fired,
                "catch-up scan recomputed due grants"
            );
        }
        Ok(fired)
    }
}
