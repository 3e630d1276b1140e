//! Event dispatch and the per-block boundary callback.

use crate::error::PipelineError;
use crate::event::{ChainEvent, EventKind, GrantRules, GrantSpec};
use delegraph_engine::{ProxyResolver, Session};
use delegraph_store::{GrantKey, GrantStore, Store};
use delegraph_types::{Address, Timestamp, VotePower};

/// Applies events in strictly increasing (block number, log index) order and
/// runs the trigger scan at each block boundary.
pub struct Processor<S, R> {
    session: Session<S, R>,
    /// Coordinates of the last applied event.
    cursor: Option<(u64, u64)>,
}

impl<S: Store, R: ProxyResolver> Processor<S, R> {
    pub fn new(session: Session<S, R>) -> Self {
        Self {
            session,
            cursor: None,
        }
    }

    pub fn session(&self) -> &Session<S, R> {
        &self.session
    }

    /// Apply one event. Fails without partial effects being rolled back if
    /// the store errors mid-event; the driving pipeline decides whether to
    /// re-deliver the block.
    pub fn apply(&mut self, event: &ChainEvent) -> Result<(), PipelineError> {
        let position = (event.meta.block_number, event.meta.log_index);
        if let Some(last) = self.cursor {
            if position <= last {
                return Err(PipelineError::OutOfOrder {
                    block: position.0,
                    log_index: position.1,
                    last_block: last.0,
                    last_log_index: last.1,
                });
            }
        }

        let at = event.meta.block_timestamp;
        match &event.kind {
            EventKind::Grant { from, to, rules } => {
                self.session.resolve_proxy(from)?;
                self.apply_grant(from, to, rules.clone(), at)?;
            }
            EventKind::GrantBatch { from, to, rules } => {
                self.session.resolve_proxy(from)?;
                for recipient in to {
                    self.apply_grant(from, recipient, rules.clone(), at)?;
                }
            }
            EventKind::GrantBatchEach { from, grants } => {
                self.session.resolve_proxy(from)?;
                for GrantSpec { to, rules } in grants {
                    self.apply_grant(from, to, rules.clone(), at)?;
                }
            }
            EventKind::VotesChanged {
                delegate,
                previous_balance: _,
                new_balance,
            } => {
                self.apply_votes_changed(delegate, *new_balance, at)?;
            }
            EventKind::Transfer { from, to, value } => {
                self.apply_transfer(from, to, *value, at)?;
            }
            EventKind::DelegationChanged {
                delegator,
                from_delegate: _,
                to_delegate,
            } => {
                self.session.set_delegation_target(delegator, to_delegate)?;
            }
        }

        self.cursor = Some(position);
        Ok(())
    }

    /// Run the trigger catch-up scan for a fully-applied block. Returns the
    /// number of recomputations fired.
    pub fn end_block(&self, block_timestamp: Timestamp) -> Result<usize, PipelineError> {
        Ok(self.session.scan(block_timestamp)?)
    }

    /// Replace the (from, to) rule wholesale and re-evaluate it. The
    /// previous record's applied power is carried into the replacement.
    fn apply_grant(
        &self,
        from: &Address,
        to: &Address,
        rules: GrantRules,
        at: Timestamp,
    ) -> Result<(), PipelineError> {
        let key = GrantKey {
            from: from.clone(),
            to: to.clone(),
        };
        let carried = self
            .session
            .store()
            .get_grant(&key)
            .map_err(delegraph_engine::EngineError::from)?
            .map(|g| g.applied_power)
            .unwrap_or(VotePower::ZERO);
        let grant = rules.into_grant(from.clone(), to.clone(), carried);
        self.session.recompute(&grant, at)?;
        tracing::debug!(from = %from, to = %to, at = %at, "sub-delegation rule replaced");
        Ok(())
    }

    /// Checkpoint a delegate's direct power, then re-evaluate every grant
    /// whose ceiling contains it: grants flowing to this delegate's proxy
    /// account (cache lookup only — no resolution on this path).
    fn apply_votes_changed(
        &self,
        delegate: &Address,
        new_balance: VotePower,
        at: Timestamp,
    ) -> Result<(), PipelineError> {
        self.session.set_direct_power(delegate, new_balance)?;
        self.session.snapshot_direct_power(delegate, at)?;

        if let Some(proxy) = self.session.lookup_proxy(delegate)? {
            let dependent = self
                .session
                .store()
                .grants_to(&proxy)
                .map_err(delegraph_engine::EngineError::from)?;
            for grant in dependent {
                self.session.recompute(&grant, at)?;
            }
        }
        Ok(())
    }

    /// Move balance between accounts (the zero address marks mints and
    /// burns) and snapshot each touched account's day bucket.
    fn apply_transfer(
        &self,
        from: &Address,
        to: &Address,
        value: VotePower,
        at: Timestamp,
    ) -> Result<(), PipelineError> {
        if from.is_zero() {
            self.session.credit_balance(to, value)?;
            self.session.snapshot_balance(to, at)?;
        } else if to.is_zero() {
            self.session.debit_balance(from, value)?;
            self.session.snapshot_balance(from, at)?;
        } else {
            self.session.debit_balance(from, value)?;
            self.session.credit_balance(to, value)?;
            self.session.snapshot_balance(from, at)?;
            self.session.snapshot_balance(to, at)?;
        }
        Ok(())
    }
}

/// Statistics from one journal replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub events: u64,
    pub blocks: u64,
    pub triggers_fired: u64,
}

/// Drive a flat, ordered event stream through a processor, running the
/// block-boundary scan between blocks and after the final one.
pub fn replay<S, R, I>(processor: &mut Processor<S, R>, events: I) -> Result<ReplayStats, PipelineError>
where
    S: Store,
    R: ProxyResolver,
    I: IntoIterator<Item = ChainEvent>,
{
    let mut stats = ReplayStats::default();
    let mut open_block: Option<(u64, Timestamp)> = None;

    for event in events {
        if let Some((number, timestamp)) = open_block {
            if event.meta.block_number > number {
                stats.triggers_fired += processor.end_block(timestamp)? as u64;
                stats.blocks += 1;
            }
        }
        processor.apply(&event)?;
        open_block = Some((event.meta.block_number, event.meta.block_timestamp));
        stats.events += 1;
    }
    if let Some((number, timestamp)) = open_block {
        stats.triggers_fired += processor.end_block(timestamp)? as u64;
        stats.blocks += 1;
        tracing::info!(
            events = stats.events,
            blocks = stats.blocks,
            last_block = number,
            "replay complete"
        );
    }
    Ok(stats)
}
