//! Typed event model.
//!
//! Raw log decoding happens upstream; these are the already-typed fields the
//! indexer consumes, serde-serializable so journals can be replayed from
//! newline-delimited JSON.

use delegraph_store::{AllowanceKind, SubDelegationGrant};
use delegraph_types::{Address, Timestamp, VotePower};
use serde::{Deserialize, Serialize};

/// Block/transaction coordinates shared by every event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    pub block_number: u64,
    pub block_timestamp: Timestamp,
    pub transaction: String,
    pub log_index: u64,
}

/// Rule fields of a sub-delegation grant event, before keying.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRules {
    pub max_redelegations: u32,
    pub blocks_before_vote_closes: u32,
    pub not_valid_before: Timestamp,
    pub not_valid_after: Timestamp,
    pub custom_rule: Address,
    pub allowance_kind: AllowanceKind,
    #[serde(with = "delegraph_types::u128_str")]
    pub allowance: u128,
}

impl GrantRules {
    /// Key the rules into a grant record. `applied_power` is carried from
    /// the pair's previous record so the next recompute applies a delta
    /// instead of double-counting.
    pub fn into_grant(
        self,
        from: Address,
        to: Address,
        applied_power: VotePower,
    ) -> SubDelegationGrant {
        SubDelegationGrant {
            from,
            to,
            max_redelegations: self.max_redelegations,
            blocks_before_vote_closes: self.blocks_before_vote_closes,
            not_valid_before: self.not_valid_before,
            not_valid_after: self.not_valid_after,
            custom_rule: self.custom_rule,
            allowance_kind: self.allowance_kind,
            allowance: self.allowance,
            applied_power,
        }
    }
}

/// One recipient/rules pair of a per-recipient batch grant event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantSpec {
    pub to: Address,
    pub rules: GrantRules,
}

/// The event kinds of the ordered stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Grant created or replaced for one (from, to) pair.
    Grant {
        from: Address,
        to: Address,
        rules: GrantRules,
    },
    /// One set of rules shared across several recipients.
    GrantBatch {
        from: Address,
        to: Vec<Address>,
        rules: GrantRules,
    },
    /// Separate rules per recipient.
    GrantBatchEach { from: Address, grants: Vec<GrantSpec> },
    /// A delegate's direct voting power checkpoint changed.
    VotesChanged {
        delegate: Address,
        previous_balance: VotePower,
        new_balance: VotePower,
    },
    /// Token transfer; the zero address marks mints and burns.
    Transfer {
        from: Address,
        to: Address,
        value: VotePower,
    },
    /// A holder changed its delegation target.
    DelegationChanged {
        delegator: Address,
        from_delegate: Address,
        to_delegate: Address,
    },
}

/// A fully-typed event with its chain coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEvent {
    pub meta: EventMeta,
    pub kind: EventKind,
}
