//! The voting-power propagator.
//!
//! `recompute` is the single place where a grant's parameters, the grantor's
//! available power and the reference time are turned into applied power on
//! the recipient. It is total over the input domain and idempotent: calling
//! it twice with unchanged inputs persists identical records, which lets the
//! per-block catch-up scan re-fire triggers freely.

use crate::error::EngineError;
use crate::resolver::ProxyResolver;
use crate::session::Session;
use delegraph_store::{Store, SubDelegationGrant};
use delegraph_types::{Timestamp, VotePower};

impl<S: Store, R: ProxyResolver> Session<S, R> {
    /// Recompute a grant's applied power at `reference_time`, apply the
    /// delta to the recipient delegate, persist both records, and refresh
    /// the grant's window-boundary triggers.
    pub fn recompute(
        &self,
        grant: &SubDelegationGrant,
        reference_time: Timestamp,
    ) -> Result<VotePower, EngineError> {
        let ceiling = self.grant_ceiling(grant)?;

        let raw = if grant.is_active_at(reference_time) {
            match grant.allowance_kind {
                delegraph_store::AllowanceKind::Absolute => VotePower::new(grant.allowance),
                delegraph_store::AllowanceKind::Relative => ceiling.scale(grant.allowance),
            }
        } else {
            VotePower::ZERO
        };
        let applied = raw.min(ceiling);

        let previous = grant.applied_power;
        let mut recipient = self.get_or_create_delegate(&grant.to)?;
        if applied > previous {
            recipient.sub_power = recipient
                .sub_power
                .checked_add(applied - previous)
                .ok_or_else(|| {
                    EngineError::Consistency(format!("sub power overflow for {}", grant.to))
                })?;
        } else {
            recipient.sub_power = recipient
                .sub_power
                .checked_sub(previous - applied)
                .ok_or_else(|| {
                    EngineError::Consistency(format!(
                        "sub power underflow for {}: {} applied, {} held",
                        grant.to, previous, recipient.sub_power
                    ))
                })?;
        }
        recipient.total_power = recipient
            .direct_power
            .checked_add(recipient.sub_power)
            .ok_or_else(|| {
                EngineError::Consistency(format!("total power overflow for {}", grant.to))
            })?;
        self.store.put_delegate(&recipient)?;

        let mut updated = grant.clone();
        updated.applied_power = applied;
        self.store.put_grant(&updated)?;

        self.refresh_triggers(&updated, reference_time)?;

        if applied != previous {
            tracing::debug!(
                from = %grant.from,
                to = %grant.to,
                at = %reference_time,
                previous = %previous,
                applied = %applied,
                "propagated sub-delegation power"
            );
        }
        Ok(applied)
    }

    /// The allowance ceiling: the grantor's sub-delegatable power, plus the
    /// owner's directly-held power when the recipient is a resolved proxy
    /// account (the proxy can draw on the tokens its owner holds directly,
    /// not only on what was already sub-delegated to the owner).
    ///
    /// Reads persisted records only — never triggers proxy resolution.
    fn grant_ceiling(&self, grant: &SubDelegationGrant) -> Result<VotePower, EngineError> {
        let grantor = self.get_or_create_delegate(&grant.from)?;
        let mut ceiling = grantor.sub_power;

        if let Some(recipient) = self.store.get_delegate(&grant.to)? {
            if recipient.is_proxy {
                if let Some(owner) = &recipient.proxy_of {
                    let owner_direct = self
                        .store
                        .get_delegate(owner)?
                        .map(|d| d.direct_power)
                        .unwrap_or(VotePower::ZERO);
                    ceiling = ceiling.checked_add(owner_direct).ok_or_else(|| {
                        EngineError::Consistency(format!(
                            "ceiling overflow for grant {}→{}",
                            grant.from, grant.to
                        ))
                    })?;
                }
            }
        }
        Ok(ceiling)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::resolver::StaticProxyResolver;
    use crate::session::Session;
    use delegraph_store::{
        AllowanceKind, DelegateStore, GrantStore, SubDelegationGrant,
    };
    use delegraph_store_memory::MemoryStore;
    use delegraph_types::{Address, Timestamp, VotePower};

    fn addr(n: u8) -> Address {
        Address::new(format!("0x{:040x}", n))
    }

    fn session() -> Session<MemoryStore, StaticProxyResolver> {
        Session::new(
            MemoryStore::new(),
            StaticProxyResolver::default(),
            EngineConfig::default(),
        )
    }

    fn grant(kind: AllowanceKind, allowance: u128, nvb: u64, nva: u64) -> SubDelegationGrant {
        SubDelegationGrant {
            from: addr(1),
            to: addr(2),
            max_redelegations: 0,
            blocks_before_vote_closes: 0,
            not_valid_before: Timestamp::new(nvb),
            not_valid_after: Timestamp::new(nva),
            custom_rule: Address::zero(),
            allowance_kind: kind,
            allowance,
            applied_power: VotePower::ZERO,
        }
    }

    /// Give the grantor `sub` sub-delegatable power.
    fn seed_grantor<R: crate::ProxyResolver>(session: &Session<MemoryStore, R>, sub: u128) {
        let mut grantor = session.get_or_create_delegate(&addr(1)).unwrap();
        grantor.sub_power = VotePower::new(sub);
        grantor.total_power = grantor.direct_power + grantor.sub_power;
        session.store().put_delegate(&grantor).unwrap();
    }

    #[test]
    fn absolute_in_window() {
        let session = session();
        seed_grantor(&session, 10_000);
        let g = grant(AllowanceKind::Absolute, 500, 100, 200);

        let applied = session.recompute(&g, Timestamp::new(150)).unwrap();
        assert_eq!(applied, VotePower::new(500));

        let recipient = session.store().get_delegate(&addr(2)).unwrap().unwrap();
        assert_eq!(recipient.sub_power, VotePower::new(500));
        assert_eq!(recipient.total_power, VotePower::new(500));
        let stored = session.store().get_grant(&g.key()).unwrap().unwrap();
        assert_eq!(stored.applied_power, VotePower::new(500));
    }

    #[test]
    fn relative_in_window_floors() {
        let session = session();
        seed_grantor(&session, 1_000);
        let g = grant(AllowanceKind::Relative, 25_000, 100, 200);

        let applied = session.recompute(&g, Timestamp::new(150)).unwrap();
        assert_eq!(applied, VotePower::new(250));
    }

    #[test]
    fn out_of_window_applies_zero() {
        let session = session();
        seed_grantor(&session, 10_000);
        let g = grant(AllowanceKind::Absolute, 500, 100, 200);

        assert_eq!(session.recompute(&g, Timestamp::new(99)).unwrap(), VotePower::ZERO);
        assert_eq!(session.recompute(&g, Timestamp::new(201)).unwrap(), VotePower::ZERO);
    }

    #[test]
    fn sentinel_close_boundary_applies_zero() {
        let session = session();
        seed_grantor(&session, 10_000);
        let g = grant(AllowanceKind::Absolute, 500, 0, 0);
        assert_eq!(session.recompute(&g, Timestamp::new(150)).unwrap(), VotePower::ZERO);
    }

    #[test]
    fn applied_power_is_clamped_to_ceiling() {
        let session = session();
        seed_grantor(&session, 300);
        let g = grant(AllowanceKind::Absolute, 500, 100, 200);

        let applied = session.recompute(&g, Timestamp::new(150)).unwrap();
        assert_eq!(applied, VotePower::new(300));
    }

    #[test]
    fn relative_above_full_allowance_is_clamped() {
        let session = session();
        seed_grantor(&session, 1_000);
        let g = grant(AllowanceKind::Relative, 250_000, 100, 200);
        assert_eq!(
            session.recompute(&g, Timestamp::new(150)).unwrap(),
            VotePower::new(1_000)
        );
    }

    #[test]
    fn recompute_is_idempotent() {
        let session = session();
        seed_grantor(&session, 10_000);
        let g = grant(AllowanceKind::Absolute, 500, 100, 200);

        session.recompute(&g, Timestamp::new(150)).unwrap();
        let stored = session.store().get_grant(&g.key()).unwrap().unwrap();
        let recipient = session.store().get_delegate(&addr(2)).unwrap().unwrap();

        session.recompute(&stored, Timestamp::new(150)).unwrap();
        assert_eq!(session.store().get_grant(&g.key()).unwrap().unwrap(), stored);
        assert_eq!(
            session.store().get_delegate(&addr(2)).unwrap().unwrap(),
            recipient
        );
    }

    #[test]
    fn shrinking_grant_subtracts_delta() {
        let session = session();
        seed_grantor(&session, 10_000);
        let g = grant(AllowanceKind::Absolute, 500, 100, 200);
        session.recompute(&g, Timestamp::new(150)).unwrap();

        // Past the window, the applied power must come back off.
        let stored = session.store().get_grant(&g.key()).unwrap().unwrap();
        session.recompute(&stored, Timestamp::new(300)).unwrap();

        let recipient = session.store().get_delegate(&addr(2)).unwrap().unwrap();
        assert_eq!(recipient.sub_power, VotePower::ZERO);
        assert_eq!(recipient.total_power, VotePower::ZERO);
    }

    #[test]
    fn ceiling_includes_owner_direct_power_for_proxy_recipient() {
        let resolver = StaticProxyResolver::default().with_entry(addr(5), addr(0x50));
        let session = Session::new(MemoryStore::new(), &resolver, EngineConfig::default());
        session.resolve_proxy(&addr(5)).unwrap();
        // Owner 5 holds 2000 directly; grantor 1 has 300 sub-delegatable.
        session.set_direct_power(&addr(5), VotePower::new(2_000)).unwrap();
        seed_grantor(&session, 300);

        let mut g = grant(AllowanceKind::Absolute, 1_500, 100, 200);
        g.to = addr(0x50);

        // Ceiling is 300 + 2000, so the absolute allowance fits.
        let applied = session.recompute(&g, Timestamp::new(150)).unwrap();
        assert_eq!(applied, VotePower::new(1_500));
    }

    #[test]
    fn stale_applied_power_without_held_sub_power_is_fatal() {
        let session = session();
        seed_grantor(&session, 10_000);
        let mut g = grant(AllowanceKind::Absolute, 500, 100, 200);
        // Claims 900 already applied, but the recipient holds nothing.
        g.applied_power = VotePower::new(900);

        let err = session.recompute(&g, Timestamp::new(150)).unwrap_err();
        assert!(matches!(err, crate::EngineError::Consistency(_)));
    }

    #[test]
    fn total_power_invariant_holds_through_mixed_updates() {
        let session = session();
        seed_grantor(&session, 10_000);
        session.set_direct_power(&addr(2), VotePower::new(42)).unwrap();
        let g = grant(AllowanceKind::Absolute, 500, 100, 200);
        session.recompute(&g, Timestamp::new(150)).unwrap();

        let recipient = session.store().get_delegate(&addr(2)).unwrap().unwrap();
        assert_eq!(
            recipient.total_power,
            recipient.direct_power + recipient.sub_power
        );
        assert_eq!(recipient.total_power, VotePower::new(542));
    }
}
