//! Concurrency contract tests: exclusive ownership under racing assigns,
//! silent skips on conditional-write conflicts, and the quota invariant
//! under arbitrary operation sequences.

use chrono::Utc;
use hopper_core::{EntityId, HopperResult, Lead, LeadFilter, LeadStatus};
use hopper_engine::{Hopper, RecyclingSweeper};
use hopper_storage::{AgentDirectory, CasOutcome, InMemoryStore, LeadStore, LeadUpdate};
use hopper_test_utils::{agent_with_quota, seeded_store};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn hopper_over(store: &Arc<InMemoryStore>) -> Hopper {
    let leads: Arc<dyn LeadStore> = store.clone();
    let agents: Arc<dyn AgentDirectory> = store.clone();
    Hopper::new(leads, agents)
}

#[test]
fn concurrent_assigns_never_share_a_lead() {
    // Pool smaller than total demand: 4 agents x quota 5 over 10 leads
    let (store, first_agent, _) = seeded_store(10, 5);
    let mut agent_ids = vec![first_agent];
    for _ in 0..3 {
        let agent = agent_with_quota(5);
        store.agent_insert(&agent).unwrap();
        agent_ids.push(agent.agent_id);
    }
    let hopper = hopper_over(&store);

    let handles: Vec<_> = agent_ids
        .iter()
        .map(|&agent_id| {
            let hopper = hopper.clone();
            std::thread::spawn(move || hopper.assign(agent_id, 5).unwrap())
        })
        .collect();

    let results: Vec<Vec<Lead>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let total_claimed: usize = results.iter().map(|r| r.len()).sum();
    assert!(total_claimed <= 10);

    let mut seen = HashSet::new();
    for result in &results {
        for lead in result {
            assert!(
                seen.insert(lead.lead_id),
                "lead {} claimed by two agents",
                lead.lead_id
            );
        }
    }

    // Exclusive ownership in the store matches the returned results
    for result in &results {
        for lead in result {
            let stored = store.lead_get(lead.lead_id).unwrap().unwrap();
            assert_eq!(stored.assigned_agent_id, lead.assigned_agent_id);
        }
    }
}

#[test]
fn concurrent_sweeps_reclaim_each_lead_once() {
    let (store, agent_id, _) = seeded_store(0, 30);
    let now = Utc::now();
    for _ in 0..20 {
        hopper_test_utils::stale_lead(store.as_ref(), agent_id, now, chrono::Duration::days(8));
    }
    let hopper = hopper_over(&store);

    let later = now + chrono::Duration::seconds(1);
    let window = Duration::from_secs(7 * 24 * 3600);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let hopper = hopper.clone();
            std::thread::spawn(move || hopper.sweep(later, window, None).unwrap())
        })
        .collect();

    let total_reclaimed: u64 = handles
        .into_iter()
        .map(|h| h.join().unwrap().reclaimed)
        .sum();
    assert_eq!(total_reclaimed, 20);
    assert_eq!(store.lead_count(&LeadFilter::pool()).unwrap(), 20);
}

// ============================================================================
// MID-SWEEP RACE INJECTION
// ============================================================================

/// Store wrapper that closes a chosen lead right after the scan returns it,
/// so the sweep's release write arrives with a stale version.
struct RacingStore {
    inner: Arc<InMemoryStore>,
    sabotage: Mutex<Option<EntityId>>,
}

impl LeadStore for RacingStore {
    fn lead_insert(&self, lead: &Lead) -> HopperResult<()> {
        self.inner.lead_insert(lead)
    }

    fn lead_get(&self, id: EntityId) -> HopperResult<Option<Lead>> {
        self.inner.lead_get(id)
    }

    fn lead_query(&self, filter: &LeadFilter) -> HopperResult<Vec<Lead>> {
        let batch = self.inner.lead_query(filter)?;
        let mut sabotage = self.sabotage.lock().unwrap();
        if let Some(target) = *sabotage {
            if let Some(snapshot) = batch.iter().find(|lead| lead.lead_id == target) {
                // The "agent" closes the deal between scan and write
                let outcome = self.inner.lead_conditional_update(
                    target,
                    snapshot.version,
                    &LeadUpdate::close(LeadStatus::ClosedWon),
                )?;
                assert!(matches!(outcome, CasOutcome::Applied(_)));
                *sabotage = None;
            }
        }
        Ok(batch)
    }

    fn lead_count(&self, filter: &LeadFilter) -> HopperResult<usize> {
        self.inner.lead_count(filter)
    }

    fn lead_conditional_update(
        &self,
        id: EntityId,
        expected_version: i64,
        update: &LeadUpdate,
    ) -> HopperResult<CasOutcome> {
        self.inner.lead_conditional_update(id, expected_version, update)
    }
}

#[test]
fn lead_closed_mid_sweep_is_skipped_silently() {
    let inner = Arc::new(InMemoryStore::new());
    let agent_id = hopper_core::new_entity_id();
    let now = Utc::now();
    let doomed =
        hopper_test_utils::stale_lead(inner.as_ref(), agent_id, now, chrono::Duration::days(9));
    let plain =
        hopper_test_utils::stale_lead(inner.as_ref(), agent_id, now, chrono::Duration::days(9));

    let racing: Arc<dyn LeadStore> = Arc::new(RacingStore {
        inner: inner.clone(),
        sabotage: Mutex::new(Some(doomed.lead_id)),
    });
    let sweeper = RecyclingSweeper::new(racing, 10);

    let report = sweeper
        .sweep(now, Duration::from_secs(7 * 24 * 3600), None)
        .unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.reclaimed, 1);
    assert_eq!(report.conflicts, 1);

    // The concurrent close is authoritative; the sweep did not undo it
    let closed = inner.lead_get(doomed.lead_id).unwrap().unwrap();
    assert_eq!(closed.status, LeadStatus::ClosedWon);
    let pooled = inner.lead_get(plain.lead_id).unwrap().unwrap();
    assert_eq!(pooled.status, LeadStatus::New);
}

// ============================================================================
// QUOTA INVARIANT UNDER RANDOM OPERATION SEQUENCES
// ============================================================================

mod quota_property {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Assign { agent_idx: usize, count: usize },
        Replenish { agent_idx: usize },
        Protect { pick: usize },
        Close { pick: usize },
        Sweep,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3usize, 1..8usize).prop_map(|(agent_idx, count)| Op::Assign { agent_idx, count }),
            (0..3usize).prop_map(|agent_idx| Op::Replenish { agent_idx }),
            (0..64usize).prop_map(|pick| Op::Protect { pick }),
            (0..64usize).prop_map(|pick| Op::Close { pick }),
            Just(Op::Sweep),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// After any sequence of assigns, status moves, and sweeps, no agent
        /// holds more than their quota and no lead has a dangling assignment.
        #[test]
        fn prop_quota_never_exceeded(
            pool_size in 0..20usize,
            quotas in proptest::collection::vec(0..6i32, 3),
            ops in proptest::collection::vec(arb_op(), 1..40),
        ) {
            let store = Arc::new(InMemoryStore::new());
            let mut agent_ids = Vec::new();
            for quota in &quotas {
                let agent = agent_with_quota(*quota);
                store.agent_insert(&agent).unwrap();
                agent_ids.push(agent.agent_id);
            }
            for i in 0..pool_size {
                store.lead_insert(&Lead::new(i as f64)).unwrap();
            }
            let hopper = hopper_over(&store);

            for op in ops {
                match op {
                    Op::Assign { agent_idx, count } => {
                        hopper.assign(agent_ids[agent_idx], count).unwrap();
                    }
                    Op::Replenish { agent_idx } => {
                        hopper.replenish(agent_ids[agent_idx]).unwrap();
                    }
                    Op::Protect { pick } => {
                        let active = store.lead_query(&LeadFilter::active()).unwrap();
                        if let Some(lead) = active.get(pick % active.len().max(1)) {
                            store
                                .lead_conditional_update(
                                    lead.lead_id,
                                    lead.version,
                                    &LeadUpdate::status(LeadStatus::Protected),
                                )
                                .unwrap();
                        }
                    }
                    Op::Close { pick } => {
                        let active = store.lead_query(&LeadFilter::active()).unwrap();
                        if let Some(lead) = active.get(pick % active.len().max(1)) {
                            store
                                .lead_conditional_update(
                                    lead.lead_id,
                                    lead.version,
                                    &LeadUpdate::close(LeadStatus::ClosedWon),
                                )
                                .unwrap();
                        }
                    }
                    Op::Sweep => {
                        let later = Utc::now() + chrono::Duration::hours(2);
                        hopper.sweep(later, Duration::from_secs(3600), None).unwrap();
                    }
                }

                // Invariant 3: per-agent load never exceeds quota
                for (agent_id, quota) in agent_ids.iter().zip(&quotas) {
                    let held = store
                        .lead_query(&LeadFilter::owned_by(*agent_id))
                        .unwrap()
                        .into_iter()
                        .filter(|lead| lead.status.counts_against_quota())
                        .count();
                    prop_assert!(held as i32 <= *quota);
                }

                // Invariant 2: assignment fields consistent on every lead
                for lead in store.lead_query(&LeadFilter::default()).unwrap() {
                    prop_assert!(lead.validate().is_ok());
                }
            }
        }
    }
}
