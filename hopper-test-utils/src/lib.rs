//! Hopper Test Utilities
//!
//! Centralized test infrastructure for the workspace:
//! - Fixtures for leads, agents, and seeded stores
//! - Proptest generators for statuses, roles, and scores

// Re-export the in-memory store from its source crate
pub use hopper_storage::InMemoryStore;

// Re-export core types for convenience
pub use hopper_core::{
    new_entity_id, AgentAccount, AgentRole, EntityId, HopperResult, Lead, LeadFilter,
    LeadStatus, Timestamp,
};

use hopper_storage::{AgentDirectory, LeadStore, LeadUpdate};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// FIXTURES
// ============================================================================

/// A pooled lead with the given priority score.
pub fn lead_with_score(score: f64) -> Lead {
    Lead::new(score)
}

/// An agent-role account with the given quota.
pub fn agent_with_quota(quota: i32) -> AgentAccount {
    AgentAccount::new("fixture-agent", AgentRole::Agent, quota)
}

/// An account with a quota-less role.
pub fn account_with_role(role: AgentRole) -> AgentAccount {
    AgentAccount::new("fixture-account", role, 0)
}

/// Claim a pooled lead for `agent_id` at `assigned_at`, straight against
/// the store. Panics on conflict; fixtures own their leads.
pub fn claim_lead(
    store: &dyn LeadStore,
    lead: &Lead,
    agent_id: EntityId,
    assigned_at: Timestamp,
) -> Lead {
    store
        .lead_conditional_update(
            lead.lead_id,
            lead.version,
            &LeadUpdate::claim(agent_id, assigned_at),
        )
        .expect("fixture claim should not fail")
        .applied()
        .expect("fixture lead should be unclaimed")
}

/// A store seeded with `pool_size` pooled leads and one agent.
/// Returns the store, the agent id, and the inserted leads.
pub fn seeded_store(pool_size: usize, quota: i32) -> (Arc<InMemoryStore>, EntityId, Vec<Lead>) {
    let store = Arc::new(InMemoryStore::new());
    let agent = agent_with_quota(quota);
    store
        .agent_insert(&agent)
        .expect("fixture agent insert should not fail");

    let mut leads = Vec::with_capacity(pool_size);
    for i in 0..pool_size {
        let lead = Lead::new(i as f64);
        store
            .lead_insert(&lead)
            .expect("fixture lead insert should not fail");
        leads.push(lead);
    }
    (store, agent.agent_id, leads)
}

/// An assigned lead whose assignment is `age` older than `now`.
pub fn stale_lead(
    store: &dyn LeadStore,
    agent_id: EntityId,
    now: Timestamp,
    age: chrono::Duration,
) -> Lead {
    let lead = Lead::new(1.0);
    store
        .lead_insert(&lead)
        .expect("fixture lead insert should not fail");
    claim_lead(store, &lead, agent_id, now - age)
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

/// Strategy over all lead statuses.
pub fn arb_lead_status() -> impl Strategy<Value = LeadStatus> {
    proptest::sample::select(LeadStatus::all().to_vec())
}

/// Strategy over agent roles.
pub fn arb_agent_role() -> impl Strategy<Value = AgentRole> {
    prop_oneof![
        Just(AgentRole::Admin),
        Just(AgentRole::Manager),
        Just(AgentRole::Agent),
    ]
}

/// Strategy over finite priority scores.
pub fn arb_priority_score() -> impl Strategy<Value = f64> {
    -1000.0f64..1000.0
}

/// Strategy over pooled leads with arbitrary finite scores.
pub fn arb_pooled_lead() -> impl Strategy<Value = Lead> {
    arb_priority_score().prop_map(Lead::new)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_seeded_store_shape() {
        let (store, agent_id, leads) = seeded_store(5, 3);
        assert_eq!(store.lead_total().unwrap(), 5);
        assert_eq!(leads.len(), 5);
        let agent = store.agent_get(agent_id).unwrap().unwrap();
        assert_eq!(agent.quota, 3);
        assert!(agent.role.carries_quota());
    }

    #[test]
    fn test_stale_lead_fixture_is_stale() {
        let (store, agent_id, _) = seeded_store(0, 3);
        let now = Utc::now();
        let lead = stale_lead(store.as_ref(), agent_id, now, chrono::Duration::days(8));
        assert!(lead.is_stale(now, chrono::Duration::days(7)));
        assert_eq!(lead.status, LeadStatus::Assigned);
    }
}
