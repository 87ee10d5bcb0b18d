//! Per-agent capacity accounting.
//!
//! Counts are always recomputed from the lead set. The store exposes
//! single-record conditional writes, not multi-key transactions, so a
//! maintained counter could drift from the leads it describes and a stale
//! counter would let an agent exceed quota. A recomputed count cannot
//! drift.

use hopper_core::{AgentAccount, EntityId, HopperResult, LeadFilter, LeadStatus};
use hopper_storage::LeadStore;
use std::sync::Arc;

/// Computes each agent's current lead load against their quota.
#[derive(Clone)]
pub struct CapacityTracker {
    leads: Arc<dyn LeadStore>,
}

impl CapacityTracker {
    /// Create a tracker over a lead store.
    pub fn new(leads: Arc<dyn LeadStore>) -> Self {
        Self { leads }
    }

    /// Leads held by the agent in the active set
    /// (`assigned`/`contacted`/`qualified`). This is the quantity the
    /// quota invariant bounds.
    pub fn active_count(&self, agent_id: EntityId) -> HopperResult<usize> {
        let filter = LeadFilter {
            status_in: Some(LeadStatus::active_set()),
            assigned_agent_id: Some(agent_id),
            ..LeadFilter::default()
        };
        self.leads.lead_count(&filter)
    }

    /// Leads consuming the agent's quota: the active set plus `protected`.
    /// Protected leads are recycle-exempt but still occupy a slot.
    pub fn quota_used(&self, agent_id: EntityId) -> HopperResult<usize> {
        let mut statuses = LeadStatus::active_set();
        statuses.push(LeadStatus::Protected);
        let filter = LeadFilter {
            status_in: Some(statuses),
            assigned_agent_id: Some(agent_id),
            ..LeadFilter::default()
        };
        self.leads.lead_count(&filter)
    }

    /// Remaining assignment headroom for an account, floored at zero.
    pub fn available(&self, agent: &AgentAccount) -> HopperResult<usize> {
        let used = self.quota_used(agent.agent_id)? as i64;
        Ok((agent.quota as i64 - used).max(0) as usize)
    }
}

// ============================================================================
// TESTS
// ============================================================================
