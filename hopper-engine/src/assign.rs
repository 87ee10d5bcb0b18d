//! Lead assignment.
//!
//! Claims pooled leads for an agent under their quota, in deterministic
//! priority order, one conditional write per lead. Losing a write race
//! means another caller owns the lead; the engine skips it and moves to the
//! next candidate. It never retries a lost lead.

use crate::capacity::CapacityTracker;
use hopper_core::{
    AssignmentError, EntityId, HopperResult, Lead, LeadFilter,
};
use hopper_storage::{AgentDirectory, CasOutcome, LeadStore, LeadUpdate};
use chrono::Utc;
use std::cmp::Ordering;
use std::sync::Arc;

/// Selects unassigned leads and atomically transitions them to an agent.
#[derive(Clone)]
pub struct AssignmentEngine {
    leads: Arc<dyn LeadStore>,
    agents: Arc<dyn AgentDirectory>,
    capacity: CapacityTracker,
}

/// Candidate ordering: `priority_score` descending, then earliest creation,
/// then `lead_id` so the order is total and repeated calls under contention
/// converge.
pub(crate) fn candidate_order(a: &Lead, b: &Lead) -> Ordering {
    b.priority_score
        .total_cmp(&a.priority_score)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.lead_id.cmp(&b.lead_id))
}

impl AssignmentEngine {
    /// Create an engine over shared stores.
    pub fn new(
        leads: Arc<dyn LeadStore>,
        agents: Arc<dyn AgentDirectory>,
        capacity: CapacityTracker,
    ) -> Self {
        Self {
            leads,
            agents,
            capacity,
        }
    }

    /// Assign up to `requested` pooled leads to `agent_id`.
    ///
    /// Returns the leads actually claimed, which may be fewer than
    /// `requested` when the pool is short, the agent is near quota, or
    /// concurrent callers win some of the conditional writes. An agent
    /// already at capacity gets an empty result, not an error; the caller
    /// decides whether a short result warrants a low-inventory signal.
    pub fn assign(&self, agent_id: EntityId, requested: usize) -> HopperResult<Vec<Lead>> {
        if requested == 0 {
            return Err(AssignmentError::InvalidRequest {
                reason: "requested count must be at least 1".to_string(),
            }
            .into());
        }

        let agent = self
            .agents
            .agent_get(agent_id)?
            .ok_or(AssignmentError::AgentNotFound { agent_id })?;
        if !agent.role.carries_quota() {
            return Err(AssignmentError::NotAssignable {
                agent_id,
                role: agent.role,
            }
            .into());
        }

        let available = self.capacity.available(&agent)?;
        if available == 0 {
            return Ok(Vec::new());
        }
        let target = requested.min(available);

        let mut pool = self.leads.lead_query(&LeadFilter::pool())?;
        pool.sort_by(candidate_order);

        let now = Utc::now();
        let mut claimed = Vec::with_capacity(target);
        for lead in pool {
            if claimed.len() == target {
                break;
            }
            let outcome = self.leads.lead_conditional_update(
                lead.lead_id,
                lead.version,
                &LeadUpdate::claim(agent_id, now),
            )?;
            match outcome {
                CasOutcome::Applied(updated) => claimed.push(updated),
                CasOutcome::Conflict => {
                    // Lost the race; the lead already has an owner.
                    tracing::debug!(lead_id = %lead.lead_id, "lead claimed concurrently, skipping");
                }
            }
        }

        if claimed.len() < requested {
            tracing::debug!(
                agent_id = %agent_id,
                requested,
                claimed = claimed.len(),
                "assignment partially fulfilled"
            );
        }
        Ok(claimed)
    }
}

// ============================================================================
// TESTS
// ============================================================================
