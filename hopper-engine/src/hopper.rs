//! The Hopper facade.
//!
//! The single surface the surrounding CRUD/API layer calls. Wires the
//! capacity tracker, assignment engine, and recycling sweeper over shared
//! store handles and exposes aggregate stats for dashboards.

use crate::assign::AssignmentEngine;
use crate::capacity::CapacityTracker;
use crate::constants::DEFAULT_SWEEP_BATCH_SIZE;
use crate::recycle::{RecyclingSweeper, SweepReport};
use hopper_core::{
    AssignmentError, EntityId, HopperResult, Lead, LeadFilter, LeadStatus, Timestamp,
};
use hopper_storage::{AgentDirectory, LeadStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Aggregate lead counts for operational visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HopperStats {
    /// All leads in the store
    pub total: u64,
    /// Pool-available (`new`)
    pub pool: u64,
    /// Actively assigned (`assigned`/`contacted`/`qualified`)
    pub assigned: u64,
    /// Recycle-exempt (`protected`)
    pub protected: u64,
    pub closed_won: u64,
    pub closed_lost: u64,
}

impl HopperStats {
    /// Total closed leads, won or lost.
    pub fn closed(&self) -> u64 {
        self.closed_won + self.closed_lost
    }
}

/// The lead hopper: shared pool, quota-bounded assignment, stale-lead
/// recycling.
#[derive(Clone)]
pub struct Hopper {
    leads: Arc<dyn LeadStore>,
    agents: Arc<dyn AgentDirectory>,
    capacity: CapacityTracker,
    engine: AssignmentEngine,
    sweeper: RecyclingSweeper,
}

impl Hopper {
    /// Create a hopper over shared stores with the default sweep batch size.
    pub fn new(leads: Arc<dyn LeadStore>, agents: Arc<dyn AgentDirectory>) -> Self {
        Self::with_sweep_batch_size(leads, agents, DEFAULT_SWEEP_BATCH_SIZE)
    }

    /// Create a hopper with an explicit sweep batch size.
    pub fn with_sweep_batch_size(
        leads: Arc<dyn LeadStore>,
        agents: Arc<dyn AgentDirectory>,
        batch_size: usize,
    ) -> Self {
        let capacity = CapacityTracker::new(leads.clone());
        let engine = AssignmentEngine::new(leads.clone(), agents.clone(), capacity.clone());
        let sweeper = RecyclingSweeper::new(leads.clone(), batch_size);
        Self {
            leads,
            agents,
            capacity,
            engine,
            sweeper,
        }
    }

    /// Assign up to `count` pooled leads to an agent. See
    /// [`AssignmentEngine::assign`].
    pub fn assign(&self, agent_id: EntityId, count: usize) -> HopperResult<Vec<Lead>> {
        self.engine.assign(agent_id, count)
    }

    /// Top an agent up to their quota. Used on onboarding and when an
    /// agent's pool runs dry. An agent already at capacity gets an empty
    /// result.
    pub fn replenish(&self, agent_id: EntityId) -> HopperResult<Vec<Lead>> {
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
        self.engine.assign(agent_id, available)
    }

    /// Run one recycling sweep. See [`RecyclingSweeper::sweep`].
    pub fn sweep(
        &self,
        now: Timestamp,
        window: Duration,
        deadline: Option<Timestamp>,
    ) -> HopperResult<SweepReport> {
        self.sweeper.sweep(now, window, deadline)
    }

    /// Aggregate counts across the lead set.
    pub fn stats(&self) -> HopperResult<HopperStats> {
        let count = |status: LeadStatus| -> HopperResult<u64> {
            Ok(self
                .leads
                .lead_count(&LeadFilter::default().with_status(status))? as u64)
        };
        let pool = count(LeadStatus::New)?;
        let assigned = self.leads.lead_count(&LeadFilter::active())? as u64;
        let protected = count(LeadStatus::Protected)?;
        let closed_won = count(LeadStatus::ClosedWon)?;
        let closed_lost = count(LeadStatus::ClosedLost)?;
        Ok(HopperStats {
            total: pool + assigned + protected + closed_won + closed_lost,
            pool,
            assigned,
            protected,
            closed_won,
            closed_lost,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
