//! In-memory store with genuine compare-and-swap semantics.
//!
//! The reference `LeadStore`/`AgentDirectory` implementation, shared by the
//! test suites and usable as a single-process store. Unlike a plain mock it
//! enforces the version gate exactly the way a conditional-write database
//! would, so contention behavior in tests matches production.
//!
//! No multi-key transaction is exposed, which is why capacity is recomputed
//! by query in the engine rather than kept as a counter here.

use crate::{AgentDirectory, CasOutcome, LeadStore, LeadUpdate};
use hopper_core::{
    AgentAccount, EntityId, EntityType, HopperResult, Lead, LeadFilter, StoreError,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory implementation of both storage traits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    leads: Arc<RwLock<HashMap<EntityId, Lead>>>,
    agents: Arc<RwLock<HashMap<EntityId, AgentAccount>>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) -> HopperResult<()> {
        self.leads
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .clear();
        self.agents
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .clear();
        Ok(())
    }

    /// Count of stored leads.
    pub fn lead_total(&self) -> HopperResult<usize> {
        Ok(self.leads.read().map_err(|_| StoreError::LockPoisoned)?.len())
    }

    /// Count of stored agents.
    pub fn agent_total(&self) -> HopperResult<usize> {
        Ok(self
            .agents
            .read()
            .map_err(|_| StoreError::LockPoisoned)?
            .len())
    }
}

impl LeadStore for InMemoryStore {
    fn lead_insert(&self, lead: &Lead) -> HopperResult<()> {
        let mut leads = self.leads.write().map_err(|_| StoreError::LockPoisoned)?;
        if leads.contains_key(&lead.lead_id) {
            return Err(StoreError::InsertFailed {
                entity_type: EntityType::Lead,
                reason: "already exists".to_string(),
            }
            .into());
        }
        leads.insert(lead.lead_id, lead.clone());
        Ok(())
    }

    fn lead_get(&self, id: EntityId) -> HopperResult<Option<Lead>> {
        let leads = self.leads.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(leads.get(&id).cloned())
    }

    fn lead_query(&self, filter: &LeadFilter) -> HopperResult<Vec<Lead>> {
        let leads = self.leads.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut matched: Vec<Lead> = leads
            .values()
            .filter(|lead| filter.matches(lead))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.lead_id.cmp(&b.lead_id));
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    fn lead_count(&self, filter: &LeadFilter) -> HopperResult<usize> {
        let unpaged = LeadFilter {
            after_id: None,
            limit: None,
            ..filter.clone()
        };
        let leads = self.leads.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(leads.values().filter(|lead| unpaged.matches(lead)).count())
    }

    fn lead_conditional_update(
        &self,
        id: EntityId,
        expected_version: i64,
        update: &LeadUpdate,
    ) -> HopperResult<CasOutcome> {
        let mut leads = self.leads.write().map_err(|_| StoreError::LockPoisoned)?;
        let lead = leads.get_mut(&id).ok_or(StoreError::NotFound {
            entity_type: EntityType::Lead,
            id,
        })?;

        if lead.version != expected_version {
            return Ok(CasOutcome::Conflict);
        }

        if let Some(status) = update.status {
            lead.status = status;
        }
        if let Some(assignment) = update.assignment {
            match assignment {
                Some(fields) => {
                    lead.assigned_agent_id = Some(fields.agent_id);
                    lead.assigned_at = Some(fields.assigned_at);
                }
                None => {
                    lead.assigned_agent_id = None;
                    lead.assigned_at = None;
                }
            }
        }
        lead.version += 1;
        lead.updated_at = Utc::now();

        Ok(CasOutcome::Applied(lead.clone()))
    }
}

impl AgentDirectory for InMemoryStore {
    fn agent_insert(&self, agent: &AgentAccount) -> HopperResult<()> {
        let mut agents = self.agents.write().map_err(|_| StoreError::LockPoisoned)?;
        if agents.contains_key(&agent.agent_id) {
            return Err(StoreError::InsertFailed {
                entity_type: EntityType::Agent,
                reason: "already exists".to_string(),
            }
            .into());
        }
        agents.insert(agent.agent_id, agent.clone());
        Ok(())
    }

    fn agent_get(&self, id: EntityId) -> HopperResult<Option<AgentAccount>> {
        let agents = self.agents.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(agents.get(&id).cloned())
    }

    fn agent_list(&self) -> HopperResult<Vec<AgentAccount>> {
        let agents = self.agents.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut all: Vec<AgentAccount> = agents.values().cloned().collect();
        all.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        Ok(all)
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
