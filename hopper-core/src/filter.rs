//! Typed lead query filter
//!
//! The store's query surface is fixed, so the filter is a closed field
//! struct rather than a generic expression tree. All fields combine with
//! AND semantics; `None` means "no constraint".

use crate::{EntityId, LeadStatus, Timestamp};
use serde::{Deserialize, Serialize};

/// Filter for `LeadStore::lead_query` / `lead_count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LeadFilter {
    /// Exact status match
    pub status: Option<LeadStatus>,
    /// Status membership (used for the recyclable set)
    pub status_in: Option<Vec<LeadStatus>>,
    /// Owning agent
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_agent_id: Option<EntityId>,
    /// Strictly older than this assignment timestamp
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub assigned_before: Option<Timestamp>,
    /// Exclusive keyset cursor over `lead_id`
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub after_id: Option<EntityId>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl LeadFilter {
    /// Leads available for assignment.
    pub fn pool() -> Self {
        Self {
            status: Some(LeadStatus::New),
            ..Self::default()
        }
    }

    /// Leads in the active (recyclable) set.
    pub fn active() -> Self {
        Self {
            status_in: Some(LeadStatus::active_set()),
            ..Self::default()
        }
    }

    /// Active leads assigned strictly before `cutoff` - the sweep candidates.
    pub fn stale(cutoff: Timestamp) -> Self {
        Self {
            status_in: Some(LeadStatus::active_set()),
            assigned_before: Some(cutoff),
            ..Self::default()
        }
    }

    /// Leads held by a specific agent.
    pub fn owned_by(agent_id: EntityId) -> Self {
        Self {
            assigned_agent_id: Some(agent_id),
            ..Self::default()
        }
    }

    /// Restrict by exact status.
    pub fn with_status(mut self, status: LeadStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Apply a keyset page: results after `after` (exclusive), at most `limit`.
    pub fn page(mut self, after: Option<EntityId>, limit: usize) -> Self {
        self.after_id = after;
        self.limit = Some(limit);
        self
    }

    /// Whether a lead matches this filter.
    pub fn matches(&self, lead: &crate::Lead) -> bool {
        if let Some(status) = self.status {
            if lead.status != status {
                return false;
            }
        }
        if let Some(ref statuses) = self.status_in {
            if !statuses.contains(&lead.status) {
                return false;
            }
        }
        if let Some(agent_id) = self.assigned_agent_id {
            if lead.assigned_agent_id != Some(agent_id) {
                return false;
            }
        }
        if let Some(cutoff) = self.assigned_before {
            match lead.assigned_at {
                Some(assigned_at) if assigned_at < cutoff => {}
                _ => return false,
            }
        }
        if let Some(after_id) = self.after_id {
            if lead.lead_id <= after_id {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// TESTS
// ============================================================================
