//! Core entity structures

use crate::{new_entity_id, AgentRole, EntityId, LeadStatus, Timestamp};
use crate::error::{HopperResult, StoreError};
use crate::EntityType;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Lead - a sales prospect moving through the hopper.
///
/// Every mutation of a persisted lead goes through a version-gated
/// conditional write; `version` is bumped by the store on each applied
/// write, never by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Lead {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub lead_id: EntityId,
    pub status: LeadStatus,
    /// Owning agent; non-null iff status requires an assignee
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub assigned_agent_id: Option<EntityId>,
    /// Set on assignment, cleared on reclaim
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub assigned_at: Option<Timestamp>,
    /// Assignment ordering key; immutable once set
    pub priority_score: f64,
    /// Optimistic-concurrency counter; monotonically increasing
    pub version: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub metadata: Option<serde_json::Value>,
}

impl Lead {
    /// Create a new lead in the pool.
    pub fn new(priority_score: f64) -> Self {
        let now = Utc::now();
        Self {
            lead_id: new_entity_id(),
            status: LeadStatus::New,
            assigned_agent_id: None,
            assigned_at: None,
            priority_score,
            version: 1,
            created_at: now,
            updated_at: now,
            metadata: None,
        }
    }

    /// Attach metadata (intake source, contact payload, etc).
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether this lead currently sits in the pool.
    pub fn is_in_pool(&self) -> bool {
        self.status == LeadStatus::New
    }

    /// Whether this lead is past the recycle window at `now`.
    /// Always false for statuses outside the active set.
    pub fn is_stale(&self, now: Timestamp, window: chrono::Duration) -> bool {
        if !self.status.is_active() {
            return false;
        }
        match self.assigned_at {
            Some(assigned_at) => now - assigned_at > window,
            None => false,
        }
    }

    /// Check the assignment-field invariant: `assigned_agent_id` and
    /// `assigned_at` are non-null iff the status requires an assignee.
    pub fn validate(&self) -> HopperResult<()> {
        let has_assignee = self.assigned_agent_id.is_some() && self.assigned_at.is_some();
        let clear = self.assigned_agent_id.is_none() && self.assigned_at.is_none();
        if self.status.requires_assignee() && !has_assignee {
            return Err(StoreError::UpdateFailed {
                entity_type: EntityType::Lead,
                id: self.lead_id,
                reason: format!("status {} requires an assignee", self.status),
            }
            .into());
        }
        if !self.status.requires_assignee() && !clear {
            return Err(StoreError::UpdateFailed {
                entity_type: EntityType::Lead,
                id: self.lead_id,
                reason: format!("status {} must not carry an assignee", self.status),
            }
            .into());
        }
        Ok(())
    }
}

/// An account in the CRM, as the Hopper sees it.
///
/// Only `role == Agent` accounts carry a meaningful quota; the Hopper
/// rejects assignment to any other role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentAccount {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: EntityId,
    pub name: String,
    pub role: AgentRole,
    /// Maximum simultaneously held leads (active set plus protected)
    pub quota: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub metadata: Option<serde_json::Value>,
}

impl AgentAccount {
    /// Create a new account.
    pub fn new(name: &str, role: AgentRole, quota: i32) -> Self {
        Self {
            agent_id: new_entity_id(),
            name: name.to_string(),
            role,
            quota,
            created_at: Utc::now(),
            metadata: None,
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
