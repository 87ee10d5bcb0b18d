//! Enum types for Hopper entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ENTITY TYPE
// ============================================================================

/// Entity type discriminator for error reporting and polymorphic references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Lead,
    Agent,
}

// ============================================================================
// LEAD STATUS
// ============================================================================

/// Lifecycle status of a lead.
///
/// ```text
/// New -> Assigned -> {Contacted -> Qualified} -> Protected -> {ClosedWon | ClosedLost}
/// Assigned/Contacted/Qualified --(sweep, stale)--> New
/// ```
///
/// `New` is the pool; `ClosedWon`/`ClosedLost` are terminal; everything else
/// is transient and re-enterable via recycling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum LeadStatus {
    /// In the pool, available for assignment
    #[default]
    New,
    /// Claimed by an agent, not yet worked
    Assigned,
    /// Agent has made first contact
    Contacted,
    /// Agent has qualified the lead
    Qualified,
    /// Appointment scheduled; exempt from recycling regardless of age
    Protected,
    /// Deal won (terminal)
    ClosedWon,
    /// Deal lost (terminal)
    ClosedLost,
}

impl LeadStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Assigned => "assigned",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Protected => "protected",
            LeadStatus::ClosedWon => "closed_won",
            LeadStatus::ClosedLost => "closed_lost",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, LeadStatusParseError> {
        match s.to_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "assigned" => Ok(LeadStatus::Assigned),
            "contacted" => Ok(LeadStatus::Contacted),
            "qualified" => Ok(LeadStatus::Qualified),
            "protected" => Ok(LeadStatus::Protected),
            "closed_won" => Ok(LeadStatus::ClosedWon),
            "closed_lost" => Ok(LeadStatus::ClosedLost),
            _ => Err(LeadStatusParseError(s.to_string())),
        }
    }

    /// The active set: held by an agent and still subject to recycling.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            LeadStatus::Assigned | LeadStatus::Contacted | LeadStatus::Qualified
        )
    }

    /// Terminal statuses never leave their state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::ClosedWon | LeadStatus::ClosedLost)
    }

    /// Whether a lead in this status consumes a slot of its agent's quota.
    /// Protected leads are recycle-exempt but still count against quota.
    pub fn counts_against_quota(&self) -> bool {
        self.is_active() || matches!(self, LeadStatus::Protected)
    }

    /// Whether a lead in this status must carry `assigned_agent_id` and
    /// `assigned_at` (the assigned superset).
    pub fn requires_assignee(&self) -> bool {
        self.counts_against_quota()
    }

    /// All statuses, in lifecycle order.
    pub fn all() -> [LeadStatus; 7] {
        [
            LeadStatus::New,
            LeadStatus::Assigned,
            LeadStatus::Contacted,
            LeadStatus::Qualified,
            LeadStatus::Protected,
            LeadStatus::ClosedWon,
            LeadStatus::ClosedLost,
        ]
    }

    /// The recyclable set as a Vec, for store filters.
    pub fn active_set() -> Vec<LeadStatus> {
        vec![
            LeadStatus::Assigned,
            LeadStatus::Contacted,
            LeadStatus::Qualified,
        ]
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for LeadStatus {
    type Err = LeadStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid lead status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadStatusParseError(pub String);

impl fmt::Display for LeadStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid lead status: {}", self.0)
    }
}

impl std::error::Error for LeadStatusParseError {}

// ============================================================================
// AGENT ROLE
// ============================================================================

/// Role of an account in the CRM.
///
/// The Hopper only consults role to decide whether an account is assignable
/// capacity; hierarchy and permission semantics live in the surrounding
/// CRUD layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AgentRole {
    /// Administrative account; holds no lead quota
    Admin,
    /// Team manager; holds no lead quota
    Manager,
    /// Sales agent; carries a quota and receives assignments
    Agent,
}

impl AgentRole {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AgentRole::Admin => "admin",
            AgentRole::Manager => "manager",
            AgentRole::Agent => "agent",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, AgentRoleParseError> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(AgentRole::Admin),
            "manager" => Ok(AgentRole::Manager),
            "agent" => Ok(AgentRole::Agent),
            _ => Err(AgentRoleParseError(s.to_string())),
        }
    }

    /// Only `Agent` accounts carry a quota and can receive assignments.
    pub fn carries_quota(&self) -> bool {
        matches!(self, AgentRole::Agent)
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for AgentRole {
    type Err = AgentRoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid agent role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRoleParseError(pub String);

impl fmt::Display for AgentRoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid agent role: {}", self.0)
    }
}

impl std::error::Error for AgentRoleParseError {}

// ============================================================================
// TESTS
// ============================================================================
