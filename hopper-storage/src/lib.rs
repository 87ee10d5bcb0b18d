//! Hopper Storage - Storage Traits and In-Memory Implementation
//!
//! Defines the persistence abstraction the Hopper consumes. The engine never
//! holds authoritative lead or agent state in process memory across calls;
//! everything flows through these traits. The only mutation path for an
//! existing lead is `lead_conditional_update`, a version-gated
//! compare-and-swap, which is what lets assignment and recycling run
//! concurrently without a global lock.

pub mod in_memory;

pub use in_memory::InMemoryStore;

use hopper_core::{EntityId, HopperResult, Lead, LeadFilter, LeadStatus, Timestamp};
use hopper_core::AgentAccount;
use serde::{Deserialize, Serialize};

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for a conditional lead write.
///
/// `assignment` distinguishes "leave as is" (`None`) from "set" and "clear";
/// the two assignment fields always move together so invariant checks stay
/// local to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadUpdate {
    /// New status
    pub status: Option<LeadStatus>,
    /// New assignment state: `Some(Some(..))` sets, `Some(None)` clears
    pub assignment: Option<Option<AssignmentFields>>,
}

/// The paired assignment fields set on claim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssignmentFields {
    pub agent_id: EntityId,
    pub assigned_at: Timestamp,
}

impl LeadUpdate {
    /// Claim a pooled lead for an agent: `New -> Assigned`, assignment set.
    pub fn claim(agent_id: EntityId, at: Timestamp) -> Self {
        Self {
            status: Some(LeadStatus::Assigned),
            assignment: Some(Some(AssignmentFields {
                agent_id,
                assigned_at: at,
            })),
        }
    }

    /// Reclaim a stale lead back into the pool: `-> New`, assignment cleared.
    pub fn release() -> Self {
        Self {
            status: Some(LeadStatus::New),
            assignment: Some(None),
        }
    }

    /// Status-only transition (used by the external CRUD layer for
    /// contacted/qualified/protected moves).
    pub fn status(status: LeadStatus) -> Self {
        Self {
            status: Some(status),
            assignment: None,
        }
    }

    /// Close a lead: terminal status, assignment cleared. Closed leads
    /// carry no assignee and never re-enter the pool.
    pub fn close(status: LeadStatus) -> Self {
        debug_assert!(status.is_terminal());
        Self {
            status: Some(status),
            assignment: Some(None),
        }
    }
}

/// Outcome of a conditional write.
///
/// `Conflict` means the expected version did not match the stored record:
/// another process already acted on the lead. Per the concurrency contract
/// this is expected contention, not a fault - callers skip and move on,
/// never retry the same lead.
#[derive(Debug, Clone, PartialEq)]
pub enum CasOutcome {
    /// Write applied; carries the post-write lead (version bumped).
    Applied(Lead),
    /// Expected version mismatch; nothing was changed.
    Conflict,
}

impl CasOutcome {
    /// The updated lead, if the write was applied.
    pub fn applied(self) -> Option<Lead> {
        match self {
            CasOutcome::Applied(lead) => Some(lead),
            CasOutcome::Conflict => None,
        }
    }
}

// ============================================================================
// STORAGE TRAITS
// ============================================================================

/// Lead persistence consumed by the Hopper.
///
/// `lead_query` results are ordered by `lead_id` ascending (UUIDv7 is
/// timestamp-sortable, so this approximates creation order) to keep keyset
/// pagination stable across calls.
pub trait LeadStore: Send + Sync {
    /// Insert a new lead. Fails on duplicate ID.
    fn lead_insert(&self, lead: &Lead) -> HopperResult<()>;

    /// Get a lead by ID.
    fn lead_get(&self, id: EntityId) -> HopperResult<Option<Lead>>;

    /// Query leads matching a filter, ordered by `lead_id` ascending.
    fn lead_query(&self, filter: &LeadFilter) -> HopperResult<Vec<Lead>>;

    /// Count leads matching a filter (ignores pagination fields).
    fn lead_count(&self, filter: &LeadFilter) -> HopperResult<usize>;

    /// Conditionally update a lead.
    ///
    /// Applies `update` iff the stored version equals `expected_version`;
    /// on success bumps the version by one and refreshes `updated_at`.
    /// A version mismatch returns `CasOutcome::Conflict` and changes
    /// nothing.
    fn lead_conditional_update(
        &self,
        id: EntityId,
        expected_version: i64,
        update: &LeadUpdate,
    ) -> HopperResult<CasOutcome>;
}

/// Agent account lookup consumed by the Hopper.
pub trait AgentDirectory: Send + Sync {
    /// Insert a new account. Fails on duplicate ID.
    fn agent_insert(&self, agent: &AgentAccount) -> HopperResult<()>;

    /// Get an account by ID.
    fn agent_get(&self, id: EntityId) -> HopperResult<Option<AgentAccount>>;

    /// List all accounts.
    fn agent_list(&self) -> HopperResult<Vec<AgentAccount>>;
}
