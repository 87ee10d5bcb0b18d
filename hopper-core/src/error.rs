//! Error types for Hopper operations

use crate::{AgentRole, EntityId, EntityType};
use thiserror::Error;

/// Storage layer errors.
///
/// A lost conditional write is NOT an error - it surfaces as
/// `CasOutcome::Conflict` from the store and is handled by skipping.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: EntityId },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Update failed for {entity_type:?} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: EntityId,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Assignment errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("Agent not found: {agent_id}")]
    AgentNotFound { agent_id: EntityId },

    #[error("Account {agent_id} has role {role} and carries no quota")]
    NotAssignable { agent_id: EntityId, role: AgentRole },

    #[error("Invalid assignment request: {reason}")]
    InvalidRequest { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Hopper operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HopperError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Assignment error: {0}")]
    Assignment(#[from] AssignmentError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Hopper operations.
pub type HopperResult<T> = Result<T, HopperError>;

// =============================================================================
// TESTS
// =============================================================================
