//! Hopper Core - Entity Types
//!
//! Pure data structures with no behavior beyond constructors, predicates,
//! and invariant checks. All other crates depend on this. The assignment
//! and recycling logic lives in `hopper-engine`; persistence lives behind
//! the traits in `hopper-storage`.

pub mod entities;
pub mod enums;
pub mod error;
pub mod filter;
pub mod identity;

pub use entities::{AgentAccount, Lead};
pub use enums::{
    AgentRole, AgentRoleParseError, EntityType, LeadStatus, LeadStatusParseError,
};
pub use error::{
    AssignmentError, ConfigError, HopperError, HopperResult, StoreError,
};
pub use filter::LeadFilter;
pub use identity::{new_entity_id, EntityId, Timestamp};
