//! Hopper Engine - Lead Assignment and Recycling
//!
//! The engine behind the Lead Hopper: holds a shared pool of sales leads,
//! hands them to agents under per-agent quotas, protects in-flight leads
//! from reclamation, and sweeps stale assignments back into the pool.
//!
//! The pool is never locked as a whole. Every mutation is a single-lead
//! version-gated conditional write, so assignment and recycling run in
//! parallel without coordination; a lost write means another process
//! already acted and the loser skips, never retries.
//!
//! Entry point is [`Hopper`]; the periodic sweep lives in [`recycle_task`].

pub mod assign;
pub mod capacity;
pub mod constants;
pub mod hopper;
pub mod job;
pub mod recycle;

pub use assign::AssignmentEngine;
pub use capacity::CapacityTracker;
pub use hopper::{Hopper, HopperStats};
pub use job::{recycle_task, RecycleConfig, RecycleMetrics, RecycleSnapshot};
pub use recycle::{RecyclingSweeper, SweepReport};
