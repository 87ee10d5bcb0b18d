//! Recycling sweep.
//!
//! Scans active assignments past the recycle window and reclaims them into
//! the pool, one conditional write per lead. Protected and closed leads
//! are excluded by the scan filter and never written. A version mismatch
//! between scan and write means the lead was touched in the meantime; the
//! current state is more recent and authoritative, so the sweep skips it
//! silently.
//!
//! The sweep pages over the store in bounded batches and checks its
//! deadline between batches, so an interrupted sweep leaves committed
//! reclaims intact and the next tick resumes the remainder.

use hopper_core::{HopperResult, LeadFilter, Timestamp};
use hopper_storage::{CasOutcome, LeadStore, LeadUpdate};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one sweep invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SweepReport {
    /// Candidates examined
    pub scanned: u64,
    /// Leads returned to the pool
    pub reclaimed: u64,
    /// Conditional writes lost to concurrent updates
    pub conflicts: u64,
    /// Batches processed
    pub batches: u64,
    /// Whether the deadline stopped the sweep before the scan was exhausted
    pub interrupted: bool,
}

/// Reclaims stale assignments back into the pool.
#[derive(Clone)]
pub struct RecyclingSweeper {
    leads: Arc<dyn LeadStore>,
    batch_size: usize,
}

impl RecyclingSweeper {
    /// Create a sweeper over a lead store.
    pub fn new(leads: Arc<dyn LeadStore>, batch_size: usize) -> Self {
        Self { leads, batch_size }
    }

    /// Reclaim every active lead assigned more than `window` before `now`,
    /// stopping cleanly between batches once `deadline` passes.
    ///
    /// Safe to invoke repeatedly or concurrently: the version gate turns a
    /// double reclaim into a counted no-op. A store failure aborts the
    /// remainder; batches already committed stay reclaimed and the next
    /// scheduled sweep retries the rest.
    pub fn sweep(
        &self,
        now: Timestamp,
        window: Duration,
        deadline: Option<Timestamp>,
    ) -> HopperResult<SweepReport> {
        let window = chrono::Duration::from_std(window)
            .unwrap_or_else(|_| chrono::Duration::milliseconds(window.as_millis() as i64));
        let cutoff = now - window;

        let mut report = SweepReport::default();
        let mut cursor = None;
        loop {
            if let Some(deadline) = deadline {
                if Utc::now() >= deadline {
                    report.interrupted = true;
                    break;
                }
            }

            let batch = self
                .leads
                .lead_query(&LeadFilter::stale(cutoff).page(cursor, self.batch_size))?;
            let Some(last) = batch.last() else {
                break;
            };
            report.batches += 1;
            cursor = Some(last.lead_id);

            for lead in batch {
                report.scanned += 1;
                let outcome = self.leads.lead_conditional_update(
                    lead.lead_id,
                    lead.version,
                    &LeadUpdate::release(),
                )?;
                match outcome {
                    CasOutcome::Applied(_) => {
                        report.reclaimed += 1;
                        tracing::debug!(
                            lead_id = %lead.lead_id,
                            agent_id = ?lead.assigned_agent_id,
                            "reclaimed stale lead"
                        );
                    }
                    CasOutcome::Conflict => {
                        // Touched between scan and write; current state wins.
                        report.conflicts += 1;
                        tracing::debug!(lead_id = %lead.lead_id, "lead already updated, skipping");
                    }
                }
            }
        }

        Ok(report)
    }
}

// ============================================================================
// TESTS
// ============================================================================
