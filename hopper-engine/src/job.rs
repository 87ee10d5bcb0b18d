//! Recycle Background Task
//!
//! Periodically sweeps stale assignments back into the pool. Assignments
//! go stale when:
//!
//! - An agent stops working leads without closing them
//! - An agent account is deactivated while still holding leads
//! - A burst of assignments outpaces what an agent can actually work
//!
//! The task runs until the shutdown signal is received, one bounded sweep
//! per tick. Each sweep is idempotent and version-gated, so overlapping
//! with a manual admin-triggered sweep is harmless.

use crate::constants::{
    DEFAULT_RECYCLE_WINDOW_SECS, DEFAULT_SWEEP_BATCH_SIZE, DEFAULT_SWEEP_INTERVAL_SECS,
};
use crate::hopper::Hopper;
use chrono::Utc;
use hopper_core::{ConfigError, HopperResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the recycle background task.
#[derive(Debug, Clone)]
pub struct RecycleConfig {
    /// How often the scheduled sweep runs (default: 5 minutes)
    pub check_interval: Duration,

    /// Age past which an unresolved assignment becomes reclaimable
    /// (default: 7 days)
    pub recycle_window: Duration,

    /// Maximum leads examined per sweep batch (default: 100)
    pub batch_size: usize,

    /// Whether to log each sweep that reclaimed leads (default: true)
    pub log_reclaims: bool,
}

impl Default for RecycleConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            recycle_window: Duration::from_secs(DEFAULT_RECYCLE_WINDOW_SECS),
            batch_size: DEFAULT_SWEEP_BATCH_SIZE,
            log_reclaims: true,
        }
    }
}

impl RecycleConfig {
    /// Create RecycleConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `HOPPER_SWEEP_INTERVAL_SECS`: How often to sweep (default: 300)
    /// - `HOPPER_RECYCLE_WINDOW_SECS`: Staleness threshold (default: 604800)
    /// - `HOPPER_SWEEP_BATCH_SIZE`: Max leads per batch (default: 100)
    /// - `HOPPER_SWEEP_LOG_RECLAIMS`: Whether to log reclaims (default: true)
    pub fn from_env() -> Self {
        let check_interval = Duration::from_secs(
            std::env::var("HOPPER_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        );

        let recycle_window = Duration::from_secs(
            std::env::var("HOPPER_RECYCLE_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RECYCLE_WINDOW_SECS),
        );

        let batch_size = std::env::var("HOPPER_SWEEP_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SWEEP_BATCH_SIZE);

        let log_reclaims = std::env::var("HOPPER_SWEEP_LOG_RECLAIMS")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            check_interval,
            recycle_window,
            batch_size,
            log_reclaims,
        }
    }

    /// Configuration for development/testing with short windows.
    pub fn development() -> Self {
        Self {
            check_interval: Duration::from_secs(10),
            recycle_window: Duration::from_secs(60),
            batch_size: 10,
            log_reclaims: true,
        }
    }

    /// Configuration for production with a longer window.
    pub fn production() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            recycle_window: Duration::from_secs(14 * 24 * 3600),
            batch_size: DEFAULT_SWEEP_BATCH_SIZE,
            log_reclaims: true,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> HopperResult<()> {
        if self.check_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "check_interval".to_string(),
                value: format!("{:?}", self.check_interval),
                reason: "check_interval must be positive".to_string(),
            }
            .into());
        }
        if self.recycle_window.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "recycle_window".to_string(),
                value: format!("{:?}", self.recycle_window),
                reason: "recycle_window must be positive".to_string(),
            }
            .into());
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_size".to_string(),
                value: self.batch_size.to_string(),
                reason: "batch_size must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Metrics for recycle sweep activity.
#[derive(Debug, Default)]
pub struct RecycleMetrics {
    /// Total sweep cycles completed
    pub sweep_cycles: AtomicU64,

    /// Total leads reclaimed into the pool since startup
    pub leads_reclaimed: AtomicU64,

    /// Total conditional writes lost to concurrent updates
    pub conflicts_skipped: AtomicU64,

    /// Total sweeps aborted by store errors
    pub sweep_errors: AtomicU64,
}

impl RecycleMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all metrics.
    pub fn snapshot(&self) -> RecycleSnapshot {
        RecycleSnapshot {
            sweep_cycles: self.sweep_cycles.load(Ordering::Relaxed),
            leads_reclaimed: self.leads_reclaimed.load(Ordering::Relaxed),
            conflicts_skipped: self.conflicts_skipped.load(Ordering::Relaxed),
            sweep_errors: self.sweep_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of recycle metrics at a point in time.
#[derive(Debug, Clone)]
pub struct RecycleSnapshot {
    pub sweep_cycles: u64,
    pub leads_reclaimed: u64,
    pub conflicts_skipped: u64,
    pub sweep_errors: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Background task that periodically reclaims stale assignments.
///
/// Runs one sweep per tick until the shutdown signal flips to `true`.
/// A failed sweep is scoped to its cycle: committed reclaims stay
/// committed, the error is counted, and the next tick retries the
/// remainder.
///
/// # Example
///
/// ```ignore
/// use tokio::sync::watch;
/// use std::sync::Arc;
///
/// let (shutdown_tx, shutdown_rx) = watch::channel(false);
/// let hopper = Arc::new(hopper);
/// let config = RecycleConfig::default();
///
/// let handle = tokio::spawn(async move {
///     recycle_task(hopper, config, shutdown_rx).await
/// });
///
/// // Later, trigger shutdown
/// let _ = shutdown_tx.send(true);
/// let metrics = handle.await.unwrap();
/// ```
pub async fn recycle_task(
    hopper: Arc<Hopper>,
    config: RecycleConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<RecycleMetrics> {
    let metrics = Arc::new(RecycleMetrics::new());

    let mut sweep_interval = interval(config.check_interval);
    sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        check_interval_secs = config.check_interval.as_secs(),
        recycle_window_secs = config.recycle_window.as_secs(),
        batch_size = config.batch_size,
        "Recycle task started"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("Recycle task shutting down");
                    break;
                }
            }

            _ = sweep_interval.tick() => {
                run_sweep_cycle(&hopper, &config, &metrics);
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        sweep_cycles = snapshot.sweep_cycles,
        leads_reclaimed = snapshot.leads_reclaimed,
        conflicts_skipped = snapshot.conflicts_skipped,
        sweep_errors = snapshot.sweep_errors,
        "Recycle task completed"
    );

    metrics
}

/// Perform one sweep cycle.
fn run_sweep_cycle(hopper: &Hopper, config: &RecycleConfig, metrics: &RecycleMetrics) {
    metrics.sweep_cycles.fetch_add(1, Ordering::Relaxed);

    match hopper.sweep(Utc::now(), config.recycle_window, None) {
        Ok(report) => {
            metrics
                .leads_reclaimed
                .fetch_add(report.reclaimed, Ordering::Relaxed);
            metrics
                .conflicts_skipped
                .fetch_add(report.conflicts, Ordering::Relaxed);
            if report.reclaimed > 0 && config.log_reclaims {
                tracing::info!(
                    reclaimed = report.reclaimed,
                    conflicts = report.conflicts,
                    batches = report.batches,
                    "Sweep cycle reclaimed stale leads"
                );
            } else {
                tracing::trace!("Sweep cycle completed with no stale leads");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Sweep cycle aborted");
            metrics.sweep_errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_core::HopperError;

    #[test]
    fn test_config_default() {
        let config = RecycleConfig::default();
        assert_eq!(
            config.check_interval,
            Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)
        );
        assert_eq!(
            config.recycle_window,
            Duration::from_secs(DEFAULT_RECYCLE_WINDOW_SECS)
        );
        assert_eq!(config.batch_size, DEFAULT_SWEEP_BATCH_SIZE);
        assert!(config.log_reclaims);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_development() {
        let config = RecycleConfig::development();
        assert_eq!(config.check_interval, Duration::from_secs(10));
        assert_eq!(config.recycle_window, Duration::from_secs(60));
        assert_eq!(config.batch_size, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_production() {
        let config = RecycleConfig::production();
        assert_eq!(config.recycle_window, Duration::from_secs(14 * 24 * 3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Without environment variables set, should use defaults
        let config = RecycleConfig::from_env();
        assert_eq!(
            config.check_interval,
            Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)
        );
        assert_eq!(config.batch_size, DEFAULT_SWEEP_BATCH_SIZE);
        assert!(config.log_reclaims);
    }

    #[test]
    fn test_config_validate_rejects_zero_batch() {
        let config = RecycleConfig {
            batch_size: 0,
            ..RecycleConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(HopperError::Config(ConfigError::InvalidValue { field, .. })) if field == "batch_size"
        ));
    }

    #[test]
    fn test_config_validate_rejects_zero_window() {
        let config = RecycleConfig {
            recycle_window: Duration::ZERO,
            ..RecycleConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(HopperError::Config(ConfigError::InvalidValue { field, .. })) if field == "recycle_window"
        ));
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = RecycleMetrics::new();
        metrics.sweep_cycles.store(10, Ordering::Relaxed);
        metrics.leads_reclaimed.store(25, Ordering::Relaxed);
        metrics.conflicts_skipped.store(2, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sweep_cycles, 10);
        assert_eq!(snapshot.leads_reclaimed, 25);
        assert_eq!(snapshot.conflicts_skipped, 2);
        assert_eq!(snapshot.sweep_errors, 0);
    }
}
