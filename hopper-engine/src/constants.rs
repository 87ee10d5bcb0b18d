//! Default values for the recycle background task.

/// How often the scheduled sweep runs (seconds).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Age past which an unresolved assignment becomes reclaimable (seconds).
pub const DEFAULT_RECYCLE_WINDOW_SECS: u64 = 7 * 24 * 3600;

/// Maximum leads examined per sweep batch.
pub const DEFAULT_SWEEP_BATCH_SIZE: usize = 100;
