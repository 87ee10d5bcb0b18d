//! Background recycle task, end to end over the in-memory store.

use chrono::Utc;
use hopper_engine::{recycle_task, Hopper, RecycleConfig};
use hopper_storage::{AgentDirectory, LeadStore};
use hopper_test_utils::{seeded_store, stale_lead, InMemoryStore, LeadFilter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn hopper_over(store: &Arc<InMemoryStore>) -> Hopper {
    let leads: Arc<dyn LeadStore> = store.clone();
    let agents: Arc<dyn AgentDirectory> = store.clone();
    Hopper::new(leads, agents)
}

#[tokio::test]
async fn task_reclaims_stale_leads_and_shuts_down_cleanly() {
    let (store, agent_id, _) = seeded_store(0, 10);
    let now = Utc::now();
    for _ in 0..3 {
        stale_lead(store.as_ref(), agent_id, now, chrono::Duration::hours(2));
    }
    let hopper = Arc::new(hopper_over(&store));

    let config = RecycleConfig {
        check_interval: Duration::from_millis(20),
        recycle_window: Duration::from_secs(3600),
        batch_size: 10,
        log_reclaims: false,
    };
    config.validate().unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(recycle_task(hopper, config, shutdown_rx));

    // Give the task a few ticks
    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown_tx.send(true).unwrap();
    let metrics = handle.await.unwrap();

    let snapshot = metrics.snapshot();
    assert!(snapshot.sweep_cycles >= 1);
    assert_eq!(snapshot.leads_reclaimed, 3);
    assert_eq!(snapshot.sweep_errors, 0);
    assert_eq!(store.lead_count(&LeadFilter::pool()).unwrap(), 3);
}

#[tokio::test]
async fn task_with_nothing_stale_reclaims_nothing() {
    let (store, agent_id, leads) = seeded_store(2, 10);
    // Fresh assignment, well inside the window
    hopper_test_utils::claim_lead(store.as_ref(), &leads[0], agent_id, Utc::now());
    let hopper = Arc::new(hopper_over(&store));

    let config = RecycleConfig {
        check_interval: Duration::from_millis(20),
        recycle_window: Duration::from_secs(3600),
        batch_size: 10,
        log_reclaims: false,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(recycle_task(hopper, config, shutdown_rx));
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(true).unwrap();
    let metrics = handle.await.unwrap();

    assert_eq!(metrics.snapshot().leads_reclaimed, 0);
    // One lead still assigned, one still pooled
    assert_eq!(store.lead_count(&LeadFilter::pool()).unwrap(), 1);
    assert_eq!(store.lead_count(&LeadFilter::active()).unwrap(), 1);
}
