//! Dashboard auto-refresh.
//!
//! A background task re-reads the whole store on a fixed period and publishes
//! a fresh [`DashboardSnapshot`] over a `watch` channel. Manual refresh goes
//! through the same [`load_snapshot`] path.

use std::time::Duration;

use bluecrab_core::{dashboard::DashboardSnapshot, store::RecordStore};
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

const MIN_PERIOD: Duration = Duration::from_millis(10);

/// Read every record and build the dashboard read model. A read failure
/// yields an empty snapshot that carries the error text.
pub async fn load_snapshot<S: RecordStore>(store: &S) -> DashboardSnapshot {
  match store.get_all().await {
    Ok(records) => DashboardSnapshot::from_records(&records),
    Err(e) => {
      tracing::warn!(error = %e, "dashboard refresh failed");
      DashboardSnapshot::unavailable(e.to_string())
    }
  }
}

/// Start the refresh task. The first snapshot is published immediately.
///
/// The task ends once every receiver has been dropped.
pub fn spawn<S>(store: S, period: Duration) -> (watch::Receiver<DashboardSnapshot>, JoinHandle<()>)
where
  S: RecordStore + Clone + 'static,
{
  let (tx, rx) = watch::channel(DashboardSnapshot::default());
  let period = period.max(MIN_PERIOD);

  let handle = tokio::spawn(async move {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
      tokio::select! {
        _ = ticker.tick() => {}
        () = tx.closed() => break,
      }
      let snapshot = load_snapshot(&store).await;
      tracing::trace!(total = snapshot.summary.total, "dashboard refreshed");
      if tx.send(snapshot).is_err() {
        break;
      }
    }
    tracing::debug!("dashboard refresh task stopped");
  });

  (rx, handle)
}

#[cfg(test)]
mod tests {
  use bluecrab_core::record::NewRecord;
  use bluecrab_store_sqlite::SqliteStore;
  use tokio::time::timeout;

  use super::*;

  #[tokio::test]
  async fn publishes_fresh_snapshots_until_dropped() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let (mut rx, handle) = spawn(store.clone(), Duration::from_millis(20));

    rx.changed().await.unwrap();
    assert!(!rx.borrow_and_update().has_data());

    store.insert(NewRecord::new(1, 10, 1.0, 1.0)).await.unwrap();
    timeout(Duration::from_secs(5), async {
      loop {
        rx.changed().await.unwrap();
        if rx.borrow_and_update().summary.total == 10 {
          break;
        }
      }
    })
    .await
    .unwrap();

    drop(rx);
    timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
  }

  #[tokio::test]
  async fn manual_load_matches_store() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    for id in 1..=3 {
      store.insert(NewRecord::new(id, id * 10, 0.0, 0.0)).await.unwrap();
    }
    let snap = load_snapshot(&store).await;
    assert_eq!(snap.summary.total, 60);
    assert_eq!(snap.top_locations[0].id, 3);
    assert!(snap.error.is_none());
  }
}
