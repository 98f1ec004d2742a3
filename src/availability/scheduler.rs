//! Periodic forced refresh of the visible date window.

use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::coordinator::{Coverage, QueryBatchCoordinator};
use crate::booking::types::DateKey;

/// Re-probes whatever is visible at each tick.
///
/// The visible range is read at tick time, never captured at start. Ticks do
/// not overlap: a slow refresh delays the next one and missed ticks are
/// skipped.
pub struct AutoRefreshScheduler {
  coordinator: Arc<QueryBatchCoordinator>,
  task: Option<JoinHandle<()>>,
}

impl AutoRefreshScheduler {
  pub fn new(coordinator: Arc<QueryBatchCoordinator>) -> Self {
    Self {
      coordinator,
      task: None,
    }
  }

  /// Start ticking every `interval`, replacing any previous schedule.
  pub fn start<V, P, C>(&mut self, visible_dates: V, interval: Duration, on_progress: P, on_complete: C)
  where
    V: Fn() -> Vec<DateKey> + Send + Sync + 'static,
    P: Fn(usize, usize) + Send + Sync + 'static,
    C: Fn(Result<Coverage>) + Send + Sync + 'static,
  {
    self.stop();
    if interval.is_zero() {
      warn!("auto refresh disabled: zero interval");
      return;
    }

    let coordinator = Arc::clone(&self.coordinator);
    self.task = Some(tokio::spawn(async move {
      let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

      loop {
        ticker.tick().await;
        let dates = visible_dates();
        if dates.is_empty() {
          continue;
        }

        debug!(dates = dates.len(), "auto refresh tick");
        let outcome = coordinator
          .ensure_coverage(&dates, true, |done, total| on_progress(done, total))
          .await;
        on_complete(outcome);
      }
    }));
  }

  pub fn stop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }

  pub fn is_running(&self) -> bool {
    self.task.as_ref().is_some_and(|t| !t.is_finished())
  }
}

impl Drop for AutoRefreshScheduler {
  fn drop(&mut self) {
    self.stop();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::availability::coordinator::BatchOptions;
  use crate::availability::fake::FakeService;
  use crate::availability::holidays::HolidayYearCache;
  use crate::availability::store::CacheStore;
  use std::sync::Mutex;

  fn date(s: &str) -> DateKey {
    s.parse().unwrap()
  }

  fn coordinator(service: Arc<FakeService>) -> Arc<QueryBatchCoordinator> {
    let holidays = Arc::new(HolidayYearCache::new(service.clone()));
    Arc::new(QueryBatchCoordinator::new(
      service,
      Arc::new(CacheStore::new()),
      holidays,
      BatchOptions::default(),
    ))
  }

  #[tokio::test(start_paused = true)]
  async fn test_each_tick_reads_current_visible_range() {
    let service = Arc::new(FakeService::new());
    let coordinator = coordinator(service.clone());
    let visible = Arc::new(Mutex::new(vec![date("2026-01-05")]));
    let outcomes = Arc::new(Mutex::new(Vec::new()));

    let mut scheduler = AutoRefreshScheduler::new(Arc::clone(&coordinator));
    let visible_for_tick = Arc::clone(&visible);
    let outcomes_sink = Arc::clone(&outcomes);
    scheduler.start(
      move || visible_for_tick.lock().unwrap().clone(),
      Duration::from_secs(1),
      |_, _| {},
      move |outcome| {
        outcomes_sink
          .lock()
          .unwrap()
          .push(outcome.map(|c| c.fetched()).unwrap_or(0))
      },
    );
    assert!(scheduler.is_running());

    // Nothing happens before the first interval elapses
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(service.checks().is_empty());

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(service.checked_dates(), vec![date("2026-01-05")]);

    *visible.lock().unwrap() = vec![date("2026-01-12"), date("2026-01-13")];
    tokio::time::sleep(Duration::from_secs(1)).await;

    let dates = service.checked_dates();
    assert_eq!(dates.len(), 3);
    assert!(dates.contains(&date("2026-01-12")));
    assert!(dates.contains(&date("2026-01-13")));
    assert_eq!(*outcomes.lock().unwrap(), vec![1, 2]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_ticks_force_refresh_of_cached_dates() {
    let service = Arc::new(FakeService::new());
    let coordinator = coordinator(service.clone());
    coordinator
      .ensure_coverage(&[date("2026-01-05")], false, |_, _| {})
      .await
      .unwrap();
    let initial = service.checks().len();

    let mut scheduler = AutoRefreshScheduler::new(Arc::clone(&coordinator));
    scheduler.start(
      || vec![date("2026-01-05")],
      Duration::from_secs(1),
      |_, _| {},
      |_| {},
    );
    tokio::time::sleep(Duration::from_millis(2500)).await;

    assert_eq!(service.checks().len(), initial * 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_stop_ends_ticking() {
    let service = Arc::new(FakeService::new());
    let mut scheduler = AutoRefreshScheduler::new(coordinator(service.clone()));
    scheduler.start(
      || vec![date("2026-01-05")],
      Duration::from_secs(1),
      |_, _| {},
      |_| {},
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let after_first_tick = service.checks().len();
    assert!(after_first_tick > 0);

    scheduler.stop();
    assert!(!scheduler.is_running());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(service.checks().len(), after_first_tick);
  }

  #[tokio::test(start_paused = true)]
  async fn test_zero_interval_does_not_start() {
    let service = Arc::new(FakeService::new());
    let mut scheduler = AutoRefreshScheduler::new(coordinator(service.clone()));
    scheduler.start(|| vec![date("2026-01-05")], Duration::ZERO, |_, _| {}, |_| {});
    assert!(!scheduler.is_running());
  }
}
