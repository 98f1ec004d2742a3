//! Batched availability queries with stale-write protection.

use color_eyre::{eyre::eyre, Result};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::holidays::HolidayYearCache;
use super::service::AvailabilityService;
use super::store::CacheStore;
use super::token::{CancellationToken, TokenScope};
use crate::booking::schedule::SlotSchedule;
use crate::booking::types::{DateAvailabilitySummary, DateKey, SlotAvailabilityResult};

/// Default number of dates probed at the same time
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 6;

/// Outcome of a coverage request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
  /// Results were merged into the cache; empty when nothing needed fetching
  Applied(Vec<DateAvailabilitySummary>),
  /// A later request took over before this one finished; nothing was applied
  Superseded,
}

impl Coverage {
  pub fn fetched(&self) -> usize {
    match self {
      Coverage::Applied(results) => results.len(),
      Coverage::Superseded => 0,
    }
  }
}

/// Probe settings shared by every batch of a coordinator
#[derive(Debug, Clone)]
pub struct BatchOptions {
  /// Party size every slot is probed for
  pub party_size: u32,
  /// Dates probed concurrently; slots of one date are probed one after another
  pub max_concurrent: usize,
  pub schedule: SlotSchedule,
}

impl Default for BatchOptions {
  fn default() -> Self {
    Self {
      party_size: 10,
      max_concurrent: DEFAULT_MAX_CONCURRENT_PROBES,
      schedule: SlotSchedule::default(),
    }
  }
}

/// Decides which dates to probe, paces the probes and merges the results.
///
/// Every call to [`ensure_coverage`](Self::ensure_coverage) supersedes the
/// previous one: only the most recent call may report progress or write to
/// the cache, no matter in which order the calls finish.
pub struct QueryBatchCoordinator {
  service: Arc<dyn AvailabilityService>,
  store: Arc<CacheStore>,
  holidays: Arc<HolidayYearCache>,
  options: BatchOptions,
  scope: TokenScope,
}

impl QueryBatchCoordinator {
  pub fn new(
    service: Arc<dyn AvailabilityService>,
    store: Arc<CacheStore>,
    holidays: Arc<HolidayYearCache>,
    options: BatchOptions,
  ) -> Self {
    Self {
      service,
      store,
      holidays,
      options: BatchOptions {
        max_concurrent: options.max_concurrent.max(1),
        ..options
      },
      scope: TokenScope::new(),
    }
  }

  pub fn store(&self) -> &Arc<CacheStore> {
    &self.store
  }

  pub fn holidays(&self) -> &Arc<HolidayYearCache> {
    &self.holidays
  }

  pub fn schedule(&self) -> &SlotSchedule {
    &self.options.schedule
  }

  pub fn party_size(&self) -> u32 {
    self.options.party_size
  }

  /// Make sure `dates` are cached, fetching missing ones (or all when `force`).
  ///
  /// `on_progress(done, total)` fires once per resolved date while this call
  /// is still the current one. Individual slot failures are stored as
  /// unknown. An error is returned when the batch could not start or when
  /// every probe failed; the cache is untouched in both cases.
  pub async fn ensure_coverage<P>(
    &self,
    dates: &[DateKey],
    force: bool,
    on_progress: P,
  ) -> Result<Coverage>
  where
    P: FnMut(usize, usize) + Send,
  {
    let token = self.scope.issue();
    self.run_batch(token, dates, force, on_progress).await
  }

  /// Forget everything cached and probe `dates` from scratch.
  pub async fn reload<P>(&self, dates: &[DateKey], on_progress: P) -> Result<Coverage>
  where
    P: FnMut(usize, usize) + Send,
  {
    // Batches still in flight must be stale before the cache empties
    let token = self.scope.issue();
    self.store.clear()?;
    self.run_batch(token, dates, true, on_progress).await
  }

  async fn run_batch<P>(
    &self,
    token: CancellationToken,
    dates: &[DateKey],
    force: bool,
    mut on_progress: P,
  ) -> Result<Coverage>
  where
    P: FnMut(usize, usize) + Send,
  {
    let fetch = if force {
      dedup(dates)
    } else {
      self.store.get_missing(dates)?
    };
    if fetch.is_empty() {
      debug!(requested = dates.len(), "all dates already cached");
      return Ok(Coverage::Applied(Vec::new()));
    }
    let total = fetch.len();

    let (Some(first_year), Some(last_year)) = (
      fetch.iter().map(DateKey::year).min(),
      fetch.iter().map(DateKey::year).max(),
    ) else {
      return Ok(Coverage::Applied(Vec::new()));
    };
    if let Err(e) = self.holidays.ensure_years(first_year, last_year).await {
      if !self.scope.is_current(token) {
        debug!(dates = total, error = %e, "superseded batch lost its holiday fetch");
        return Ok(Coverage::Superseded);
      }
      return Err(eyre!("Availability batch of {} dates could not start: {}", total, e));
    }

    if !self.scope.is_current(token) {
      debug!(dates = total, "batch superseded before probing");
      return Ok(Coverage::Superseded);
    }

    info!(dates = total, force, "probing availability");
    let mut probes = stream::iter(fetch.into_iter().enumerate())
      .map(|(index, date)| async move { (index, self.probe_date(date).await) })
      .buffer_unordered(self.options.max_concurrent);

    let mut resolved = Vec::with_capacity(total);
    let mut attempted = 0;
    let mut failed = 0;
    while let Some((index, probe)) = probes.next().await {
      if !self.scope.is_current(token) {
        debug!(dates = total, "batch superseded, dropping results");
        return Ok(Coverage::Superseded);
      }
      attempted += probe.attempted;
      failed += probe.failed;
      resolved.push((index, probe.summary));
      on_progress(resolved.len(), total);
    }

    if attempted > 0 && failed == attempted {
      return Err(eyre!(
        "Availability backend unreachable: all {} slot checks failed",
        attempted
      ));
    }

    resolved.sort_by_key(|(index, _)| *index);
    let results: Vec<DateAvailabilitySummary> =
      resolved.into_iter().map(|(_, summary)| summary).collect();
    if !self.store.merge_if(&results, || self.scope.is_current(token))? {
      debug!(dates = total, "batch superseded, dropping results");
      return Ok(Coverage::Superseded);
    }

    info!(dates = results.len(), "availability cached");
    Ok(Coverage::Applied(results))
  }

  async fn probe_date(&self, date: DateKey) -> DateProbe {
    let is_holiday = self.holidays.is_holiday(date).unwrap_or_else(|e| {
      warn!(%date, error = %e, "holiday lookup failed, assuming working day");
      false
    });

    let times = self.options.schedule.slots_for(date, is_holiday);
    let mut slots = Vec::with_capacity(times.len());
    let mut failed = 0;
    for &time in times {
      match self
        .service
        .check_slot(date, time, self.options.party_size)
        .await
      {
        Ok(check) => slots.push(SlotAvailabilityResult::from_check(time, &check)),
        Err(e) => {
          warn!(%date, %time, error = %e, "slot probe failed");
          failed += 1;
          slots.push(SlotAvailabilityResult::unknown(time));
        }
      }
    }

    DateProbe {
      attempted: times.len(),
      failed,
      summary: DateAvailabilitySummary::new(date, slots),
    }
  }
}

struct DateProbe {
  attempted: usize,
  failed: usize,
  summary: DateAvailabilitySummary,
}

/// First occurrence of every date, input order kept
fn dedup(dates: &[DateKey]) -> Vec<DateKey> {
  let mut seen = HashSet::new();
  dates.iter().copied().filter(|d| seen.insert(*d)).collect()
}
