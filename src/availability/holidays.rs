//! Holiday calendar cache keyed by year.

use color_eyre::{eyre::eyre, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};

use super::service::AvailabilityService;
use crate::booking::types::{DateKey, HolidayRecord};

#[derive(Debug, Default)]
struct HolidayState {
  /// Fetched years, including years without any holiday
  years: BTreeMap<i32, Vec<HolidayRecord>>,
  by_date: HashMap<DateKey, HolidayRecord>,
}

/// Caches the backend's holiday calendar one year at a time.
///
/// A year counts as present once it was fetched, whether or not it had any
/// holidays. Overlapping `ensure_years` calls share per-year locks so a year
/// is fetched at most once even when requested concurrently.
pub struct HolidayYearCache {
  service: Arc<dyn AvailabilityService>,
  state: Mutex<HolidayState>,
  inflight: AsyncMutex<HashMap<i32, Arc<AsyncMutex<()>>>>,
}

impl HolidayYearCache {
  pub fn new(service: Arc<dyn AvailabilityService>) -> Self {
    Self {
      service,
      state: Mutex::new(HolidayState::default()),
      inflight: AsyncMutex::new(HashMap::new()),
    }
  }

  fn lock(&self) -> Result<MutexGuard<'_, HolidayState>> {
    self.state.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  async fn acquire(&self, year: i32) -> OwnedMutexGuard<()> {
    let lock = {
      let mut inflight = self.inflight.lock().await;
      Arc::clone(
        inflight
          .entry(year)
          .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
      )
    };
    lock.lock_owned().await
  }

  fn unfetched(&self, years: impl IntoIterator<Item = i32>) -> Result<Vec<i32>> {
    let state = self.lock()?;
    Ok(
      years
        .into_iter()
        .filter(|y| !state.years.contains_key(y))
        .collect(),
    )
  }

  /// Make sure every year in `from_year..=to_year` has been fetched.
  pub async fn ensure_years(&self, from_year: i32, to_year: i32) -> Result<()> {
    let (from, to) = (from_year.min(to_year), from_year.max(to_year));

    let missing = self.unfetched(from..=to)?;
    if missing.is_empty() {
      debug!(from, to, "holiday years already cached");
      return Ok(());
    }

    // Ascending lock order keeps overlapping callers deadlock-free
    let mut guards = Vec::with_capacity(missing.len());
    for year in &missing {
      guards.push(self.acquire(*year).await);
    }

    let missing = self.unfetched(missing)?;
    let (Some(&lo), Some(&hi)) = (missing.first(), missing.last()) else {
      debug!(from, to, "holiday years fetched by a concurrent caller");
      return Ok(());
    };

    let records = self
      .service
      .query_holidays(lo, hi)
      .await
      .map_err(|e| eyre!("Failed to fetch holidays for {}-{}: {}", lo, hi, e))?;

    let mut guard = self.lock()?;
    let state = &mut *guard;
    for year in &missing {
      state.years.entry(*year).or_default();
    }
    let mut stored = 0usize;
    for (date, record) in records {
      let Some(bucket) = state
        .years
        .get_mut(&date.year())
        .filter(|_| missing.contains(&date.year()))
      else {
        continue;
      };
      bucket.push(record.clone());
      state.by_date.insert(date, record);
      stored += 1;
    }
    drop(guard);
    drop(guards);

    info!(from = lo, to = hi, holidays = stored, "holiday years cached");
    Ok(())
  }

  pub fn get(&self, date: DateKey) -> Result<Option<HolidayRecord>> {
    Ok(self.lock()?.by_date.get(&date).cloned())
  }

  pub fn is_holiday(&self, date: DateKey) -> Result<bool> {
    Ok(self.lock()?.by_date.contains_key(&date))
  }

  pub fn is_year_fetched(&self, year: i32) -> Result<bool> {
    Ok(self.lock()?.years.contains_key(&year))
  }

  /// Holidays of a fetched year, `None` if the year was never fetched
  pub fn year(&self, year: i32) -> Result<Option<Vec<HolidayRecord>>> {
    Ok(self.lock()?.years.get(&year).cloned())
  }

  /// Cached holidays within `from..=to`, ordered by date
  pub fn between(&self, from: DateKey, to: DateKey) -> Result<Vec<HolidayRecord>> {
    let state = self.lock()?;
    let mut records: Vec<HolidayRecord> = state
      .by_date
      .values()
      .filter(|r| r.date >= from && r.date <= to)
      .cloned()
      .collect();
    records.sort_by_key(|r| r.date);
    Ok(records)
  }
}
