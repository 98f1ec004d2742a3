//! In-memory availability cache keyed by day.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::booking::types::{DateAvailabilitySummary, DateKey};

#[derive(Debug, Default)]
struct CacheState {
  dates: HashMap<DateKey, DateAvailabilitySummary>,
  last_updated: Option<DateTime<Utc>>,
}

/// Day-level availability cache.
///
/// Entries are created on first successful fetch and overwritten by later
/// merges; nothing expires on its own. The store lives as long as its owner
/// and is shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct CacheStore {
  state: Mutex<CacheState>,
}

impl CacheStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<MutexGuard<'_, CacheState>> {
    self.state.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  pub fn get(&self, date: DateKey) -> Result<Option<DateAvailabilitySummary>> {
    Ok(self.lock()?.dates.get(&date).cloned())
  }

  /// Dates from `dates` that have no entry yet.
  ///
  /// Input order is kept and repeated dates are reported once.
  pub fn get_missing(&self, dates: &[DateKey]) -> Result<Vec<DateKey>> {
    let state = self.lock()?;
    let mut seen = HashSet::new();
    Ok(
      dates
        .iter()
        .copied()
        .filter(|d| !state.dates.contains_key(d) && seen.insert(*d))
        .collect(),
    )
  }

  /// Upsert every summary by date and stamp the update time.
  pub fn merge(&self, results: &[DateAvailabilitySummary]) -> Result<()> {
    self.merge_if(results, || true).map(|_| ())
  }

  /// Like [`merge`](Self::merge), but only when `still_current` holds while
  /// the store is locked. Returns whether anything was written.
  pub fn merge_if<F>(&self, results: &[DateAvailabilitySummary], still_current: F) -> Result<bool>
  where
    F: FnOnce() -> bool,
  {
    let mut state = self.lock()?;
    if !still_current() {
      return Ok(false);
    }
    for summary in results {
      state.dates.insert(summary.date(), summary.clone());
    }
    state.last_updated = Some(Utc::now());
    Ok(true)
  }

  /// Drop every entry and forget the last update time.
  pub fn clear(&self) -> Result<()> {
    let mut state = self.lock()?;
    state.dates.clear();
    state.last_updated = None;
    Ok(())
  }

  pub fn last_updated(&self) -> Result<Option<DateTime<Utc>>> {
    Ok(self.lock()?.last_updated)
  }

  pub fn len(&self) -> Result<usize> {
    Ok(self.lock()?.dates.len())
  }

  /// Cached summaries for `dates`, `None` where a date is missing
  pub fn get_many(&self, dates: &[DateKey]) -> Result<Vec<Option<DateAvailabilitySummary>>> {
    let state = self.lock()?;
    Ok(dates.iter().map(|d| state.dates.get(d).cloned()).collect())
  }
}
