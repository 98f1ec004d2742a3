//! In-memory availability backend for tests.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::service::AvailabilityService;
use crate::booking::types::{DateKey, HolidayRecord, SlotCheck, SlotTime};

/// One recorded `check_slot` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckCall {
  pub date: DateKey,
  pub time: SlotTime,
  pub party_size: u32,
}

/// Fake backend with call recording plus latency and failure injection.
///
/// Every slot is available with capacity 5 unless configured otherwise.
#[derive(Default)]
pub struct FakeService {
  checks: Mutex<Vec<CheckCall>>,
  holiday_calls: Mutex<Vec<(i32, i32)>>,
  holidays: Mutex<BTreeMap<DateKey, HolidayRecord>>,
  unavailable: Mutex<HashSet<(DateKey, SlotTime)>>,
  failing_dates: Mutex<HashSet<DateKey>>,
  delays: Mutex<HashMap<DateKey, Duration>>,
  check_delay: Mutex<Duration>,
  holiday_delay: Mutex<Duration>,
  holidays_fail: AtomicBool,
  checks_fail: AtomicBool,
  in_flight: AtomicUsize,
  max_in_flight: AtomicUsize,
}

impl FakeService {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_holiday(self, record: HolidayRecord) -> Self {
    self.holidays.lock().unwrap().insert(record.date, record);
    self
  }

  pub fn unavailable(self, date: DateKey, time: SlotTime) -> Self {
    self.unavailable.lock().unwrap().insert((date, time));
    self
  }

  pub fn failing(self, date: DateKey) -> Self {
    self.failing_dates.lock().unwrap().insert(date);
    self
  }

  /// Latency applied to every check for `date`
  pub fn delay_date(self, date: DateKey, delay: Duration) -> Self {
    self.delays.lock().unwrap().insert(date, delay);
    self
  }

  /// Latency applied to every check without a per-date delay
  pub fn with_check_delay(self, delay: Duration) -> Self {
    *self.check_delay.lock().unwrap() = delay;
    self
  }

  pub fn with_holiday_delay(self, delay: Duration) -> Self {
    *self.holiday_delay.lock().unwrap() = delay;
    self
  }

  pub fn holidays_unreachable(self) -> Self {
    self.holidays_fail.store(true, Ordering::SeqCst);
    self
  }

  pub fn set_holidays_unreachable(&self, fail: bool) {
    self.holidays_fail.store(fail, Ordering::SeqCst);
  }

  /// Make every later `check_slot` call fail
  pub fn set_checks_unreachable(&self, fail: bool) {
    self.checks_fail.store(fail, Ordering::SeqCst);
  }

  pub fn checks(&self) -> Vec<CheckCall> {
    self.checks.lock().unwrap().clone()
  }

  pub fn checked_dates(&self) -> Vec<DateKey> {
    let mut seen = HashSet::new();
    self
      .checks()
      .iter()
      .map(|c| c.date)
      .filter(|d| seen.insert(*d))
      .collect()
  }

  pub fn holiday_calls(&self) -> Vec<(i32, i32)> {
    self.holiday_calls.lock().unwrap().clone()
  }

  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl AvailabilityService for FakeService {
  async fn check_slot(&self, date: DateKey, time: SlotTime, party_size: u32) -> Result<SlotCheck> {
    self.checks.lock().unwrap().push(CheckCall {
      date,
      time,
      party_size,
    });

    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);

    let delay = self
      .delays
      .lock()
      .unwrap()
      .get(&date)
      .copied()
      .unwrap_or_else(|| *self.check_delay.lock().unwrap());
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
    self.in_flight.fetch_sub(1, Ordering::SeqCst);

    if self.checks_fail.load(Ordering::SeqCst) {
      return Err(eyre!("booking backend unreachable"));
    }
    if self.failing_dates.lock().unwrap().contains(&date) {
      return Err(eyre!("backend error for {}", date));
    }

    let open = !self.unavailable.lock().unwrap().contains(&(date, time));
    Ok(SlotCheck {
      available: open,
      remaining_capacity: Some(if open { 5 } else { 0 }),
      error_message: None,
    })
  }

  async fn query_holidays(
    &self,
    year_from: i32,
    year_to: i32,
  ) -> Result<BTreeMap<DateKey, HolidayRecord>> {
    self.holiday_calls.lock().unwrap().push((year_from, year_to));

    let delay = *self.holiday_delay.lock().unwrap();
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }

    if self.holidays_fail.load(Ordering::SeqCst) {
      return Err(eyre!("holiday calendar unreachable"));
    }

    Ok(
      self
        .holidays
        .lock()
        .unwrap()
        .iter()
        .filter(|(date, _)| (year_from..=year_to).contains(&date.year()))
        .map(|(date, record)| (*date, record.clone()))
        .collect(),
    )
  }
}
