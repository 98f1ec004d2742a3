use serde::Deserialize;

use super::types::{DateKey, SlotTime};

/// Start times offered per day.
///
/// Saturdays, Sundays and holidays use the longer weekend list; every other
/// day uses the weekday list. This is a pure lookup, the backend is never
/// asked which slots exist.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlotSchedule {
  #[serde(default = "default_weekday")]
  pub weekday: Vec<SlotTime>,
  #[serde(default = "default_weekend")]
  pub weekend: Vec<SlotTime>,
}

impl Default for SlotSchedule {
  fn default() -> Self {
    Self {
      weekday: default_weekday(),
      weekend: default_weekend(),
    }
  }
}

impl SlotSchedule {
  pub fn slots_for(&self, date: DateKey, is_holiday: bool) -> &[SlotTime] {
    if is_holiday || date.is_weekend() {
      &self.weekend
    } else {
      &self.weekday
    }
  }
}

fn times(list: &[(u32, u32)]) -> Vec<SlotTime> {
  list
    .iter()
    .filter_map(|&(h, m)| SlotTime::from_hm(h, m))
    .collect()
}

fn default_weekday() -> Vec<SlotTime> {
  times(&[(16, 20), (18, 20)])
}

fn default_weekend() -> Vec<SlotTime> {
  times(&[(10, 30), (12, 20), (14, 20), (16, 20), (18, 20)])
}
