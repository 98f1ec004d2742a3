use chrono::{Datelike, Days, Local, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar day used as the cache key for day-level data.
///
/// Always built from calendar fields (never from a UTC instant), so the same
/// day maps to the same key regardless of the local offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
  pub const FORMAT: &'static str = "%Y-%m-%d";

  pub fn new(date: NaiveDate) -> Self {
    Self(date)
  }

  /// Today's date according to the local calendar
  pub fn today() -> Self {
    Self(Local::now().date_naive())
  }

  pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
    NaiveDate::from_ymd_opt(year, month, day).map(Self)
  }

  pub fn date(&self) -> NaiveDate {
    self.0
  }

  pub fn year(&self) -> i32 {
    self.0.year()
  }

  pub fn weekday(&self) -> Weekday {
    self.0.weekday()
  }

  pub fn is_weekend(&self) -> bool {
    matches!(self.0.weekday(), Weekday::Sat | Weekday::Sun)
  }

  /// Shift by a number of days; saturates at the calendar bounds
  pub fn add_days(self, days: i64) -> Self {
    let shifted = if days >= 0 {
      self.0.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
      self.0.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    Self(shifted.unwrap_or(self.0))
  }

  /// Monday of the week containing this date
  pub fn week_start(self) -> Self {
    let offset = self.0.weekday().num_days_from_monday() as i64;
    self.add_days(-offset)
  }

  /// `days` consecutive dates starting at `self`
  pub fn range(self, days: usize) -> Vec<DateKey> {
    (0..days as i64).map(|i| self.add_days(i)).collect()
  }
}

impl fmt::Display for DateKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format(Self::FORMAT))
  }
}

impl FromStr for DateKey {
  type Err = chrono::ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    NaiveDate::parse_from_str(s.trim(), Self::FORMAT).map(Self)
  }
}

impl TryFrom<String> for DateKey {
  type Error = chrono::ParseError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<DateKey> for String {
  fn from(key: DateKey) -> Self {
    key.to_string()
  }
}

/// Start time of a bookable slot, written as `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(NaiveTime);

impl SlotTime {
  pub const FORMAT: &'static str = "%H:%M";

  pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
    NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
  }
}

impl fmt::Display for SlotTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format(Self::FORMAT))
  }
}

impl FromStr for SlotTime {
  type Err = chrono::ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    NaiveTime::parse_from_str(s.trim(), Self::FORMAT).map(Self)
  }
}

impl TryFrom<String> for SlotTime {
  type Error = chrono::ParseError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<SlotTime> for String {
  fn from(time: SlotTime) -> Self {
    time.to_string()
  }
}

/// Availability of a single slot. `Unknown` means the probe itself failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotAvailability {
  Available,
  Unavailable,
  Unknown,
}

/// Answer of the booking backend for one (date, time, party size) probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCheck {
  pub available: bool,
  pub remaining_capacity: Option<u32>,
  pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailabilityResult {
  pub time: SlotTime,
  pub available: SlotAvailability,
  pub remaining_capacity: Option<u32>,
}

impl SlotAvailabilityResult {
  pub fn from_check(time: SlotTime, check: &SlotCheck) -> Self {
    Self {
      time,
      available: if check.available {
        SlotAvailability::Available
      } else {
        SlotAvailability::Unavailable
      },
      remaining_capacity: check.remaining_capacity,
    }
  }

  pub fn unknown(time: SlotTime) -> Self {
    Self {
      time,
      available: SlotAvailability::Unknown,
      remaining_capacity: None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvailabilityCounts {
  pub available_count: usize,
  pub total_count: usize,
}

/// All probed slots of one day plus their counts.
///
/// Only constructible through [`DateAvailabilitySummary::new`], which derives
/// the counts from the slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAvailabilitySummary {
  date: DateKey,
  slots: Vec<SlotAvailabilityResult>,
  summary: AvailabilityCounts,
}

impl DateAvailabilitySummary {
  pub fn new(date: DateKey, slots: Vec<SlotAvailabilityResult>) -> Self {
    let summary = AvailabilityCounts {
      available_count: slots
        .iter()
        .filter(|s| s.available == SlotAvailability::Available)
        .count(),
      total_count: slots.len(),
    };
    Self {
      date,
      slots,
      summary,
    }
  }

  pub fn date(&self) -> DateKey {
    self.date
  }

  pub fn slots(&self) -> &[SlotAvailabilityResult] {
    &self.slots
  }

  pub fn summary(&self) -> AvailabilityCounts {
    self.summary
  }

  pub fn slot(&self, time: SlotTime) -> Option<&SlotAvailabilityResult> {
    self.slots.iter().find(|s| s.time == time)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolidayKind {
  Fixed,
  Movable,
  Bridge,
}

impl HolidayKind {
  pub fn label(&self) -> &'static str {
    match self {
      HolidayKind::Fixed => "fixed",
      HolidayKind::Movable => "movable",
      HolidayKind::Bridge => "bridge",
    }
  }
}

/// A non-working day as reported by the booking backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayRecord {
  pub date: DateKey,
  pub name: String,
  pub kind: HolidayKind,
}
