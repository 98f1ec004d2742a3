//! Contract with the external booking backend.

use async_trait::async_trait;
use color_eyre::Result;
use std::collections::BTreeMap;

use crate::booking::types::{DateKey, HolidayRecord, SlotCheck, SlotTime};

/// Everything the availability core needs from the booking backend.
///
/// Latency and failure modes are opaque: any call may be slow or fail, and
/// callers decide how a failure is recorded.
#[async_trait]
pub trait AvailabilityService: Send + Sync {
  /// Is the slot (date, time) open for `party_size` people?
  async fn check_slot(&self, date: DateKey, time: SlotTime, party_size: u32) -> Result<SlotCheck>;

  /// Holidays between `year_from` and `year_to`, both inclusive
  async fn query_holidays(
    &self,
    year_from: i32,
    year_to: i32,
  ) -> Result<BTreeMap<DateKey, HolidayRecord>>;
}
