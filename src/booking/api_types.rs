//! Serde-deserializable types matching booking backend responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;

use super::types::{DateKey, HolidayKind, HolidayRecord, SlotCheck};

// ============================================================================
// Slot check endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiSlotCheckResponse {
  pub available: bool,
  #[serde(default)]
  pub remaining_capacity: Option<u32>,
  #[serde(default)]
  pub error_message: Option<String>,
}

impl From<ApiSlotCheckResponse> for SlotCheck {
  fn from(api: ApiSlotCheckResponse) -> Self {
    SlotCheck {
      available: api.available,
      remaining_capacity: api.remaining_capacity,
      // Backends send "" when there is nothing to report
      error_message: api.error_message.filter(|m| !m.trim().is_empty()),
    }
  }
}

// ============================================================================
// Holidays endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiHoliday {
  pub date: DateKey,
  pub name: String,
  #[serde(default = "default_kind")]
  pub kind: HolidayKind,
}

fn default_kind() -> HolidayKind {
  HolidayKind::Fixed
}

impl From<ApiHoliday> for HolidayRecord {
  fn from(api: ApiHoliday) -> Self {
    HolidayRecord {
      date: api.date,
      name: api.name,
      kind: api.kind,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_slot_check_blank_error_message_is_dropped() {
    let api: ApiSlotCheckResponse =
      serde_json::from_str(r#"{"available": false, "remaining_capacity": 0, "error_message": " "}"#)
        .unwrap();
    let check = SlotCheck::from(api);
    assert!(!check.available);
    assert_eq!(check.remaining_capacity, Some(0));
    assert_eq!(check.error_message, None);
  }

  #[test]
  fn test_holiday_kind_defaults_to_fixed() {
    let api: Vec<ApiHoliday> = serde_json::from_str(
      r#"[{"date": "2026-01-01", "name": "New Year"},
          {"date": "2026-04-06", "name": "Easter Monday", "kind": "movable"}]"#,
    )
    .unwrap();
    let records: Vec<HolidayRecord> = api.into_iter().map(HolidayRecord::from).collect();
    assert_eq!(records[0].kind, HolidayKind::Fixed);
    assert_eq!(records[1].kind, HolidayKind::Movable);
    assert_eq!(records[1].date.to_string(), "2026-04-06");
  }
}
