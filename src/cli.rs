//! One-shot subcommands: print to stdout, progress and logs to stderr.

use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::sync::Arc;

use crate::availability::{
  AvailabilityService, CacheStore, Coverage, DebouncedSlotChecker, HolidayYearCache,
  QueryBatchCoordinator, SlotCheckState, SlotQuery,
};
use crate::booking::types::{
  DateAvailabilitySummary, DateKey, HolidayRecord, SlotAvailability, SlotTime,
};
use crate::config::Config;

/// Check one slot through the same path the form uses, without the wait
pub async fn check(
  service: Arc<dyn AvailabilityService>,
  config: &Config,
  date: &str,
  time: &str,
) -> Result<()> {
  let date: DateKey = date
    .parse()
    .map_err(|e| eyre!("Invalid date '{}' (expected YYYY-MM-DD): {}", date, e))?;
  let time: SlotTime = time
    .parse()
    .map_err(|e| eyre!("Invalid time '{}' (expected HH:MM): {}", time, e))?;
  let party_size = config.availability.party_size;

  let checker = DebouncedSlotChecker::new(service, std::time::Duration::ZERO);
  let mut state = checker.subscribe();
  checker.check(SlotQuery::new(date, time, party_size));

  let verdict = state
    .wait_for(|s| !s.is_pending())
    .await
    .map_err(|e| eyre!("Slot check was dropped: {}", e))?
    .clone();

  println!("{}", format_verdict(date, time, party_size, &verdict));
  match verdict {
    SlotCheckState::Failed(error) => Err(eyre!(error)),
    _ => Ok(()),
  }
}

/// Probe `days` days from `from` and print one line per day
pub async fn scan(
  service: Arc<dyn AvailabilityService>,
  config: &Config,
  from: Option<&str>,
  days: usize,
) -> Result<()> {
  let start = match from {
    Some(s) => s
      .parse()
      .map_err(|e| eyre!("Invalid date '{}' (expected YYYY-MM-DD): {}", s, e))?,
    None => DateKey::today(),
  };
  let dates = start.range(days);

  let holidays = Arc::new(HolidayYearCache::new(Arc::clone(&service)));
  let coordinator = QueryBatchCoordinator::new(
    service,
    Arc::new(CacheStore::new()),
    Arc::clone(&holidays),
    config.batch_options(),
  );

  let coverage = coordinator
    .ensure_coverage(&dates, false, |done, total| {
      eprint!("\rchecking {}/{} days", done, total);
      let _ = std::io::stderr().flush();
    })
    .await?;
  eprintln!();

  let Coverage::Applied(results) = coverage else {
    return Err(eyre!("Scan was superseded"));
  };
  for summary in &results {
    let holiday = holidays.get(summary.date())?;
    println!("{}", format_day(summary, holiday.as_ref()));
  }
  Ok(())
}

/// List the holidays of every year in `from..=to`
pub async fn holidays(
  service: Arc<dyn AvailabilityService>,
  from: Option<i32>,
  to: Option<i32>,
) -> Result<()> {
  let from = from.unwrap_or_else(|| DateKey::today().year());
  let to = to.unwrap_or(from);
  if to < from {
    return Err(eyre!("--to {} is before --from {}", to, from));
  }

  let first = DateKey::from_ymd(from, 1, 1).ok_or_else(|| eyre!("Year {} out of range", from))?;
  let last = DateKey::from_ymd(to, 12, 31).ok_or_else(|| eyre!("Year {} out of range", to))?;

  let cache = HolidayYearCache::new(service);
  cache.ensure_years(from, to).await?;
  for record in cache.between(first, last)? {
    println!("{}", format_holiday(&record));
  }
  Ok(())
}

fn format_verdict(date: DateKey, time: SlotTime, party_size: u32, state: &SlotCheckState) -> String {
  let slot = format!("{} {} for {}", date, time, party_size);
  match state {
    SlotCheckState::Resolved {
      available,
      remaining_capacity,
      message,
    } => {
      let mut line = format!(
        "{}: {}",
        slot,
        if *available { "available" } else { "not available" }
      );
      if let Some(capacity) = remaining_capacity {
        line.push_str(&format!(" ({} places left)", capacity));
      }
      if let Some(message) = message {
        line.push_str(&format!(" - {}", message));
      }
      line
    }
    SlotCheckState::Failed(error) => format!("{}: check failed: {}", slot, error),
    SlotCheckState::Idle | SlotCheckState::Pending => format!("{}: no answer", slot),
  }
}

fn format_day(summary: &DateAvailabilitySummary, holiday: Option<&HolidayRecord>) -> String {
  let counts = summary.summary();
  let slots: Vec<String> = summary
    .slots()
    .iter()
    .map(|slot| {
      let mark = match slot.available {
        SlotAvailability::Available => "+",
        SlotAvailability::Unavailable => "-",
        SlotAvailability::Unknown => "?",
      };
      format!("{}{}", slot.time, mark)
    })
    .collect();

  let mut line = format!(
    "{} {}  {}/{}  {}",
    summary.date(),
    summary.date().weekday(),
    counts.available_count,
    counts.total_count,
    slots.join(" ")
  );
  if let Some(holiday) = holiday {
    line.push_str(&format!("  [{}]", holiday.name));
  }
  line
}

fn format_holiday(record: &HolidayRecord) -> String {
  format!(
    "{} {}  {:<8} {}",
    record.date,
    record.date.weekday(),
    record.kind.label(),
    record.name
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::availability::fake::FakeService;
  use crate::booking::types::{HolidayKind, SlotAvailabilityResult};

  fn date(s: &str) -> DateKey {
    s.parse().unwrap()
  }

  fn time(s: &str) -> SlotTime {
    s.parse().unwrap()
  }

  #[test]
  fn test_format_verdict() {
    let resolved = SlotCheckState::Resolved {
      available: false,
      remaining_capacity: Some(0),
      message: Some("fully booked".to_string()),
    };
    assert_eq!(
      format_verdict(date("2026-03-14"), time("14:20"), 10, &resolved),
      "2026-03-14 14:20 for 10: not available (0 places left) - fully booked"
    );

    let failed = SlotCheckState::Failed("timeout".to_string());
    assert_eq!(
      format_verdict(date("2026-03-14"), time("14:20"), 10, &failed),
      "2026-03-14 14:20 for 10: check failed: timeout"
    );
  }

  #[test]
  fn test_format_day() {
    let summary = DateAvailabilitySummary::new(
      date("2026-04-06"),
      vec![
        SlotAvailabilityResult {
          time: time("10:30"),
          available: SlotAvailability::Available,
          remaining_capacity: Some(3),
        },
        SlotAvailabilityResult::unknown(time("12:20")),
      ],
    );
    let holiday = HolidayRecord {
      date: date("2026-04-06"),
      name: "Easter Monday".to_string(),
      kind: HolidayKind::Movable,
    };
    assert_eq!(
      format_day(&summary, Some(&holiday)),
      "2026-04-06 Mon  1/2  10:30+ 12:20?  [Easter Monday]"
    );
  }

  #[tokio::test]
  async fn test_check_reports_verdict() {
    let service = Arc::new(FakeService::new());
    let config = Config::from_yaml("backend:\n  url: http://localhost\n").unwrap();

    check(service.clone(), &config, "2026-03-14", "14:20").await.unwrap();
    assert_eq!(service.checks().len(), 1);
    assert_eq!(service.checks()[0].party_size, 10);

    assert!(check(service, &config, "14.03.2026", "14:20").await.is_err());
  }

  #[tokio::test]
  async fn test_check_failure_is_an_error() {
    let service = Arc::new(FakeService::new().failing(date("2026-03-14")));
    let config = Config::from_yaml("backend:\n  url: http://localhost\n").unwrap();

    assert!(check(service, &config, "2026-03-14", "14:20").await.is_err());
  }

  #[tokio::test]
  async fn test_holidays_rejects_reversed_range() {
    let service = Arc::new(FakeService::new());
    assert!(holidays(service.clone(), Some(2027), Some(2026)).await.is_err());
    assert!(service.holiday_calls().is_empty());
  }
}
