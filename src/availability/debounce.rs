//! Live availability check for a slot that is being typed in.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::service::AvailabilityService;
use super::token::TokenScope;
use crate::booking::types::{DateKey, SlotTime};

/// Default quiet interval before a check is sent
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(600);

/// Visible state of a slot check
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotCheckState {
  /// Nothing to check (some field is missing)
  #[default]
  Idle,
  /// Input changed, waiting for it to settle or for the backend to answer
  Pending,
  Resolved {
    available: bool,
    remaining_capacity: Option<u32>,
    /// Explanation from the backend, if it sent one
    message: Option<String>,
  },
  Failed(String),
}

impl SlotCheckState {
  pub fn is_pending(&self) -> bool {
    matches!(self, SlotCheckState::Pending)
  }
}

/// The (date, time, party size) triple as currently entered.
///
/// Empty or unparsable fields are `None`; such queries never reach the
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotQuery {
  pub date: Option<DateKey>,
  pub time: Option<SlotTime>,
  pub party_size: Option<u32>,
}

impl SlotQuery {
  pub fn new(date: DateKey, time: SlotTime, party_size: u32) -> Self {
    Self {
      date: Some(date),
      time: Some(time),
      party_size: Some(party_size).filter(|n| *n > 0),
    }
  }

  /// Build a query from raw form input
  pub fn parse(date: &str, time: &str, party_size: &str) -> Self {
    Self {
      date: date.parse().ok(),
      time: time.parse().ok(),
      party_size: party_size.trim().parse().ok().filter(|n: &u32| *n > 0),
    }
  }

  fn complete(&self) -> Option<(DateKey, SlotTime, u32)> {
    Some((self.date?, self.time?, self.party_size?))
  }
}

/// Debounced, always-live availability check for one form field.
///
/// Each call to [`check`](Self::check) restarts the quiet-interval timer and
/// invalidates any earlier check still in flight, so only the most recent
/// input can change the state. Results never touch the shared cache.
pub struct DebouncedSlotChecker {
  service: Arc<dyn AvailabilityService>,
  quiet: Duration,
  scope: Arc<TokenScope>,
  state: Arc<watch::Sender<SlotCheckState>>,
  timer: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedSlotChecker {
  pub fn new(service: Arc<dyn AvailabilityService>, quiet: Duration) -> Self {
    let (tx, _rx) = watch::channel(SlotCheckState::Idle);
    Self {
      service,
      quiet,
      scope: Arc::new(TokenScope::new()),
      state: Arc::new(tx),
      timer: Mutex::new(None),
    }
  }

  /// Receiver that observes every state change
  pub fn subscribe(&self) -> watch::Receiver<SlotCheckState> {
    self.state.subscribe()
  }

  pub fn state(&self) -> SlotCheckState {
    self.state.borrow().clone()
  }

  /// Schedule a check for `query` once the input has been quiet long enough.
  pub fn check(&self, query: SlotQuery) {
    let token = self.scope.issue();
    self.cancel_timer();

    let Some((date, time, party_size)) = query.complete() else {
      self.state.send_replace(SlotCheckState::Idle);
      return;
    };
    self.state.send_replace(SlotCheckState::Pending);

    let service = Arc::clone(&self.service);
    let scope = Arc::clone(&self.scope);
    let state = Arc::clone(&self.state);
    let quiet = self.quiet;

    let timer = tokio::spawn(async move {
      tokio::time::sleep(quiet).await;
      if !scope.is_current(token) {
        return;
      }

      // The probe runs detached; restarting the timer must not abort it
      tokio::spawn(async move {
        debug!(%date, %time, party_size, "checking slot");
        let result = service.check_slot(date, time, party_size).await;
        if !scope.is_current(token) {
          debug!(%date, %time, party_size, "slot check superseded");
          return;
        }

        let next = match result {
          Ok(check) => SlotCheckState::Resolved {
            available: check.available,
            remaining_capacity: check.remaining_capacity,
            message: check.error_message,
          },
          Err(e) => {
            warn!(%date, %time, error = %e, "slot check failed");
            SlotCheckState::Failed(e.to_string())
          }
        };
        state.send_replace(next);
      });
    });

    *self.timer.lock().unwrap_or_else(|e| e.into_inner()) = Some(timer);
  }

  /// Drop any pending or in-flight check and return to idle.
  pub fn reset(&self) {
    self.scope.issue();
    self.cancel_timer();
    self.state.send_replace(SlotCheckState::Idle);
  }

  fn cancel_timer(&self) {
    if let Some(timer) = self.timer.lock().unwrap_or_else(|e| e.into_inner()).take() {
      timer.abort();
    }
  }
}

impl Drop for DebouncedSlotChecker {
  fn drop(&mut self) {
    self.scope.issue();
    self.cancel_timer();
  }
}
