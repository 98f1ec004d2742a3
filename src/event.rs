use color_eyre::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::availability::Coverage;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for UI refresh and slot-check polling
  Tick,
  /// Progress or outcome of a coverage batch running in the background
  Coverage(CoverageEvent),
}

/// Messages sent by background coverage batches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageEvent {
  Progress { done: usize, total: usize },
  /// Batch applied; `fetched` dates were written to the cache
  Finished { fetched: usize },
  /// A newer batch took over before this one finished
  Superseded,
  Failed(String),
}

impl CoverageEvent {
  /// Final message for a finished `ensure_coverage` call
  pub fn from_outcome(outcome: Result<Coverage>) -> Self {
    match outcome {
      Ok(Coverage::Applied(results)) => CoverageEvent::Finished {
        fetched: results.len(),
      },
      Ok(Coverage::Superseded) => CoverageEvent::Superseded,
      Err(e) => CoverageEvent::Failed(e.to_string()),
    }
  }
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // Terminal polling blocks, keep it off the async workers
    let input_tx = tx.clone();
    tokio::task::spawn_blocking(move || loop {
      if event::poll(tick_rate).unwrap_or(false) {
        if let Ok(CrosstermEvent::Key(key)) = event::read() {
          if input_tx.send(Event::Key(key)).is_err() {
            break;
          }
        }
      } else if input_tx.send(Event::Tick).is_err() {
        break;
      }
    });

    Self { tx, rx }
  }

  /// Sender for background tasks that report back to the UI
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
