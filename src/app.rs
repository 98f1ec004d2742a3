use crate::availability::{
  AutoRefreshScheduler, AvailabilityService, CacheStore, DebouncedSlotChecker, HolidayYearCache,
  QueryBatchCoordinator, SlotCheckState,
};
use crate::booking::types::DateKey;
use crate::commands::{self, AppCommand};
use crate::config::Config;
use crate::event::{CoverageEvent, Event, EventHandler};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, FormEvent, KeyResult, SlotForm};
use crate::ui::renderfns::{HeaderInfo, Tone};
use crate::ui::views::{DayColumn, GridCursor};
use chrono::{DateTime, Utc};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
  Form,
}

/// How a window change or key press fetches availability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
  /// Only days not cached yet
  Missing,
  /// Every visible day again
  Force,
  /// Drop the cache, then every visible day
  Reload,
}

/// Visible days starting at the shared window start
fn window_dates(window: &RwLock<DateKey>, days: usize) -> Vec<DateKey> {
  let start = *window.read().unwrap_or_else(|e| e.into_inner());
  start.range(days)
}

/// Main application state
pub struct App {
  config: Config,

  /// Backend host, for the header
  host: String,

  coordinator: Arc<QueryBatchCoordinator>,
  checker: DebouncedSlotChecker,
  check_state: watch::Receiver<SlotCheckState>,
  scheduler: AutoRefreshScheduler,

  /// First visible day; read by the auto refresh at every tick
  window: Arc<RwLock<DateKey>>,
  cursor: GridCursor,

  command: CommandInput,
  form: SlotForm,

  /// (done, total) of the batch currently running
  progress: Option<(usize, usize)>,
  message: Option<(String, Tone)>,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  should_quit: bool,
}

impl App {
  pub fn new(
    config: Config,
    service: Arc<dyn AvailabilityService>,
    host: String,
    event_tx: mpsc::UnboundedSender<Event>,
  ) -> Self {
    let store = Arc::new(CacheStore::new());
    let holidays = Arc::new(HolidayYearCache::new(Arc::clone(&service)));
    let coordinator = Arc::new(QueryBatchCoordinator::new(
      Arc::clone(&service),
      store,
      holidays,
      config.batch_options(),
    ));
    let checker = DebouncedSlotChecker::new(service, config.availability.debounce());
    let check_state = checker.subscribe();
    let scheduler = AutoRefreshScheduler::new(Arc::clone(&coordinator));

    let today = DateKey::today();
    let mut app = Self {
      config,
      host,
      coordinator,
      checker,
      check_state,
      scheduler,
      window: Arc::new(RwLock::new(today)),
      cursor: GridCursor::default(),
      command: CommandInput::new(),
      form: SlotForm::new(),
      progress: None,
      message: None,
      event_tx,
      should_quit: false,
    };
    app.place_window(today);
    app
  }

  pub async fn run(mut self, mut events: EventHandler) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    self.start_auto_refresh();
    self.fetch(Fetch::Missing);

    let result = self.main_loop(&mut terminal, &mut events).await;

    self.scheduler.stop();
    self.checker.reset();

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn main_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn start_auto_refresh(&mut self) {
    let interval = self.config.availability.refresh_interval();
    let window = Arc::clone(&self.window);
    let days = self.config.availability.visible_days;
    let progress_tx = self.event_tx.clone();
    let done_tx = self.event_tx.clone();

    self.scheduler.start(
      move || window_dates(&window, days),
      interval,
      move |done, total| {
        let _ = progress_tx.send(Event::Coverage(CoverageEvent::Progress { done, total }));
      },
      move |outcome| {
        let _ = done_tx.send(Event::Coverage(CoverageEvent::from_outcome(outcome)));
      },
    );
    if self.scheduler.is_running() {
      info!(every_secs = interval.as_secs(), "auto refresh started");
    }
  }

  /// Run a coverage batch for the visible days in the background
  fn fetch(&mut self, mode: Fetch) {
    let coordinator = Arc::clone(&self.coordinator);
    let dates = self.visible_dates();
    let tx = self.event_tx.clone();
    debug!(?mode, days = dates.len(), "requesting coverage");

    tokio::spawn(async move {
      let progress_tx = tx.clone();
      let on_progress = move |done, total| {
        let _ = progress_tx.send(Event::Coverage(CoverageEvent::Progress { done, total }));
      };
      let outcome = match mode {
        Fetch::Missing => coordinator.ensure_coverage(&dates, false, on_progress).await,
        Fetch::Force => coordinator.ensure_coverage(&dates, true, on_progress).await,
        Fetch::Reload => coordinator.reload(&dates, on_progress).await,
      };
      let _ = tx.send(Event::Coverage(CoverageEvent::from_outcome(outcome)));
    });
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {} // Redraw picks up slot-check state
      Event::Coverage(coverage) => self.handle_coverage_event(coverage),
    }
  }

  fn handle_coverage_event(&mut self, event: CoverageEvent) {
    match event {
      CoverageEvent::Progress { done, total } => self.progress = Some((done, total)),
      CoverageEvent::Finished { fetched } => {
        debug!(fetched, "coverage finished");
        self.progress = None;
      }
      // The batch that replaced it reports on its own
      CoverageEvent::Superseded => {}
      CoverageEvent::Failed(error) => {
        warn!(%error, "coverage failed");
        self.progress = None;
        self.message = Some((error, Tone::Error));
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The form owns every key while open, ':' included
    if self.form.is_open() {
      match self.form.handle_key(key) {
        KeyResult::Event(FormEvent::Changed(query)) => self.checker.check(query),
        KeyResult::Event(FormEvent::Closed) => self.checker.reset(),
        KeyResult::Handled | KeyResult::NotHandled => {}
      }
      return;
    }

    match self.command.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(line)) => {
        self.execute_command(&line);
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    self.handle_normal_mode_key(key);
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Esc => self.message = None,

      // Navigation
      KeyCode::Left | KeyCode::Char('h') => self.move_day(-1),
      KeyCode::Right | KeyCode::Char('l') => self.move_day(1),
      KeyCode::Up | KeyCode::Char('k') => self.move_slot(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_slot(1),
      KeyCode::Char('[') => self.shift_window(-7),
      KeyCode::Char(']') => self.shift_window(7),
      KeyCode::Char('t') => self.go_to(DateKey::today()),

      // Fetching
      KeyCode::Char('r') => self.fetch(Fetch::Force),
      KeyCode::Char('R') => self.fetch(Fetch::Reload),

      KeyCode::Enter | KeyCode::Char('f') => self.open_form(),

      _ => {}
    }
  }

  fn execute_command(&mut self, line: &str) {
    match commands::parse(line) {
      Ok(AppCommand::Goto(date)) => self.go_to(date),
      Ok(AppCommand::Today) => self.go_to(DateKey::today()),
      Ok(AppCommand::Refresh) => self.fetch(Fetch::Force),
      Ok(AppCommand::Reload) => self.fetch(Fetch::Reload),
      Ok(AppCommand::Quit) => self.should_quit = true,
      Err(error) => self.message = Some((error, Tone::Error)),
    }
  }

  fn open_form(&mut self) {
    let columns = self.day_columns();
    let Some((column, time)) = self.cursor.selected(&columns) else {
      return;
    };
    let query = self
      .form
      .open(column.date, time, self.config.availability.party_size);
    self.checker.check(query);
  }

  /// Put `date` in view (week-aligned for a week-wide window) and select it
  fn place_window(&mut self, date: DateKey) {
    let days = self.config.availability.visible_days;
    let start = if days >= 7 { date.week_start() } else { date };
    self.set_window(start);
    let offset = (date.date() - start.date()).num_days().max(0) as usize;
    self.cursor.day = offset.min(days.saturating_sub(1));
    self.clamp_cursor();
  }

  fn go_to(&mut self, date: DateKey) {
    self.place_window(date);
    self.fetch(Fetch::Missing);
  }

  fn shift_window(&mut self, days: i64) {
    let start = self.window_start().add_days(days);
    self.set_window(start);
    self.clamp_cursor();
    self.fetch(Fetch::Missing);
  }

  fn move_day(&mut self, delta: i64) {
    let last = self.config.availability.visible_days.saturating_sub(1);
    match (delta < 0, self.cursor.day) {
      (true, 0) => self.shift_window(-1),
      (false, day) if day >= last => self.shift_window(1),
      (true, day) => self.cursor.day = day - 1,
      (false, day) => self.cursor.day = day + 1,
    }
    self.clamp_cursor();
  }

  fn move_slot(&mut self, delta: i32) {
    let columns = self.day_columns();
    self.cursor.move_slot(delta, &columns);
  }

  fn clamp_cursor(&mut self) {
    let columns = self.day_columns();
    self.cursor.clamp(&columns);
  }

  fn set_window(&mut self, start: DateKey) {
    *self.window.write().unwrap_or_else(|e| e.into_inner()) = start;
  }

  fn window_start(&self) -> DateKey {
    *self.window.read().unwrap_or_else(|e| e.into_inner())
  }

  // Accessors for UI rendering
  pub fn mode(&self) -> Mode {
    if self.form.is_open() {
      Mode::Form
    } else if self.command.is_active() {
      Mode::Command
    } else {
      Mode::Normal
    }
  }

  pub fn visible_dates(&self) -> Vec<DateKey> {
    window_dates(&self.window, self.config.availability.visible_days)
  }

  /// Visible days with whatever is cached for them
  pub fn day_columns(&self) -> Vec<DayColumn> {
    let dates = self.visible_dates();
    let holidays = self.coordinator.holidays();
    let summaries = self
      .coordinator
      .store()
      .get_many(&dates)
      .unwrap_or_else(|_| vec![None; dates.len()]);

    dates
      .into_iter()
      .zip(summaries)
      .map(|(date, summary)| {
        let holiday = holidays.get(date).ok().flatten();
        let times = self
          .coordinator
          .schedule()
          .slots_for(date, holiday.is_some())
          .to_vec();
        DayColumn {
          date,
          holiday,
          times,
          summary,
        }
      })
      .collect()
  }

  pub fn cursor(&self) -> GridCursor {
    self.cursor
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  pub fn form(&self) -> &SlotForm {
    &self.form
  }

  pub fn check_state(&self) -> SlotCheckState {
    self.check_state.borrow().clone()
  }

  pub fn message(&self) -> Option<(&str, Tone)> {
    self.message.as_ref().map(|(text, tone)| (text.as_str(), *tone))
  }

  fn last_updated(&self) -> Option<DateTime<Utc>> {
    self.coordinator.store().last_updated().ok().flatten()
  }

  pub fn header(&self) -> HeaderInfo<'_> {
    let first = self.window_start();
    let days = self.config.availability.visible_days as i64;
    HeaderInfo {
      host: &self.host,
      first,
      last: first.add_days(days - 1),
      party_size: self.coordinator.party_size(),
      last_updated: self.last_updated(),
      progress: self.progress,
      auto_refresh: self.scheduler.is_running(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::availability::fake::FakeService;
  use std::time::Duration;

  fn date(s: &str) -> DateKey {
    s.parse().unwrap()
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn press_str(app: &mut App, s: &str) {
    for c in s.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
  }

  fn app_with(service: Arc<FakeService>) -> (App, mpsc::UnboundedReceiver<Event>) {
    let config = Config::from_yaml("backend:\n  url: http://localhost:9000/api\n").unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let app = App::new(config, service, "localhost".to_string(), tx);
    (app, rx)
  }

  /// Feed coverage events back into the app until a batch settles
  async fn settle(app: &mut App, rx: &mut mpsc::UnboundedReceiver<Event>) -> CoverageEvent {
    loop {
      let Some(Event::Coverage(event)) = rx.recv().await else {
        continue;
      };
      app.handle_coverage_event(event.clone());
      if !matches!(event, CoverageEvent::Progress { .. }) {
        return event;
      }
    }
  }

  #[tokio::test]
  async fn test_week_navigation_shifts_window() {
    let (mut app, _rx) = app_with(Arc::new(FakeService::new()));

    app.go_to(date("2026-03-18"));
    assert_eq!(app.visible_dates()[0], date("2026-03-16"));
    assert_eq!(app.cursor().day, 2);

    app.handle_key(key(KeyCode::Char(']')));
    assert_eq!(app.visible_dates()[0], date("2026-03-23"));

    app.handle_key(key(KeyCode::Char('[')));
    app.handle_key(key(KeyCode::Char('[')));
    assert_eq!(app.visible_dates()[0], date("2026-03-09"));
    assert_eq!(app.visible_dates().len(), 7);
  }

  #[tokio::test]
  async fn test_day_moves_past_edge_scroll_window() {
    let (mut app, _rx) = app_with(Arc::new(FakeService::new()));
    app.go_to(date("2026-03-16"));
    assert_eq!(app.cursor().day, 0);

    app.handle_key(key(KeyCode::Char('h')));
    assert_eq!(app.visible_dates()[0], date("2026-03-15"));
    assert_eq!(app.cursor().day, 0);

    app.handle_key(key(KeyCode::Char('l')));
    assert_eq!(app.cursor().day, 1);
  }

  #[tokio::test]
  async fn test_goto_command() {
    let (mut app, _rx) = app_with(Arc::new(FakeService::new()));

    press_str(&mut app, ":goto 2026-12-24");
    assert_eq!(app.mode(), Mode::Command);
    app.handle_key(key(KeyCode::Enter));

    assert_eq!(app.mode(), Mode::Normal);
    assert_eq!(app.visible_dates()[0], date("2026-12-21"));
    assert_eq!(app.cursor().day, 3);
  }

  #[tokio::test]
  async fn test_bad_command_reports_error() {
    let (mut app, _rx) = app_with(Arc::new(FakeService::new()));

    press_str(&mut app, ":goto someday");
    app.handle_key(key(KeyCode::Enter));

    let (text, tone) = app.message().unwrap();
    assert!(text.contains("someday"));
    assert_eq!(tone, Tone::Error);

    app.handle_key(key(KeyCode::Esc));
    assert!(app.message().is_none());
  }

  #[tokio::test]
  async fn test_window_change_fills_cache() {
    let service = Arc::new(FakeService::new());
    let (mut app, mut rx) = app_with(Arc::clone(&service));

    app.go_to(date("2026-03-16"));
    assert_eq!(settle(&mut app, &mut rx).await, CoverageEvent::Finished { fetched: 7 });
    assert!(app.header().progress.is_none());
    assert!(app.header().last_updated.is_some());

    let columns = app.day_columns();
    assert_eq!(columns.len(), 7);
    assert!(columns.iter().all(|c| c.summary.is_some()));
    // Saturday uses the weekend schedule
    assert_eq!(columns[5].times.len(), 5);

    // Going back to a cached week probes nothing
    let probes = service.checks().len();
    app.handle_key(key(KeyCode::Char(']')));
    settle(&mut app, &mut rx).await;
    app.handle_key(key(KeyCode::Char('[')));
    assert_eq!(settle(&mut app, &mut rx).await, CoverageEvent::Finished { fetched: 0 });
    // 20 probes for the new week, none for the cached one
    assert_eq!(service.checks().len(), probes + 20);
  }

  #[tokio::test]
  async fn test_holiday_failure_is_reported() {
    let service = Arc::new(FakeService::new().holidays_unreachable());
    let (mut app, mut rx) = app_with(service);

    app.go_to(date("2026-03-16"));
    let CoverageEvent::Failed(error) = settle(&mut app, &mut rx).await else {
      panic!("expected failure");
    };
    assert!(error.contains("could not start"));
    assert_eq!(app.message().map(|(_, tone)| tone), Some(Tone::Error));
  }

  #[tokio::test(start_paused = true)]
  async fn test_form_checks_selected_slot() {
    let service = Arc::new(FakeService::new());
    let (mut app, _rx) = app_with(Arc::clone(&service));
    app.go_to(date("2026-03-14"));

    app.handle_key(key(KeyCode::Char('f')));
    assert_eq!(app.mode(), Mode::Form);
    assert_eq!(app.check_state(), SlotCheckState::Pending);

    // ':' is form input, not a command
    app.handle_key(key(KeyCode::Char(':')));
    assert_eq!(app.mode(), Mode::Form);
    assert_eq!(app.check_state(), SlotCheckState::Idle);

    // Party size "10:" -> "4"
    for _ in 0..3 {
      app.handle_key(key(KeyCode::Backspace));
    }
    app.handle_key(key(KeyCode::Char('4')));
    assert_eq!(app.check_state(), SlotCheckState::Pending);

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(
      app.check_state(),
      SlotCheckState::Resolved {
        available: true,
        remaining_capacity: Some(5),
        message: None,
      }
    );
    let form_checks: Vec<_> = service
      .checks()
      .into_iter()
      .filter(|c| c.party_size == 4)
      .collect();
    assert_eq!(form_checks.len(), 1);
    assert_eq!(form_checks[0].date, date("2026-03-14"));
    assert_eq!(form_checks[0].time, "10:30".parse().unwrap());

    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.mode(), Mode::Normal);
    assert_eq!(app.check_state(), SlotCheckState::Idle);
  }

  #[tokio::test]
  async fn test_quit() {
    let (mut app, _rx) = app_with(Arc::new(FakeService::new()));
    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }
}
