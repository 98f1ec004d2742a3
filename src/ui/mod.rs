pub mod components;
pub mod renderfns;
pub mod views;

use crate::app::{App, Mode};
use crate::booking::types::DateKey;
use ratatui::prelude::*;

const NORMAL_HINTS: &[(&str, &str)] = &[
  ("h/l", "day"),
  ("j/k", "slot"),
  ("[/]", "week"),
  ("t", "today"),
  ("f", "check"),
  ("r", "refresh"),
  ("R", "reload"),
  (":", "command"),
  ("q", "quit"),
];

const FORM_HINTS: &[(&str, &str)] = &[("Tab", "next field"), ("Esc", "close")];

const COMMAND_HINTS: &[(&str, &str)] = &[("Tab", "complete"), ("Enter", "run"), ("Esc", "cancel")];

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Week grid
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  renderfns::draw_header(frame, chunks[0], &app.header());

  let columns = app.day_columns();
  views::draw_week_grid(frame, chunks[1], &columns, app.cursor(), DateKey::today());

  let hints = match app.mode() {
    Mode::Normal => NORMAL_HINTS,
    Mode::Command => COMMAND_HINTS,
    Mode::Form => FORM_HINTS,
  };
  renderfns::draw_footer(frame, chunks[2], hints, app.message());

  // Overlays last so they sit on top of the grid
  app.command().render_overlay(frame, chunks[1]);
  app.form().render(frame, chunks[1], &app.check_state());
}
