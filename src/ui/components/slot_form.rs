use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::availability::{SlotCheckState, SlotQuery};
use crate::booking::types::{DateKey, SlotTime};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
  #[default]
  Date,
  Time,
  PartySize,
}

impl FormField {
  fn next(self) -> Self {
    match self {
      FormField::Date => FormField::Time,
      FormField::Time => FormField::PartySize,
      FormField::PartySize => FormField::Date,
    }
  }

  fn prev(self) -> Self {
    match self {
      FormField::Date => FormField::PartySize,
      FormField::Time => FormField::Date,
      FormField::PartySize => FormField::Time,
    }
  }

  fn label(self) -> &'static str {
    match self {
      FormField::Date => "Date",
      FormField::Time => "Time",
      FormField::PartySize => "Guests",
    }
  }
}

/// Events emitted by the reservation form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// A field was edited; the query reflects all three fields
  Changed(SlotQuery),
  Closed,
}

/// Reservation check form: date, time and party size
#[derive(Debug, Clone)]
pub struct SlotForm {
  date: TextInput,
  time: TextInput,
  party_size: TextInput,
  focus: FormField,
  open: bool,
}

impl Default for SlotForm {
  fn default() -> Self {
    Self {
      date: TextInput::with_max_len(10),
      time: TextInput::with_max_len(5),
      party_size: TextInput::with_max_len(3),
      focus: FormField::default(),
      open: false,
    }
  }
}

impl SlotForm {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_open(&self) -> bool {
    self.open
  }

  /// Open prefilled with the selected cell; focus lands on the party size
  pub fn open(&mut self, date: DateKey, time: Option<SlotTime>, party_size: u32) -> SlotQuery {
    self.date.set_value(&date.to_string());
    self
      .time
      .set_value(&time.map(|t| t.to_string()).unwrap_or_default());
    self.party_size.set_value(&party_size.to_string());
    self.focus = if time.is_some() {
      FormField::PartySize
    } else {
      FormField::Time
    };
    self.open = true;
    self.query()
  }

  pub fn close(&mut self) {
    self.open = false;
  }

  pub fn focus(&self) -> FormField {
    self.focus
  }

  /// Query as currently typed
  pub fn query(&self) -> SlotQuery {
    SlotQuery::parse(
      self.date.value(),
      self.time.value(),
      self.party_size.value(),
    )
  }

  fn field(&self, field: FormField) -> &TextInput {
    match field {
      FormField::Date => &self.date,
      FormField::Time => &self.time,
      FormField::PartySize => &self.party_size,
    }
  }

  fn focused_mut(&mut self) -> &mut TextInput {
    match self.focus {
      FormField::Date => &mut self.date,
      FormField::Time => &mut self.time,
      FormField::PartySize => &mut self.party_size,
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.open {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.close();
        return KeyResult::Event(FormEvent::Closed);
      }
      KeyCode::Tab | KeyCode::Down | KeyCode::Enter => {
        self.focus = self.focus.next();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus = self.focus.prev();
        return KeyResult::Handled;
      }
      _ => {}
    }

    match self.focused_mut().handle_key(key) {
      InputResult::Changed => KeyResult::Event(FormEvent::Changed(self.query())),
      InputResult::Consumed | InputResult::Submitted(_) | InputResult::Cancelled => {
        KeyResult::Handled
      }
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  /// Render the form as a centered panel with the live verdict
  pub fn render(&self, frame: &mut Frame, area: Rect, state: &SlotCheckState) {
    if !self.open {
      return;
    }

    let width = 44.min(area.width);
    let height = 9.min(area.height);
    let panel = Rect::new(
      area.x + (area.width - width) / 2,
      area.y + (area.height - height) / 2,
      width,
      height,
    );
    frame.render_widget(Clear, panel);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Cyan))
      .title(" Check a slot ");
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let mut lines: Vec<Line> = [FormField::Date, FormField::Time, FormField::PartySize]
      .into_iter()
      .map(|field| self.field_line(field))
      .collect();
    lines.push(Line::raw(""));
    lines.push(verdict_line(state));
    lines.push(Line::from(Span::styled(
      "Tab next field  Esc close",
      Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn field_line(&self, field: FormField) -> Line<'_> {
    let focused = field == self.focus;
    let label_style = if focused {
      Style::default().fg(Color::Yellow).bold()
    } else {
      Style::default().fg(Color::Gray)
    };
    let mut spans = vec![Span::styled(format!(" {:<8}", field.label()), label_style)];
    spans.push(Span::raw(self.field(field).value().to_string()));
    if focused {
      spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
  }
}

fn verdict_line(state: &SlotCheckState) -> Line<'static> {
  match state {
    SlotCheckState::Idle => Line::from(Span::styled(
      " Fill in all fields to check",
      Style::default().fg(Color::DarkGray),
    )),
    SlotCheckState::Pending => Line::from(Span::styled(
      " Checking...",
      Style::default().fg(Color::Yellow),
    )),
    SlotCheckState::Resolved {
      available,
      remaining_capacity,
      message,
    } => {
      let (text, color) = if *available {
        (" Available", Color::Green)
      } else {
        (" Not available", Color::Red)
      };
      let mut spans = vec![Span::styled(text, Style::default().fg(color).bold())];
      if let Some(capacity) = remaining_capacity {
        spans.push(Span::raw(format!("  ({} places left)", capacity)));
      }
      if let Some(message) = message {
        spans.push(Span::styled(
          format!("  {}", message),
          Style::default().fg(Color::Gray),
        ));
      }
      Line::from(spans)
    }
    SlotCheckState::Failed(error) => Line::from(Span::styled(
      format!(" Check failed: {}", error),
      Style::default().fg(Color::Red),
    )),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn date(s: &str) -> DateKey {
    s.parse().unwrap()
  }

  #[test]
  fn test_closed_form_ignores_keys() {
    let mut form = SlotForm::new();
    assert_eq!(form.handle_key(key(KeyCode::Char('1'))), KeyResult::NotHandled);
  }

  #[test]
  fn test_open_prefills_query() {
    let mut form = SlotForm::new();
    let query = form.open(date("2026-03-14"), Some("14:20".parse().unwrap()), 10);

    assert!(form.is_open());
    assert_eq!(
      query,
      SlotQuery::new(date("2026-03-14"), "14:20".parse().unwrap(), 10)
    );
    assert_eq!(form.focus(), FormField::PartySize);
  }

  #[test]
  fn test_edit_emits_changed_query() {
    let mut form = SlotForm::new();
    form.open(date("2026-03-14"), Some("14:20".parse().unwrap()), 10);

    // Party size "10" -> "1"
    let result = form.handle_key(key(KeyCode::Backspace));
    let KeyResult::Event(FormEvent::Changed(query)) = result else {
      panic!("expected a change, got {:?}", result);
    };
    assert_eq!(query.party_size, Some(1));

    // Party size "" -> incomplete
    let result = form.handle_key(key(KeyCode::Backspace));
    let KeyResult::Event(FormEvent::Changed(query)) = result else {
      panic!("expected a change, got {:?}", result);
    };
    assert_eq!(query.party_size, None);
  }

  #[test]
  fn test_missing_time_focuses_time_field() {
    let mut form = SlotForm::new();
    let query = form.open(date("2026-03-16"), None, 8);
    assert_eq!(form.focus(), FormField::Time);
    assert_eq!(query.time, None);

    for c in "16:20".chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
    assert_eq!(form.query().time, Some("16:20".parse().unwrap()));
  }

  #[test]
  fn test_navigation_and_close() {
    let mut form = SlotForm::new();
    form.open(date("2026-03-14"), Some("14:20".parse().unwrap()), 10);

    assert_eq!(form.handle_key(key(KeyCode::Tab)), KeyResult::Handled);
    assert_eq!(form.focus(), FormField::Date);
    form.handle_key(key(KeyCode::BackTab));
    assert_eq!(form.focus(), FormField::PartySize);

    assert_eq!(
      form.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(FormEvent::Closed)
    );
    assert!(!form.is_open());
  }
}
