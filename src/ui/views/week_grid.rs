use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::booking::types::{
  DateAvailabilitySummary, DateKey, HolidayRecord, SlotAvailability, SlotTime,
};
use crate::ui::renderfns::{availability_color, availability_symbol, truncate};

/// Everything the grid needs to draw one day
#[derive(Debug, Clone)]
pub struct DayColumn {
  pub date: DateKey,
  pub holiday: Option<HolidayRecord>,
  /// Slots offered that day
  pub times: Vec<SlotTime>,
  /// `None` until the day has been probed
  pub summary: Option<DateAvailabilitySummary>,
}

impl DayColumn {
  /// Availability of one slot, `None` while the day is not loaded
  pub fn availability(&self, time: SlotTime) -> Option<(SlotAvailability, Option<u32>)> {
    let summary = self.summary.as_ref()?;
    Some(match summary.slot(time) {
      Some(slot) => (slot.available, slot.remaining_capacity),
      None => (SlotAvailability::Unknown, None),
    })
  }
}

/// Selected (day, slot) cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridCursor {
  pub day: usize,
  pub slot: usize,
}

impl GridCursor {
  /// Keep the cursor inside the grid; days may offer different slot counts
  pub fn clamp(&mut self, columns: &[DayColumn]) {
    if columns.is_empty() {
      *self = GridCursor::default();
      return;
    }
    self.day = self.day.min(columns.len() - 1);
    let slots = columns[self.day].times.len();
    self.slot = self.slot.min(slots.saturating_sub(1));
  }

  pub fn move_slot(&mut self, delta: i32, columns: &[DayColumn]) {
    let Some(column) = columns.get(self.day) else {
      return;
    };
    let len = column.times.len();
    if len > 0 {
      self.slot = (self.slot as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  pub fn selected<'a>(&self, columns: &'a [DayColumn]) -> Option<(&'a DayColumn, Option<SlotTime>)> {
    let column = columns.get(self.day)?;
    Some((column, column.times.get(self.slot).copied()))
  }
}

/// Text and colour of one slot line
fn slot_label(column: &DayColumn, time: SlotTime) -> (String, Color) {
  match column.availability(time) {
    None => (format!("{} ...", time), Color::DarkGray),
    Some((availability, capacity)) => {
      let mut label = format!("{} {}", time, availability_symbol(availability));
      if let (SlotAvailability::Available, Some(capacity)) = (availability, capacity) {
        label.push_str(&format!(" {}", capacity));
      }
      (label, availability_color(availability))
    }
  }
}

fn column_title(column: &DayColumn, today: DateKey) -> String {
  let mut title = column.date.date().format(" %a %d.%m ").to_string();
  if column.date == today {
    title.push_str("* ");
  }
  if let Some(summary) = &column.summary {
    let counts = summary.summary();
    title.push_str(&format!("{}/{} ", counts.available_count, counts.total_count));
  }
  title
}

/// Draw one bordered list per visible day
pub fn draw_week_grid(
  frame: &mut Frame,
  area: Rect,
  columns: &[DayColumn],
  cursor: GridCursor,
  today: DateKey,
) {
  if columns.is_empty() {
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let paragraph = Paragraph::new("No days to show.")
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  // Use Layout to distribute columns evenly
  let constraints: Vec<Constraint> = columns
    .iter()
    .map(|_| Constraint::Ratio(1, columns.len() as u32))
    .collect();
  let col_areas = Layout::horizontal(constraints).split(area);

  for (col_idx, column) in columns.iter().enumerate() {
    let is_selected_column = col_idx == cursor.day;
    let col_area = col_areas[col_idx];
    let inner_width = col_area.width.saturating_sub(2) as usize;

    let border_color = if is_selected_column {
      Color::Yellow
    } else if column.holiday.is_some() {
      Color::Magenta
    } else {
      Color::Blue
    };

    let mut block = Block::default()
      .title(column_title(column, today))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border_color));
    if let Some(holiday) = &column.holiday {
      block = block.title_bottom(
        Line::from(Span::styled(
          format!(" {} ", truncate(&holiday.name, inner_width.saturating_sub(2))),
          Style::default().fg(Color::Magenta),
        ))
        .centered(),
      );
    }

    let items: Vec<ListItem> = column
      .times
      .iter()
      .map(|&time| {
        let (label, color) = slot_label(column, time);
        ListItem::new(Line::from(Span::styled(
          truncate(&label, inner_width),
          Style::default().fg(color),
        )))
      })
      .collect();

    let list = List::new(items).block(block).highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    );

    if is_selected_column {
      let mut state = ListState::default();
      state.select(Some(cursor.slot));
      frame.render_stateful_widget(list, col_area, &mut state);
    } else {
      frame.render_widget(list, col_area);
    }
  }
}
