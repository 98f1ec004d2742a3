use chrono::{DateTime, Local, Utc};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::booking::types::DateKey;

/// What the header shows about the current session
pub struct HeaderInfo<'a> {
  pub host: &'a str,
  pub first: DateKey,
  pub last: DateKey,
  pub party_size: u32,
  pub last_updated: Option<DateTime<Utc>>,
  /// (done, total) of the batch currently running
  pub progress: Option<(usize, usize)>,
  pub auto_refresh: bool,
}

/// Draw the header bar with logo, backend, visible range and fetch state
pub fn draw_header(frame: &mut Frame, area: Rect, info: &HeaderInfo) {
  let sep = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let mut spans = vec![
    Span::styled(" partyslots ", Style::default().fg(Color::Cyan).bold()),
    sep(),
    Span::styled(format!(" {} ", info.host), Style::default().fg(Color::White)),
    sep(),
    Span::styled(
      format!(" {} ", format_range(info.first, info.last)),
      Style::default().fg(Color::Yellow).bold(),
    ),
    sep(),
    Span::styled(
      format!(" {} guests ", info.party_size),
      Style::default().fg(Color::White),
    ),
    sep(),
  ];

  match info.progress {
    Some((done, total)) => spans.push(Span::styled(
      format!(" checking {}/{} ", done, total),
      Style::default().fg(Color::Yellow),
    )),
    None => spans.push(Span::styled(
      format!(" {} ", format_updated(info.last_updated)),
      Style::default().fg(Color::DarkGray),
    )),
  }

  if info.auto_refresh {
    spans.push(Span::styled("⟳", Style::default().fg(Color::Green)));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// "16 Mar – 22 Mar 2026" style label
fn format_range(first: DateKey, last: DateKey) -> String {
  if first == last {
    return first.date().format("%a %d %b %Y").to_string();
  }
  format!(
    "{} – {}",
    first.date().format("%d %b"),
    last.date().format("%d %b %Y")
  )
}

fn format_updated(last_updated: Option<DateTime<Utc>>) -> String {
  match last_updated {
    Some(at) => format!("updated {}", at.with_timezone(&Local).format("%H:%M:%S")),
    None => "not loaded".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(s: &str) -> DateKey {
    s.parse().unwrap()
  }

  #[test]
  fn test_format_range() {
    assert_eq!(
      format_range(date("2026-03-16"), date("2026-03-22")),
      "16 Mar – 22 Mar 2026"
    );
    assert_eq!(
      format_range(date("2026-12-28"), date("2027-01-03")),
      "28 Dec – 03 Jan 2027"
    );
    assert_eq!(format_range(date("2026-03-14"), date("2026-03-14")), "Sat 14 Mar 2026");
  }

  #[test]
  fn test_format_updated_before_first_load() {
    assert_eq!(format_updated(None), "not loaded");
    assert!(format_updated(Some(Utc::now())).starts_with("updated "));
  }
}
