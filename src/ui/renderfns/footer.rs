use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Severity of a footer message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
  Info,
  Error,
}

/// Draw the footer bar: a status message if there is one, key hints otherwise
pub fn draw_footer(frame: &mut Frame, area: Rect, hints: &[(&str, &str)], message: Option<(&str, Tone)>) {
  let line = match message {
    Some((text, tone)) => {
      let color = match tone {
        Tone::Info => Color::Cyan,
        Tone::Error => Color::Red,
      };
      Line::from(Span::styled(format!(" {}", text), Style::default().fg(color)))
    }
    None => {
      let mut spans = vec![Span::raw(" ")];
      for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
          spans.push(Span::raw("  "));
        }
        // Keys highlighted, descriptions dimmed
        spans.push(Span::styled(format!("<{}>", key), Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
          format!(" {}", label),
          Style::default().fg(Color::DarkGray),
        ));
      }
      Line::from(spans)
    }
  };

  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
