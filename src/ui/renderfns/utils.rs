use ratatui::prelude::Color;

use crate::booking::types::SlotAvailability;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a probed slot
pub fn availability_color(availability: SlotAvailability) -> Color {
  match availability {
    SlotAvailability::Available => Color::Green,
    SlotAvailability::Unavailable => Color::Red,
    SlotAvailability::Unknown => Color::Yellow,
  }
}

/// Short cell marker for a probed slot
pub fn availability_symbol(availability: SlotAvailability) -> &'static str {
  match availability {
    SlotAvailability::Available => "free",
    SlotAvailability::Unavailable => "full",
    SlotAvailability::Unknown => "?",
  }
}
