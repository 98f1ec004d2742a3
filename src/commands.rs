/// Available commands and autocomplete logic
use crate::booking::types::DateKey;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "goto",
    aliases: &["g", "date"],
    description: "Jump to the week of YYYY-MM-DD",
  },
  Command {
    name: "today",
    aliases: &["t", "now"],
    description: "Jump to the current week",
  },
  Command {
    name: "refresh",
    aliases: &["r"],
    description: "Re-check every visible slot",
  },
  Command {
    name: "reload",
    aliases: &["clear"],
    description: "Drop cached availability and re-check",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit partyslots",
  },
];

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
  Goto(DateKey),
  Today,
  Refresh,
  Reload,
  Quit,
}

/// Parse a submitted command line such as `goto 2026-03-14`.
pub fn parse(input: &str) -> Result<AppCommand, String> {
  let mut parts = input.split_whitespace();
  let Some(word) = parts.next() else {
    return Err("empty command".to_string());
  };
  let name = resolve_name(word).ok_or_else(|| format!("unknown command: {}", word))?;
  let arg = parts.next();

  match (name, arg) {
    ("goto", Some(date)) => date
      .parse()
      .map(AppCommand::Goto)
      .map_err(|_| format!("not a date (YYYY-MM-DD): {}", date)),
    ("goto", None) => Err("usage: goto YYYY-MM-DD".to_string()),
    ("today", _) => Ok(AppCommand::Today),
    ("refresh", _) => Ok(AppCommand::Refresh),
    ("reload", _) => Ok(AppCommand::Reload),
    ("quit", _) => Ok(AppCommand::Quit),
    _ => Err(format!("unknown command: {}", word)),
  }
}

/// Exact name or alias lookup
fn resolve_name(word: &str) -> Option<&'static str> {
  let word = word.to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == word || cmd.aliases.contains(&word.as_str()))
    .map(|cmd| cmd.name)
}

/// Get autocomplete suggestions for a given input.
///
/// Only the command word is matched; once an argument is being typed there
/// is nothing left to suggest.
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim_start().to_lowercase();

  if input_lower.contains(' ') {
    return Vec::new();
  }

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
