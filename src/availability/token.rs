//! Generation-based cancellation tokens.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one logical operation within a [`TokenScope`].
///
/// Tokens are never mutated; superseding one means issuing a newer token
/// from the same scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancellationToken(u64);

/// Issues tokens and remembers which one is current.
///
/// Each independent stream of work (a coordinator, a form field) owns its
/// own scope.
#[derive(Debug, Default)]
pub struct TokenScope {
  current: AtomicU64,
}

impl TokenScope {
  pub fn new() -> Self {
    Self::default()
  }

  /// Mint a new token; every previously issued token becomes stale.
  pub fn issue(&self) -> CancellationToken {
    CancellationToken(self.current.fetch_add(1, Ordering::AcqRel) + 1)
  }

  pub fn is_current(&self, token: CancellationToken) -> bool {
    self.current.load(Ordering::Acquire) == token.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_latest_token_is_current() {
    let scope = TokenScope::new();
    let first = scope.issue();
    assert!(scope.is_current(first));

    let second = scope.issue();
    assert!(!scope.is_current(first));
    assert!(scope.is_current(second));
    assert_ne!(first, second);
  }

  #[test]
  fn test_scopes_are_independent() {
    let a = TokenScope::new();
    let b = TokenScope::new();
    let token_a = a.issue();
    b.issue();
    b.issue();
    assert!(a.is_current(token_a));
  }
}
