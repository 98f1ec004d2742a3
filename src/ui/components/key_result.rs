/// Outcome of offering a key to a component.
///
/// Components consume keys or pass them on; a consumed key may carry an
/// event the owner has to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, nothing for the owner to do
  Handled,
  /// Key was consumed and produced an event
  Event(T),
  /// Key was not consumed, try the next handler
  NotHandled,
}
