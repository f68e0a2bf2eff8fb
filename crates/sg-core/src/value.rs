//! Values produced by a single generator step.

/// One step's output: an application payload or a reserved control value.
///
/// Sentinels are variants, not payloads, so they stay detectable through
/// any number of wrapping combinators without comparing payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    /// An application payload, passed through unexamined.
    Item(T),
    /// No progress this call. Always paired with a live continuation that
    /// retries from the same point.
    Pending,
    /// Permanently exhausted. Multi-branch constructs emit this when the
    /// selected branch is spent; the canonical exhaustion signal remains a
    /// `None` continuation.
    StopIteration,
}

impl<T> Value<T> {
    /// True for an application payload.
    #[must_use]
    pub fn is_item(&self) -> bool {
        matches!(self, Value::Item(_))
    }

    /// True for the `Pending` sentinel.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Value::Pending)
    }

    /// True for the `StopIteration` sentinel.
    #[must_use]
    pub fn is_stop_iteration(&self) -> bool {
        matches!(self, Value::StopIteration)
    }

    /// True for either sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        !self.is_item()
    }

    /// The payload, if any.
    pub fn item(self) -> Option<T> {
        match self {
            Value::Item(x) => Some(x),
            Value::Pending | Value::StopIteration => None,
        }
    }

    /// Borrow the payload, if any.
    pub fn as_item(&self) -> Option<&T> {
        match self {
            Value::Item(x) => Some(x),
            Value::Pending | Value::StopIteration => None,
        }
    }

    /// Transform the payload, keeping sentinels as they are.
    pub fn map_item<U>(self, f: impl FnOnce(T) -> U) -> Value<U> {
        match self {
            Value::Item(x) => Value::Item(f(x)),
            Value::Pending => Value::Pending,
            Value::StopIteration => Value::StopIteration,
        }
    }
}

impl<T> From<T> for Value<T> {
    fn from(x: T) -> Self {
        Value::Item(x)
    }
}
