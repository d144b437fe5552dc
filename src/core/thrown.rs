//! Replace-in-place holder for a record's causal error

use parking_lot::RwLock;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// The error payload a record can carry.
pub type ThrownError = Arc<dyn Error + Send + Sync + 'static>;

/// Mutable holder for the causal error of a record.
///
/// Replacing the error swaps the payload while the cell itself survives, so
/// a reused record never reallocates its error slot; `same_cell` makes that
/// identity observable. Cloning the cell clones the handle: both handles
/// see subsequent replacements. Use [`ErrorCell::detached`] for an
/// independent snapshot.
#[derive(Clone)]
pub struct ErrorCell {
    slot: Arc<RwLock<Option<ThrownError>>>,
}

impl ErrorCell {
    pub fn new(error: ThrownError) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(error))),
        }
    }

    pub fn empty() -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// Replaces the held error in place, returning the previous one. The
    /// cell keeps its identity; `None` empties it without discarding it.
    pub fn set(&self, error: Option<ThrownError>) -> Option<ThrownError> {
        std::mem::replace(&mut *self.slot.write(), error)
    }

    /// The currently held error, if any.
    pub fn current(&self) -> Option<ThrownError> {
        self.slot.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.read().is_none()
    }

    /// True when both handles refer to the same cell.
    pub fn same_cell(&self, other: &ErrorCell) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    /// An independent cell holding the same error. Later replacements on
    /// either cell do not affect the other.
    pub fn detached(&self) -> ErrorCell {
        Self {
            slot: Arc::new(RwLock::new(self.slot.read().clone())),
        }
    }
}

impl fmt::Debug for ErrorCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.slot.read() {
            Some(error) => write!(f, "ErrorCell({})", error),
            None => write!(f, "ErrorCell(empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct TestError(&'static str);

    fn thrown(text: &'static str) -> ThrownError {
        Arc::new(TestError(text))
    }

    #[test]
    fn test_new_and_current() {
        let cell = ErrorCell::new(thrown("boom"));
        assert!(!cell.is_empty());
        assert_eq!(cell.current().unwrap().to_string(), "boom");
    }

    #[test]
    fn test_set_replaces_in_place() {
        let cell = ErrorCell::new(thrown("first"));
        let handle = cell.clone();

        let previous = cell.set(Some(thrown("second")));
        assert_eq!(previous.unwrap().to_string(), "first");
        assert!(handle.same_cell(&cell));
        assert_eq!(handle.current().unwrap().to_string(), "second");
    }

    #[test]
    fn test_clear_retains_cell() {
        let cell = ErrorCell::new(thrown("gone"));
        let handle = cell.clone();

        cell.set(None);
        assert!(cell.is_empty());
        assert!(cell.current().is_none());
        assert!(handle.same_cell(&cell));
    }

    #[test]
    fn test_detached_is_independent() {
        let cell = ErrorCell::new(thrown("original"));
        let snapshot = cell.detached();

        assert!(!snapshot.same_cell(&cell));
        assert_eq!(snapshot.current().unwrap().to_string(), "original");

        cell.set(Some(thrown("changed")));
        assert_eq!(snapshot.current().unwrap().to_string(), "original");
        assert_eq!(cell.current().unwrap().to_string(), "changed");
    }

    #[test]
    fn test_debug_output() {
        let cell = ErrorCell::new(thrown("oops"));
        assert_eq!(format!("{:?}", cell), "ErrorCell(oops)");
        cell.set(None);
        assert_eq!(format!("{:?}", cell), "ErrorCell(empty)");
    }
}
