//! Suppression of self-inflicted mutation notifications.
//!
//! The link renderer edits the same tree the mutation watch observes. While
//! those edits run, the watch must not treat them as external changes, or
//! every conversion would clear the rendered-flags and schedule another pass.

use std::cell::Cell;
use std::rc::Rc;

/// Shared "self-mutation in progress" flag.
///
/// Cloning yields another handle to the same flag: the controller hands one
/// to the mutation watch and raises it around each link-rendering pass.
#[derive(Debug, Clone, Default)]
pub struct MutationGuard {
    active: Rc<Cell<bool>>,
}

impl MutationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether notifications should currently be ignored.
    pub fn is_suppressed(&self) -> bool {
        self.active.get()
    }

    /// Raise the flag until the returned token is dropped.
    pub fn suppress(&self) -> Suppressed {
        self.active.set(true);
        Suppressed {
            active: Rc::clone(&self.active),
        }
    }
}

/// Token holding a [`MutationGuard`] raised.
///
/// Dropping it always lowers the flag, including during unwinding, so a
/// failed edit pass can't silence mutation detection for good.
#[must_use = "the guard is lowered as soon as the token is dropped"]
#[derive(Debug)]
pub struct Suppressed {
    active: Rc<Cell<bool>>,
}

impl Drop for Suppressed {
    fn drop(&mut self) {
        self.active.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suppress_is_scoped() {
        let guard = MutationGuard::new();
        let watch = guard.clone();
        assert!(!watch.is_suppressed());
        {
            let _quiet = guard.suppress();
            assert!(watch.is_suppressed());
        }
        assert!(!watch.is_suppressed());
    }

    #[test]
    fn test_cleared_on_unwind() {
        let guard = MutationGuard::new();
        let inner = guard.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _quiet = inner.suppress();
            panic!("edit failed");
        }));
        assert!(result.is_err());
        assert!(!guard.is_suppressed());
    }
}
