//! Process-wide cancellation for in-flight requests.

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Holds the token every new request attaches to.
///
/// [`CancellationScope::cancel_all`] cancels the current token and swaps a
/// fresh one in under the same lock, so requests already in flight see the
/// cancellation exactly once and requests issued afterwards are untouched.
#[derive(Debug)]
pub struct CancellationScope {
    current: Mutex<CancellationToken>,
}

impl CancellationScope {
    /// Creates a scope with a live token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Mutex::new(CancellationToken::new()),
        }
    }

    /// Token for a request starting now.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.current.lock().clone()
    }

    /// Cancels every request attached to the current token and installs a
    /// fresh one.
    pub fn cancel_all(&self) {
        let previous = std::mem::replace(&mut *self.current.lock(), CancellationToken::new());
        previous.cancel();
    }
}

impl Default for CancellationScope {
    fn default() -> Self {
        Self::new()
    }
}
