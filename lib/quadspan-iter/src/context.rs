use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperative cancellation flag shared by every iterator in a tree.
/// Cloning shares the same underlying flag; cancelling one clone cancels
/// all of them (§4.1 "cooperative cancellation").
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Threaded through every `next`/`contains`/`next_path` call. Iterators are
/// expected to check [`Context::check_cancelled`] at every suspension point
/// (each loop iteration, not just on entry) so cancellation is observed
/// promptly even deep inside a long-running scan.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns `Err(IterError::Cancelled)` if the token backing this
    /// context has been cancelled, `Ok(())` otherwise.
    pub fn check_cancelled(&self) -> Result<(), crate::error::IterError> {
        if self.cancel.is_cancelled() {
            Err(crate::error::IterError::Cancelled)
        } else {
            Ok(())
        }
    }
}
