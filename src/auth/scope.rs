use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Liveness handle for a caller scope (typically a view).
///
/// Session operations take a `ScopeToken` and check it before applying
/// results; once the owning scope ends and calls [`ScopeToken::cancel`], any
/// operation still in flight completes without mutating shared state.
#[derive(Debug, Clone, Default)]
pub struct ScopeToken {
    cancelled: Arc<AtomicBool>,
}

impl ScopeToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the owning scope as ended.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_live(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst)
    }
}
