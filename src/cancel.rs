//! Cooperative cancellation token.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::LookupError;

/// Shared cancellation flag.
///
/// Clones observe the same flag, so the lifecycle registry can keep one
/// copy while the lookup carries another. Cancellation is cooperative: work
/// in flight keeps running until it reaches its next [`checkpoint`].
///
/// [`checkpoint`]: CancellationToken::checkpoint
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns `Err(LookupError::Cancelled)` once the token has fired.
    pub fn checkpoint(&self) -> Result<(), LookupError> {
        if self.is_cancelled() {
            Err(LookupError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// True when both handles refer to the same underlying flag.
    pub fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let copy = token.clone();
        assert!(copy.checkpoint().is_ok());
        token.cancel();
        assert!(copy.is_cancelled());
        assert_eq!(copy.checkpoint(), Err(LookupError::Cancelled));
        assert!(token.same_as(&copy));
    }

    #[test]
    fn distinct_tokens_are_not_the_same() {
        let a = CancellationToken::new();
        let b = CancellationToken::new();
        assert!(!a.same_as(&b));
    }
}
