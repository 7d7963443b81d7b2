//! Per-request context threaded through the use-case and middleware layers.
//!
//! Carries a cancellation handle so that a dropped client connection can
//! unwind an in-flight upstream call or window-limiter wait instead of
//! running it to completion for no one.

use tokio_util::sync::CancellationToken;

/// A cancellation-carrying handle passed to use-case functions and the rate
/// limiters. Cloning shares the same underlying token: cancelling any clone
/// cancels all of them.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Creates a fresh, not-yet-cancelled context.
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
        }
    }

    /// Creates a context that is cancelled whenever `parent` is.
    pub fn child_of(parent: &RequestContext) -> Self {
        Self {
            cancellation: parent.cancellation.child_token(),
        }
    }

    /// Signals cancellation to this context and everything derived from it.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether this context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once this context is cancelled. Intended for use in a
    /// `tokio::select!` alongside the work being guarded.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await
    }
}
