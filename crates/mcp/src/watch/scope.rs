//! Cancellable request scope for one observe call.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Folds the caller's cancellation and the optional deadline into one signal.
///
/// The scope owns a child of the caller's token and cancels it when dropped,
/// so the child token never outlives the call. The subscription itself
/// is released by dropping it when the receive loop returns. A deadline too
/// far out to represent as an [`Instant`] is treated as no deadline.
pub(crate) struct WatchScope {
    token: CancellationToken,
    deadline: Option<Instant>,
    _guard: DropGuard,
}

impl WatchScope {
    pub(crate) fn new(caller: &CancellationToken, timeout: Option<Duration>) -> Self {
        let token = caller.child_token();
        Self {
            _guard: token.clone().drop_guard(),
            token,
            deadline: timeout.and_then(|timeout| Instant::now().checked_add(timeout)),
        }
    }

    /// Resolves once the deadline passes or the caller cancels.
    pub(crate) async fn expired(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    #[cfg(test)]
    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_expires_scope() {
        let caller = CancellationToken::new();
        let scope = WatchScope::new(&caller, Some(Duration::from_secs(30)));
        let started = Instant::now();
        scope.expired().await;
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert!(!caller.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn caller_cancellation_expires_scope_without_deadline() {
        let caller = CancellationToken::new();
        let scope = WatchScope::new(&caller, None);
        caller.cancel();
        scope.expired().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_deadline_falls_back_to_cancellation() {
        let caller = CancellationToken::new();
        let scope = WatchScope::new(&caller, Some(Duration::MAX));
        caller.cancel();
        scope.expired().await;
    }

    #[test]
    fn dropping_scope_cancels_its_token_only() {
        let caller = CancellationToken::new();
        let scope = WatchScope::new(&caller, None);
        let token = scope.token();
        drop(scope);
        assert!(token.is_cancelled());
        assert!(!caller.is_cancelled());
    }
}
