use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Per-call cancellation and deadline.
///
/// Cancelling the token aborts the in-flight attempt and any backoff sleep.
/// The deadline caps the per-attempt timeout and stops further retries once
/// it has passed.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ties the call to an existing token, e.g. a child of a shutdown token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.with_deadline(deadline)
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn deadline_passed(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn remaining_counts_down_to_zero() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(2));
        assert_eq!(ctx.remaining(), Some(Duration::from_secs(2)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(ctx.remaining(), Some(Duration::from_secs(1)));
        assert!(!ctx.deadline_passed());

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        assert!(ctx.deadline_passed());
    }

    #[test]
    fn no_deadline_by_default() {
        let ctx = CallContext::new();
        assert!(ctx.remaining().is_none());
        assert!(!ctx.deadline_passed());
    }

    #[test]
    fn clones_share_cancellation() {
        let ctx = CallContext::new();
        let other = ctx.clone();
        other.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn child_token_follows_parent() {
        let parent = CancellationToken::new();
        let ctx = CallContext::new().with_cancel(parent.child_token());
        parent.cancel();
        assert!(ctx.is_cancelled());
    }
}
