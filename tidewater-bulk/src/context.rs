//! Cancellation, deadlines and request-scoped values.

use crate::error::BulkError;
use http::Extensions;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Carries cancellation, an optional deadline, and typed values.
///
/// Passed to [`BulkIndexer::add`](crate::BulkIndexer::add) and
/// [`BulkIndexer::close`](crate::BulkIndexer::close) to bound how long they
/// wait, and handed to callbacks and flush hooks. Cloning is cheap and clones
/// share cancellation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
    values: Extensions,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that can be cancelled independently of its parent.
    ///
    /// Cancelling the parent also cancels the child.
    pub fn with_cancel(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            values: self.values.clone(),
        }
    }

    /// Derive a cancellable context that expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a cancellable context that expires at `deadline`.
    ///
    /// An earlier parent deadline still applies.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.with_cancel();
        child.deadline = Some(match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        });
        child
    }

    /// Derive a context carrying `value`, replacing any value of the same type.
    pub fn with_value<T: Clone + Send + Sync + 'static>(&self, value: T) -> Self {
        let mut child = self.clone();
        child.values.insert(value);
        child
    }

    /// Look up a value by type.
    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The error this context is done with, if it is done.
    pub fn err(&self) -> Option<BulkError> {
        if self.token.is_cancelled() {
            return Some(BulkError::ContextCanceled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(BulkError::ContextDeadline),
            _ => None,
        }
    }

    /// Wait until the context is cancelled or its deadline passes.
    pub async fn done(&self) -> BulkError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => BulkError::ContextCanceled,
                    _ = tokio::time::sleep_until(deadline) => BulkError::ContextDeadline,
                }
            }
            None => {
                self.token.cancelled().await;
                BulkError::ContextCanceled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct FlushId(u64);

    #[test]
    fn test_background_is_never_done() {
        assert!(Context::background().err().is_none());
        assert!(Context::background().deadline().is_none());
    }

    #[test]
    fn test_cancel_propagates_to_children() {
        let parent = Context::background().with_cancel();
        let child = parent.with_cancel();

        parent.cancel();
        assert!(matches!(child.err(), Some(BulkError::ContextCanceled)));
    }

    #[test]
    fn test_child_cancel_leaves_parent() {
        let parent = Context::background().with_cancel();
        let child = parent.with_cancel();

        child.cancel();
        assert!(parent.err().is_none());
    }

    #[test]
    fn test_values() {
        let ctx = Context::background().with_value(FlushId(7));
        assert_eq!(ctx.value::<FlushId>(), Some(&FlushId(7)));
        assert!(ctx.with_cancel().value::<FlushId>().is_some());
        assert!(Context::background().value::<FlushId>().is_none());
    }

    #[tokio::test]
    async fn test_deadline_expires() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        assert!(ctx.err().is_none());

        let err = ctx.done().await;
        assert!(matches!(err, BulkError::ContextDeadline));
        assert!(matches!(ctx.err(), Some(BulkError::ContextDeadline)));
    }

    #[tokio::test]
    async fn test_parent_deadline_is_kept() {
        let parent = Context::background().with_timeout(Duration::from_millis(10));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test]
    async fn test_done_after_cancel() {
        let ctx = Context::background().with_timeout(Duration::from_secs(60));
        ctx.cancel();
        assert!(matches!(ctx.done().await, BulkError::ContextCanceled));
    }
}
