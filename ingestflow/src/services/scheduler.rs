//! Delayed-callback scheduling with cancellable handles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

/// A callback scheduled to run after a delay.
pub type ScheduledCallback = Box<dyn FnOnce() + Send + 'static>;

/// Trait for scheduling delayed work.
pub trait Scheduler: Send + Sync {
    /// Schedules `callback` to run once after `delay`.
    fn schedule(&self, delay: Duration, callback: ScheduledCallback) -> SchedulerHandle;
}

/// Shared resolution state between a handle and its trigger.
///
/// Exactly one side claims the state: the trigger when the delay elapses, or
/// the handle when it is cancelled first.
#[derive(Debug, Default)]
struct HandleState {
    claimed: AtomicBool,
    cancelled: AtomicBool,
}

/// A cancellable token for one scheduled callback.
///
/// Cancelling before the callback fires guarantees it never runs; cancelling
/// after it fired (or after an earlier cancel) does nothing.
#[derive(Debug)]
pub struct SchedulerHandle {
    state: Arc<HandleState>,
    abort: Option<AbortHandle>,
}

impl SchedulerHandle {
    /// Creates a handle and the trigger a scheduler fires it through.
    #[must_use]
    pub fn pair() -> (Self, SchedulerTrigger) {
        let state = Arc::new(HandleState::default());
        (
            Self {
                state: Arc::clone(&state),
                abort: None,
            },
            SchedulerTrigger { state },
        )
    }

    /// Attaches the task to abort when the handle is cancelled.
    #[must_use]
    pub(crate) fn with_abort(mut self, abort: AbortHandle) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Cancels the scheduled callback.
    ///
    /// Returns `true` when the callback was prevented from running, `false`
    /// when it already fired or the handle was already cancelled.
    pub fn cancel(&self) -> bool {
        if self
            .state
            .claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.state.cancelled.store(true, Ordering::SeqCst);
            if let Some(ref abort) = self.abort {
                abort.abort();
            }
            true
        } else {
            false
        }
    }

    /// Whether this handle was cancelled before its callback fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the callback fired.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.state.claimed.load(Ordering::SeqCst) && !self.is_cancelled()
    }
}

/// The scheduler side of a [`SchedulerHandle`].
#[derive(Debug)]
pub struct SchedulerTrigger {
    state: Arc<HandleState>,
}

impl SchedulerTrigger {
    /// Claims the right to run the callback.
    ///
    /// Returns `false` when the handle was cancelled first; the callback must
    /// not run in that case.
    #[must_use]
    pub fn try_fire(&self) -> bool {
        self.state
            .claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// A [`Scheduler`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    /// Creates a new tokio-backed scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, callback: ScheduledCallback) -> SchedulerHandle {
        let (handle, trigger) = SchedulerHandle::pair();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if trigger.try_fire() {
                callback();
            }
        });
        handle.with_abort(task.abort_handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_trigger_fires_once() {
        let (handle, trigger) = SchedulerHandle::pair();
        assert!(trigger.try_fire());
        assert!(!trigger.try_fire());
        assert!(handle.has_fired());
        assert!(!handle.is_cancelled());
    }

    #[test]
    fn test_cancel_before_fire_claims_the_handle() {
        let (handle, trigger) = SchedulerHandle::pair();
        assert!(handle.cancel());
        assert!(!trigger.try_fire());
        assert!(handle.is_cancelled());
        assert!(!handle.has_fired());
    }

    #[test]
    fn test_cancel_after_fire_is_a_no_op() {
        let (handle, trigger) = SchedulerHandle::pair();
        assert!(trigger.try_fire());
        assert!(!handle.cancel());
        assert!(!handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_tokio_scheduler_runs_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let scheduler = TokioScheduler::new();
        let handle = scheduler.schedule(
            Duration::from_millis(5),
            Box::new(move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(handle.has_fired());
    }

    #[tokio::test]
    async fn test_tokio_scheduler_cancel_prevents_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let scheduler = TokioScheduler::new();
        let handle = scheduler.schedule(
            Duration::from_millis(50),
            Box::new(move || {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(handle.cancel());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let scheduler = TokioScheduler::new();
        let handle = scheduler.schedule(Duration::from_secs(10), Box::new(|| {}));

        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());
    }
}
