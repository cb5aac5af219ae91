//! Timer/event-loop primitive: scheduled one-shot callbacks, cancellable.
//!
//! States that create timers own the returned `TimerHandle` and cancel it in
//! `exit()` (spec.md §3/§4.4). Timer callbacks are resilient to staleness by
//! construction here: firing only ever enqueues a `TimerFired` command on the
//! state machine's actor channel (see `state_machine::mod`), and the actor
//! loop re-checks "is the calling state still current?" before acting on it.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

pub type TimerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A scheduled one-shot callback. Grounded in the teacher's
/// `JoinHandle`/`.abort()` cancellation idiom (`core/gateway.rs`).
pub trait EventLoop: Send + Sync {
    fn call_later(
        &self,
        seconds: u64,
        callback: Box<dyn FnOnce() -> TimerFuture + Send>,
    ) -> TimerHandle;
}

pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }
}

#[derive(Clone, Default)]
pub struct TokioEventLoop;

impl EventLoop for TokioEventLoop {
    fn call_later(
        &self,
        seconds: u64,
        callback: Box<dyn FnOnce() -> TimerFuture + Send>,
    ) -> TimerHandle {
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            callback().await;
        });
        TimerHandle { task }
    }
}

/// Elapsed-time check used by states that want to poll rather than rely
/// purely on the callback firing (kept for parity with the `is_done()`
/// contract in spec.md §4.4).
#[derive(Debug, Clone, Copy)]
pub struct StateMachineTimer {
    started_at: Instant,
    duration: Duration,
}

impl StateMachineTimer {
    pub fn new(seconds: u64) -> Self {
        Self {
            started_at: Instant::now(),
            duration: Duration::from_secs(seconds),
        }
    }

    pub fn is_done(&self) -> bool {
        self.started_at.elapsed() >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_timer_is_not_done() {
        let timer = StateMachineTimer::new(600);
        assert!(!timer.is_done());
    }

    #[tokio::test]
    async fn call_later_fires_and_can_be_cancelled() {
        let event_loop = TokioEventLoop;
        let handle = event_loop.call_later(0, Box::new(|| Box::pin(async {})));
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.cancel();
    }
}
