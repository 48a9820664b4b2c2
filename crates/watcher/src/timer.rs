#![forbid(unsafe_code)]

use crate::clock::Clock;
use crate::event::ControlEvent;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Identifies one arming of a [`DeferredTimer`]. A fire carrying any other
/// token than the armed one is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Single-shot, cancellable deferred callback.
pub trait DeferredTimer: Send {
    /// Cancels any outstanding fire, then arms a new one after `after`.
    fn schedule(&mut self, after: Duration) -> TimerToken;

    /// Idempotent.
    fn cancel(&mut self);

    fn is_armed(&self) -> bool;

    /// Time left before the armed fire, `None` when disarmed.
    fn remaining(&self) -> Option<Duration>;

    /// Accepts the fire for `token` and disarms. Returns `false` for stale
    /// tokens, leaving the timer untouched.
    fn claim(&mut self, token: TimerToken) -> bool;
}

struct Armed {
    token: TimerToken,
    deadline: Instant,
    task: JoinHandle<()>,
}

/// Timer backed by a spawned tokio task that posts
/// [`ControlEvent::TimerFired`] to the control loop.
pub struct TokioTimer {
    clock: Arc<dyn Clock>,
    events: flume::Sender<ControlEvent>,
    issued: u64,
    armed: Option<Armed>,
}

impl TokioTimer {
    pub fn new(clock: Arc<dyn Clock>, events: flume::Sender<ControlEvent>) -> Self {
        Self {
            clock,
            events,
            issued: 0,
            armed: None,
        }
    }
}

impl DeferredTimer for TokioTimer {
    fn schedule(&mut self, after: Duration) -> TimerToken {
        self.cancel();

        self.issued += 1;
        let token = TimerToken(self.issued);
        let deadline = self.clock.now() + after;
        let clock = Arc::clone(&self.clock);
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            clock.sleep(after).await;
            if events.send_async(ControlEvent::TimerFired(token)).await.is_err() {
                debug!(%token, "control loop gone, dropping timer fire");
            }
        });

        trace!(%token, ?after, "timer armed");
        self.armed = Some(Armed {
            token,
            deadline,
            task,
        });
        token
    }

    fn cancel(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.task.abort();
            trace!(token = %armed.token, "timer cancelled");
        }
    }

    fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    fn remaining(&self) -> Option<Duration> {
        self.armed
            .as_ref()
            .map(|armed| self.clock.until(armed.deadline))
    }

    fn claim(&mut self, token: TimerToken) -> bool {
        match &self.armed {
            Some(armed) if armed.token == token => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    fn timer() -> (TokioTimer, flume::Receiver<ControlEvent>) {
        let (tx, rx) = flume::unbounded();
        (TokioTimer::new(Arc::new(SystemClock), tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_the_delay() {
        let (mut timer, rx) = timer();
        let token = timer.schedule(Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(rx.is_empty());
        assert_eq!(timer.remaining(), Some(Duration::from_secs(1)));

        let event = rx.recv_async().await.unwrap();
        assert_eq!(event, ControlEvent::TimerFired(token));
        assert!(timer.claim(token));
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn reschedule_cancels_the_outstanding_fire() {
        let (mut timer, rx) = timer();
        let first = timer.schedule(Duration::from_secs(10));
        let second = timer.schedule(Duration::from_secs(20));
        assert_ne!(first, second);

        let event = rx.recv_async().await.unwrap();
        assert_eq!(event, ControlEvent::TimerFired(second));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let (mut timer, rx) = timer();
        timer.schedule(Duration::from_secs(5));
        timer.cancel();
        timer.cancel();
        assert!(!timer.is_armed());
        assert_eq!(timer.remaining(), None);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_tokens_are_rejected() {
        let (mut timer, _rx) = timer();
        let stale = timer.schedule(Duration::from_secs(5));
        let current = timer.schedule(Duration::from_secs(5));

        assert!(!timer.claim(stale));
        assert!(timer.is_armed());
        assert!(timer.claim(current));
        assert!(!timer.claim(current));
    }
}
