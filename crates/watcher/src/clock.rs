#![forbid(unsafe_code)]

use std::time::{Duration, Instant};

/// Source of time for the deferred timer. Tests run it on tokio's paused
/// clock.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);

    /// Time left until `deadline`, zero once it has passed.
    fn until(&self, deadline: Instant) -> Duration {
        deadline.saturating_duration_since(self.now())
    }
}

#[derive(Debug, Default)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn follows_paused_time() {
        let clock = SystemClock;
        let deadline = clock.now() + Duration::from_secs(90);

        clock.sleep(Duration::from_secs(30)).await;
        assert_eq!(clock.until(deadline), Duration::from_secs(60));

        clock.sleep(Duration::from_secs(120)).await;
        assert_eq!(clock.until(deadline), Duration::ZERO);
    }
}
