#![forbid(unsafe_code)]

use std::time::Duration;
use tracing::warn;

/// Backoff ladder of waits between reminders.
///
/// The tier index only moves forward through [`advance`](Self::advance),
/// saturating at the last tier, and only moves back through
/// [`reset`](Self::reset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalSchedule {
    tiers: Vec<Duration>,
    tier: usize,
}

impl IntervalSchedule {
    /// Builds a ladder from `tiers`, sorted ascending. An empty list falls
    /// back to the default ladder.
    pub fn new(tiers: impl IntoIterator<Item = Duration>) -> Self {
        let mut tiers: Vec<Duration> = tiers.into_iter().collect();
        if tiers.is_empty() {
            warn!("empty interval schedule, using default tiers");
            tiers = config::default_tiers();
        }
        tiers.sort_unstable();
        Self { tiers, tier: 0 }
    }

    pub fn current_interval(&self) -> Duration {
        self.tiers[self.tier]
    }

    pub fn advance(&mut self) {
        self.tier = (self.tier + 1).min(self.tiers.len() - 1);
    }

    pub fn reset(&mut self) {
        self.tier = 0;
    }

    pub fn tier(&self) -> usize {
        self.tier
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn is_last_tier(&self) -> bool {
        self.tier + 1 == self.tiers.len()
    }
}

impl Default for IntervalSchedule {
    fn default() -> Self {
        Self::new(config::default_tiers())
    }
}

impl From<&config::Schedule> for IntervalSchedule {
    fn from(schedule: &config::Schedule) -> Self {
        Self::new(schedule.tiers.iter().copied())
    }
}
