#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

const MINUTE: u64 = 60;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Schedule {
    /// Wait before each reminder, in seconds. Later reminders use later tiers.
    #[serde_as(as = "Vec<serde_with::DurationSeconds>")]
    pub tiers: Vec<Duration>,

    /// Go back to the first tier whenever the target leaves the background,
    /// not only after it was quit from a reminder.
    pub reset_on_resume: bool,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            reset_on_resume: false,
        }
    }
}

pub fn default_tiers() -> Vec<Duration> {
    [1, 5, 10, 20, 40, 60]
        .into_iter()
        .map(|minutes| Duration::from_secs(minutes * MINUTE))
        .collect()
}
