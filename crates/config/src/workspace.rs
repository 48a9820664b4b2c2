#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Workspace {
    /// How often the running applications are sampled for lifecycle changes.
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    pub poll_interval: Duration,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1500),
        }
    }
}
