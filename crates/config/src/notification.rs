#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

/// Wording and behaviour of the reminder alert.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Notification {
    /// Stable identifier. Showing a reminder with the same identifier replaces
    /// the one on screen.
    pub identifier: String,
    pub title: String,
    pub body: String,

    pub open_title: String,
    pub dismiss_title: String,
    pub quit_title: String,

    /// An unanswered alert is taken down after this long and counts as dismissed.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub timeout: Duration,
}

impl Default for Notification {
    fn default() -> Self {
        Self {
            identifier: "background-warning".into(),
            title: "Console is running in the background".into(),
            body: "Do you want to quit it?".into(),
            open_title: "Open".into(),
            dismiss_title: "Later".into(),
            quit_title: "Quit Console".into(),
            timeout: Duration::from_secs(5 * 60),
        }
    }
}
