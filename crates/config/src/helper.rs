#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the main app runs the background helper.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Helper {
    /// Helper executable. Defaults to `consolewatch-helper` next to the
    /// running executable.
    pub executable: Option<PathBuf>,

    /// LaunchAgent label used in login-item mode.
    pub login_item_label: String,

    /// Where LaunchAgent plists live. Defaults to `~/Library/LaunchAgents`.
    pub launch_agents_dir: Option<PathBuf>,

    /// Bundle identifier of the main app, brought forward from a reminder.
    pub parent_bundle_id: String,
}

impl Default for Helper {
    fn default() -> Self {
        Self {
            executable: None,
            login_item_label: "io.github.consolewatch.helper".into(),
            launch_agents_dir: None,
            parent_bundle_id: "io.github.consolewatch".into(),
        }
    }
}

impl Helper {
    pub fn launch_agents_dir(&self) -> Option<PathBuf> {
        self.launch_agents_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join("Library").join("LaunchAgents")))
    }
}
