#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// The one application the helper keeps an eye on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Target {
    /// Bundle identifier matched against running applications.
    pub bundle_id: String,

    /// Human readable name, only used in messages.
    pub name: String,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            bundle_id: "com.apple.Console".into(),
            name: "Console".into(),
        }
    }
}
