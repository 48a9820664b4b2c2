#![forbid(unsafe_code)]

mod error;
mod helper;
mod notification;
mod preferences;
mod schedule;
mod target;
mod workspace;

pub use error::Error;
pub use helper::Helper;
pub use notification::Notification;
pub use preferences::{PreferenceStore, Preferences};
pub use schedule::{Schedule, default_tiers};
pub use target::Target;
pub use workspace::Workspace;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables that override file values, e.g.
/// `CONSOLEWATCH_SCHEDULE__RESET_ON_RESUME=true`.
pub const ENV_PREFIX: &str = "CONSOLEWATCH_";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub target: Target,
    pub schedule: Schedule,
    pub notification: Notification,
    pub workspace: Workspace,
    pub helper: Helper,
    pub preferences: Preferences,
}

impl Config {
    /// Defaults overridden by the environment. A malformed override is an
    /// error, not a reason to fall back to the defaults.
    pub fn new() -> Result<Self, Error> {
        Ok(Self::figment().extract()?)
    }

    /// Defaults, then the TOML file at `path`, then the environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_owned()));
        }

        let config = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
