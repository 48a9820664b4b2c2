#![forbid(unsafe_code)]

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml_edit::{DocumentMut, value};

const RUN_AT_LOGIN_KEY: &str = "run_at_login";
const PREFERENCES_FILE: &str = "io.github.consolewatch.toml";

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Preferences {
    /// Preferences file. Defaults to the platform preferences directory.
    pub path: Option<PathBuf>,

    /// How often the main app re-reads the preferences file.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub poll_interval: Duration,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            path: None,
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl Preferences {
    pub fn store(&self) -> Result<PreferenceStore, Error> {
        match &self.path {
            Some(path) => Ok(PreferenceStore::new(path)),
            None => PreferenceStore::default_location(),
        }
    }
}

/// User preferences persisted as a small TOML document.
///
/// Writes go through [`toml_edit`], so keys and comments the app does not know
/// about survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self, Error> {
        let dir = dirs::preference_dir().ok_or(Error::NoPreferencesDir)?;
        Ok(Self::new(dir.join(PREFERENCES_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the helper should run as a login item. A missing file or key
    /// means no.
    pub fn run_at_login(&self) -> Result<bool, Error> {
        let doc = self.read()?;
        Ok(doc
            .get(RUN_AT_LOGIN_KEY)
            .and_then(|item| item.as_bool())
            .unwrap_or(false))
    }

    pub fn set_run_at_login(&self, enabled: bool) -> Result<(), Error> {
        let mut doc = self.read()?;
        doc[RUN_AT_LOGIN_KEY] = value(enabled);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, doc.to_string())?;
        Ok(())
    }

    fn read(&self) -> Result<DocumentMut, Error> {
        if !self.path.exists() {
            return Ok(DocumentMut::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(content.parse::<DocumentMut>()?)
    }
}
