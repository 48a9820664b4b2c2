#![forbid(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to extract config: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("failed to parse TOML document: {0}")]
    TomlParse(#[from] toml_edit::TomlError),

    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),

    #[error("no preferences location available on this system")]
    NoPreferencesDir,
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Extract(Box::new(err))
    }
}
