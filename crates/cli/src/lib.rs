#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod logging;
pub mod preferences;
pub mod signals;

use config::Config;
use std::path::Path;

/// The file at `conffile` layered over the defaults, or just the defaults.
pub fn load_config(conffile: Option<&Path>) -> Result<Config, config::Error> {
    match conffile {
        Some(path) => Config::load(path),
        None => Config::new(),
    }
}
