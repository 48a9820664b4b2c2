use crate::error::Error;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_log::AsTrace;

/// Installs the global subscriber. Logs are appended to `logfile` when one is
/// given, otherwise written to stderr.
pub fn init(verbosity: &Verbosity<WarnLevel>, logfile: Option<&Path>) -> Result<(), Error> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(verbosity.log_level_filter().as_trace())
        .with_level(true)
        .with_file(true)
        .with_line_number(true);

    match logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| Error::LogFile {
                    path: path.to_owned(),
                    source,
                })?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
