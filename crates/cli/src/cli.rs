use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Console Watch: reminds you to quit Console
///
/// Runs the background helper, either as a login item or as a child of this
/// process, depending on the `run_at_login` preference.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Console Watch helper
///
/// Watches Console and shows a reminder while it sits in the background.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct HelperCli {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Path to configuration file.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    /// Path to log file.
    ///
    /// Logs go to stderr when omitted.
    #[arg(short, long)]
    pub logfile: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

impl CommonArgs {
    /// Arguments handed to a helper started on our behalf.
    pub fn helper_args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if let Some(conffile) = &self.conffile {
            args.push("--conffile".into());
            args.push(conffile.clone().into_os_string());
        }
        args
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Turn starting the helper at login on or off.
    LoginItem {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Self::On
    }
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.is_file() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}
