#![forbid(unsafe_code)]

use std::process::ExitStatus;

/// AppleScript error number for "not authorized to send Apple events".
pub const NOT_AUTHORIZED: i32 = -1743;

/// Errors raised while talking to the operating system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A helper program could not be started or waited on.
    #[error("Failed to run `{program}`: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written or removed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An AppleScript finished unsuccessfully.
    #[error("AppleScript failed ({status}): {message}")]
    Script {
        status: ExitStatus,
        message: String,
        /// The AppleScript error number, when the message carries one.
        number: Option<i32>,
    },

    /// A command line tool finished unsuccessfully.
    #[error("`{program}` failed ({status}): {message}")]
    Command {
        program: &'static str,
        status: ExitStatus,
        message: String,
    },

    /// A reply did not have the expected shape.
    #[error("Unexpected reply: {0:?}")]
    MalformedReply(String),

    /// Sending a signal to a child process failed.
    #[error("Failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::Error,
    },

    /// No executable to launch could be found.
    #[error("Helper executable not found: {0}")]
    ExecutableNotFound(String),
}

impl Error {
    /// The user has not allowed this program to script other applications.
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, Self::Script { number: Some(NOT_AUTHORIZED), .. })
    }
}

impl From<Error> for watcher::Error {
    fn from(err: Error) -> Self {
        if err.is_not_authorized() {
            watcher::Error::PermissionDenied(err.to_string())
        } else {
            watcher::Error::Workspace(err.to_string())
        }
    }
}
