#![forbid(unsafe_code)]

use crate::error::Error;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use watcher::run_mode::{HelperLauncher, RunningHelper};

/// File name of the helper binary.
pub const HELPER_EXECUTABLE: &str = "consolewatch-helper";

/// How long a helper gets to exit after `SIGTERM` before it is killed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Starts the helper as a child process of the main app.
#[derive(Debug, Clone)]
pub struct ChildLauncher {
    executable: PathBuf,
    args: Vec<OsString>,
    grace_period: Duration,
}

impl ChildLauncher {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// The configured executable, or the helper installed next to the
    /// running binary.
    pub fn from_config(config: &config::Helper) -> Result<Self, Error> {
        match &config.executable {
            Some(executable) => Ok(Self::new(executable)),
            None => {
                let current = std::env::current_exe()?;
                let sibling = sibling_executable(&current)
                    .ok_or_else(|| Error::ExecutableNotFound(current.display().to_string()))?;
                Ok(Self::new(sibling))
            }
        }
    }

    /// Extra arguments passed to every launched helper.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Time between `SIGTERM` and `SIGKILL` when stopping a helper.
    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn spawn(&self) -> Result<ChildHelper, Error> {
        if !self.executable.is_file() {
            return Err(Error::ExecutableNotFound(
                self.executable.display().to_string(),
            ));
        }
        let child = Command::new(&self.executable)
            .args(&self.args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: HELPER_EXECUTABLE,
                source,
            })?;
        debug!(pid = child.id(), executable = %self.executable.display(), "helper spawned");
        Ok(ChildHelper {
            child,
            grace_period: self.grace_period,
        })
    }
}

/// `consolewatch-helper` in the directory of `current`.
pub fn sibling_executable(current: &Path) -> Option<PathBuf> {
    current.parent().map(|dir| dir.join(HELPER_EXECUTABLE))
}

/// A helper started by [`ChildLauncher`]. Stopped with `SIGTERM`, then
/// `SIGKILL` once the grace period runs out.
#[derive(Debug)]
pub struct ChildHelper {
    child: Child,
    grace_period: Duration,
}

impl ChildHelper {
    pub fn stop(&mut self) -> Result<ExitStatus, Error> {
        let pid = self.child.id();
        if let Some(status) = self.child.try_wait()? {
            debug!(pid, %status, "helper already exited");
            return Ok(status);
        }
        match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(source) => return Err(Error::Signal { pid, source }),
        }

        let deadline = Instant::now() + self.grace_period;
        while Instant::now() < deadline {
            if let Some(status) = self.child.try_wait()? {
                info!(pid, %status, "helper exited");
                return Ok(status);
            }
            std::thread::sleep(EXIT_POLL_INTERVAL);
        }

        warn!(pid, grace_period = ?self.grace_period, "helper ignored SIGTERM, killing it");
        self.child.kill()?;
        let status = self.child.wait()?;
        info!(pid, %status, "helper killed");
        Ok(status)
    }
}

impl RunningHelper for ChildHelper {
    fn pid(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn terminate(&mut self) -> Result<(), watcher::Error> {
        self.stop()
            .map(|_| ())
            .map_err(|err| watcher::Error::Workspace(err.to_string()))
    }
}

impl HelperLauncher for ChildLauncher {
    fn launch(&self) -> Result<Box<dyn RunningHelper>, watcher::Error> {
        let helper = self
            .spawn()
            .map_err(|err| watcher::Error::LaunchFailed(err.to_string()))?;
        Ok(Box::new(helper))
    }
}
