#![forbid(unsafe_code)]

use crate::error::Error;
use tracing::{debug, info, warn};

/// A helper process started by the main app.
pub trait RunningHelper: Send {
    fn pid(&self) -> Option<u32>;
    fn terminate(&mut self) -> Result<(), Error>;
}

/// Starts the helper as a child of the main app. One attempt, no retries.
pub trait HelperLauncher: Send {
    fn launch(&self) -> Result<Box<dyn RunningHelper>, Error>;
}

/// Registers the helper to be started by the system at login.
pub trait LoginItemRegistry: Send {
    fn set_enabled(&self, enabled: bool) -> Result<(), Error>;
}

/// Shows an error to the user.
pub trait ErrorPresenter: Send {
    fn present(&self, error: &Error);
}

/// Keeps the helper running in exactly one way: as a login item, or as a
/// child process of the main app.
pub struct RunModeController {
    run_as_login_item: bool,
    launcher: Box<dyn HelperLauncher>,
    registry: Box<dyn LoginItemRegistry>,
    presenter: Box<dyn ErrorPresenter>,
    manual_helper: Option<Box<dyn RunningHelper>>,
}

impl RunModeController {
    pub fn new(
        run_as_login_item: bool,
        launcher: Box<dyn HelperLauncher>,
        registry: Box<dyn LoginItemRegistry>,
        presenter: Box<dyn ErrorPresenter>,
    ) -> Self {
        Self {
            run_as_login_item,
            launcher,
            registry,
            presenter,
            manual_helper: None,
        }
    }

    pub fn start(&mut self) {
        self.update_run_mode();
    }

    pub fn set_run_as_login_item(&mut self, enabled: bool) {
        self.run_as_login_item = enabled;
        self.update_run_mode();
    }

    pub fn run_as_login_item(&self) -> bool {
        self.run_as_login_item
    }

    pub fn manual_helper_pid(&self) -> Option<u32> {
        self.manual_helper.as_ref().and_then(|helper| helper.pid())
    }

    pub fn has_manual_helper(&self) -> bool {
        self.manual_helper.is_some()
    }

    /// Stops a manually started helper. The login item is left alone.
    pub fn shutdown(&mut self) {
        self.stop_manual_helper();
    }

    fn update_run_mode(&mut self) {
        let enabled = self.run_as_login_item;
        debug!(run_as_login_item = enabled, "applying run mode");
        if enabled {
            self.stop_manual_helper();
        }

        if let Err(err) = self.registry.set_enabled(enabled) {
            let err = match err {
                err @ Error::RegistrationFailed { .. } => err,
                other => Error::RegistrationFailed {
                    enabled,
                    reason: other.to_string(),
                },
            };
            self.presenter.present(&err);
            return;
        }

        if !enabled {
            self.start_manual_helper();
        }
    }

    fn start_manual_helper(&mut self) {
        self.stop_manual_helper();
        match self.launcher.launch() {
            Ok(helper) => {
                info!(pid = ?helper.pid(), "helper started");
                self.manual_helper = Some(helper);
            }
            Err(err) => {
                let err = match err {
                    err @ Error::LaunchFailed(_) => err,
                    other => Error::LaunchFailed(other.to_string()),
                };
                self.presenter.present(&err);
            }
        }
    }

    fn stop_manual_helper(&mut self) {
        if let Some(mut helper) = self.manual_helper.take() {
            let pid = helper.pid();
            match helper.terminate() {
                Ok(()) => info!(?pid, "helper stopped"),
                Err(err) => warn!(?pid, %err, "could not stop helper"),
            }
        }
    }
}

impl Drop for RunModeController {
    fn drop(&mut self) {
        self.stop_manual_helper();
    }
}
