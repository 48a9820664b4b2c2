#![forbid(unsafe_code)]

use crate::osascript::{self, quote};
use tokio::runtime::Handle;
use tracing::{error, warn};
use watcher::run_mode::ErrorPresenter;

/// Presents errors as a critical alert without blocking the caller.
#[derive(Debug, Clone)]
pub struct AlertPresenter {
    runtime: Handle,
    title: String,
}

impl AlertPresenter {
    /// Must be called from within a tokio runtime.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            runtime: Handle::current(),
            title: title.into(),
        }
    }
}

pub fn error_script(title: &str, message: &str) -> String {
    format!(
        "display alert {} message {} as critical buttons {{\"OK\"}} default button \"OK\"",
        quote(title),
        quote(message)
    )
}

impl ErrorPresenter for AlertPresenter {
    fn present(&self, err: &watcher::Error) {
        error!(%err, "presenting error");
        let script = error_script(&self.title, &err.to_string());
        self.runtime.spawn(async move {
            if let Err(err) = osascript::run_async(&script).await {
                warn!(%err, "could not present error");
            }
        });
    }
}
