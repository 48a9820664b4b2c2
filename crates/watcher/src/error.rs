#![forbid(unsafe_code)]

/// Everything that can go wrong while watching the target or managing the
/// helper. None of these stop the watcher; they are surfaced and it carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The user has not allowed alerts, reminders cannot be shown.
    #[error("notification permission denied: {0}")]
    PermissionDenied(String),

    /// A reminder could not be put on screen.
    #[error("failed to show notification: {0}")]
    NotifyFailed(String),

    /// The helper process could not be started.
    #[error("failed to launch helper: {0}")]
    LaunchFailed(String),

    /// The target refused or failed to quit.
    #[error("failed to terminate {target}: {reason}")]
    TerminateFailed { target: String, reason: String },

    /// The login item could not be added or removed.
    #[error("failed to update login item (enabled: {enabled}): {reason}")]
    RegistrationFailed { enabled: bool, reason: String },

    /// Querying or commanding the running applications failed.
    #[error("workspace request failed: {0}")]
    Workspace(String),

    #[error("control channel closed")]
    ChannelClosed,
}
