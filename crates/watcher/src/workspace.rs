#![forbid(unsafe_code)]

use crate::domain::{AppStatus, TargetIdentity, WorkspaceEventKind};
use crate::error::Error;
use tracing::warn;

/// Queries and commands against the set of running applications.
pub trait Workspace: Send + Sync {
    /// `None` when no instance of the target is running.
    fn status(&self, target: &TargetIdentity) -> Result<Option<AppStatus>, Error>;

    /// Politely ask the running target to quit.
    fn terminate(&self, target: &TargetIdentity) -> Result<(), Error>;

    /// Bring the running target to the foreground.
    fn activate(&self, target: &TargetIdentity) -> Result<(), Error>;

    /// Launch, or bring forward, the application with `bundle_id`.
    fn open_application(&self, bundle_id: &str) -> Result<(), Error>;

    /// Audible cue.
    fn beep(&self);
}

/// Subscription side of the workspace's lifecycle notifications.
///
/// Nothing is delivered to the control loop while no kind is subscribed.
/// Deliveries may include kinds outside the current subscriptions, since
/// they can be queued before a switch; the tracker drops those. Adding a kind
/// twice or removing one that is not subscribed is a no-op.
pub trait NotificationCenter: Send {
    fn add_observer(&self, kind: WorkspaceEventKind);
    fn remove_observer(&self, kind: WorkspaceEventKind);
}

/// Whether the target runs without being the active application. A failed
/// query counts as not backgrounded so the user is never nagged on a guess.
pub fn is_backgrounded(workspace: &dyn Workspace, target: &TargetIdentity) -> bool {
    match workspace.status(target) {
        Ok(status) => status.is_some_and(|status| status.is_backgrounded()),
        Err(err) => {
            warn!(app = %target, %err, "could not query target status");
            false
        }
    }
}
