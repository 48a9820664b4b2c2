#![forbid(unsafe_code)]

use crate::domain::WorkspaceEvent;
use crate::error::Error;
use crate::monitor::QuitOutcome;
use crate::notifier::UserResponse;
use crate::timer::TimerToken;

/// Everything the watch loop reacts to. All of it arrives on one channel and
/// is handled by one consumer, one event at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    Workspace(WorkspaceEvent),
    TimerFired(TimerToken),
    Response(UserResponse),
    /// A quit request ran to completion off the loop.
    QuitFinished(Result<QuitOutcome, Error>),
    /// Log the current monitor state.
    DumpState,
}
