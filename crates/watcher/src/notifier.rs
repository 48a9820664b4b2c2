#![forbid(unsafe_code)]

use crate::error::Error;
use std::time::Duration;

/// Identifier of the custom "quit the target" action.
pub const QUIT_TARGET_ACTION: &str = "quit-target";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// Bring the main app forward.
    Open,
    Dismiss,
    QuitTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionButton {
    pub action: NotificationAction,
    pub title: String,
}

/// A reminder alert. Requests sharing an identifier replace each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub actions: Vec<ActionButton>,
    /// Unanswered alerts are taken down after this long.
    pub timeout: Duration,
}

impl NotificationRequest {
    /// The background warning described by `config`.
    pub fn warning(config: &config::Notification) -> Self {
        Self {
            identifier: config.identifier.clone(),
            title: config.title.clone(),
            body: config.body.clone(),
            actions: vec![
                ActionButton {
                    action: NotificationAction::Open,
                    title: config.open_title.clone(),
                },
                ActionButton {
                    action: NotificationAction::Dismiss,
                    title: config.dismiss_title.clone(),
                },
                ActionButton {
                    action: NotificationAction::QuitTarget,
                    title: config.quit_title.clone(),
                },
            ],
            timeout: config.timeout,
        }
    }

    pub fn title_for(&self, action: NotificationAction) -> Option<&str> {
        self.actions
            .iter()
            .find(|button| button.action == action)
            .map(|button| button.title.as_str())
    }

    pub fn action_for(&self, title: &str) -> Option<NotificationAction> {
        self.actions
            .iter()
            .find(|button| button.title == title)
            .map(|button| button.action)
    }
}

/// How the user answered a reminder. Exactly one per shown alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserResponse {
    Default,
    Dismiss,
    Action(String),
}

/// What the controller should do about a [`UserResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserIntent {
    BringAppForward,
    Dismissed,
    QuitTarget,
}

impl UserResponse {
    /// `None` for custom actions nobody registered.
    pub fn intent(&self) -> Option<UserIntent> {
        match self {
            Self::Default => Some(UserIntent::BringAppForward),
            Self::Dismiss => Some(UserIntent::Dismissed),
            Self::Action(id) if id == QUIT_TARGET_ACTION => Some(UserIntent::QuitTarget),
            Self::Action(_) => None,
        }
    }
}

impl From<NotificationAction> for UserResponse {
    fn from(action: NotificationAction) -> Self {
        match action {
            NotificationAction::Open => Self::Default,
            NotificationAction::Dismiss => Self::Dismiss,
            NotificationAction::QuitTarget => Self::Action(QUIT_TARGET_ACTION.to_owned()),
        }
    }
}

/// Puts reminders in front of the user. Responses come back as
/// [`ControlEvent::Response`](crate::ControlEvent::Response).
pub trait Notifier: Send {
    /// Asks for permission the first time, afterwards returns the remembered
    /// answer.
    fn request_permission_once(&mut self) -> Result<(), Error>;

    /// Shows `request`, replacing an outstanding alert with the same
    /// identifier.
    fn show_warning(&mut self, request: &NotificationRequest) -> Result<(), Error>;
}
