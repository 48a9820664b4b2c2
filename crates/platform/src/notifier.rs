#![forbid(unsafe_code)]

use crate::error::Error;
use crate::osascript::{self, quote, quote_list};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use watcher::ControlEvent;
use watcher::notifier::{NotificationAction, NotificationRequest, Notifier, UserResponse};

const PERMISSION_PROBE: &str = r#"tell application "System Events" to count application processes"#;

/// Shows reminders as a System Events alert with one button per action.
///
/// Only one alert is on screen at a time: showing another one kills the
/// `osascript` process behind the previous alert.
pub struct AlertNotifier {
    runtime: Handle,
    events: flume::Sender<ControlEvent>,
    permission: Option<Result<(), watcher::Error>>,
    outstanding: Option<JoinHandle<()>>,
}

impl AlertNotifier {
    /// Must be called from within a tokio runtime.
    pub fn new(events: flume::Sender<ControlEvent>) -> Self {
        Self {
            runtime: Handle::current(),
            events,
            permission: None,
            outstanding: None,
        }
    }

    fn withdraw(&mut self) {
        if let Some(alert) = self.outstanding.take() {
            alert.abort();
        }
    }
}

/// What `display alert` printed once it was answered or timed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertReply {
    pub button: Option<String>,
    pub gave_up: bool,
}

/// Parses `button returned:<title>, gave up:<bool>`. `gave up` is only
/// present when the alert was shown with a timeout.
pub fn parse_alert_reply(reply: &str) -> Result<AlertReply, Error> {
    let reply = reply.trim();
    let rest = reply
        .strip_prefix("button returned:")
        .ok_or_else(|| Error::MalformedReply(reply.to_owned()))?;
    let (button, gave_up) = match rest.rsplit_once(", gave up:") {
        Some((button, "true")) => (button, true),
        Some((button, "false")) => (button, false),
        Some(_) => return Err(Error::MalformedReply(reply.to_owned())),
        None => (rest, false),
    };
    Ok(AlertReply {
        button: (!button.is_empty()).then(|| button.to_owned()),
        gave_up,
    })
}

/// The user's answer to `request`. An alert that timed out counts as
/// dismissed.
pub fn response_for(request: &NotificationRequest, reply: &AlertReply) -> UserResponse {
    let button = match reply.button.as_deref() {
        Some(button) if !reply.gave_up => button,
        _ => return UserResponse::Dismiss,
    };
    match request.action_for(button) {
        Some(action) => UserResponse::from(action),
        None => UserResponse::Action(button.to_owned()),
    }
}

fn alert_script(request: &NotificationRequest) -> String {
    let buttons = quote_list(request.actions.iter().map(|button| button.title.as_str()));
    let default_button = request
        .title_for(NotificationAction::Open)
        .map(|title| format!(" default button {}", quote(title)))
        .unwrap_or_default();
    format!(
        r#"tell application "System Events"
activate
display alert {title} message {body} buttons {buttons}{default_button} giving up after {timeout}
end tell"#,
        title = quote(&request.title),
        body = quote(&request.body),
        timeout = request.timeout.as_secs().max(1),
    )
}

impl Notifier for AlertNotifier {
    fn request_permission_once(&mut self) -> Result<(), watcher::Error> {
        self.permission
            .get_or_insert_with(|| match osascript::run(PERMISSION_PROBE) {
                Ok(_) => {
                    info!("automation of System Events allowed");
                    Ok(())
                }
                Err(err) if err.is_not_authorized() => {
                    Err(watcher::Error::PermissionDenied(err.to_string()))
                }
                // Anything else is not an answer to the permission prompt.
                Err(err) => {
                    debug!(%err, "permission check failed");
                    Ok(())
                }
            })
            .clone()
    }

    fn show_warning(&mut self, request: &NotificationRequest) -> Result<(), watcher::Error> {
        if let Some(Err(err)) = &self.permission {
            return Err(err.clone());
        }
        self.withdraw();

        let script = alert_script(request);
        let request = request.clone();
        let events = self.events.clone();
        self.outstanding = Some(self.runtime.spawn(async move {
            let reply = match osascript::run_async(&script).await {
                Ok(reply) => reply,
                Err(err) => {
                    error!(%err, identifier = %request.identifier, "reminder alert failed");
                    return;
                }
            };
            let response = match parse_alert_reply(&reply) {
                Ok(reply) => response_for(&request, &reply),
                Err(err) => {
                    error!(%err, "could not read reminder answer");
                    return;
                }
            };
            debug!(?response, "reminder answered");
            if events.send_async(ControlEvent::Response(response)).await.is_err() {
                debug!("control channel closed, dropping reminder answer");
            }
        }));
        Ok(())
    }
}

impl Drop for AlertNotifier {
    fn drop(&mut self) {
        self.withdraw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use watcher::notifier::QUIT_TARGET_ACTION;

    fn request() -> NotificationRequest {
        NotificationRequest::warning(&config::Notification::default())
    }

    #[test]
    fn button_pressed() {
        let reply = parse_alert_reply("button returned:Quit Console, gave up:false\n").unwrap();
        assert_eq!(
            reply,
            AlertReply {
                button: Some("Quit Console".into()),
                gave_up: false
            }
        );
        assert_eq!(
            response_for(&request(), &reply),
            UserResponse::Action(QUIT_TARGET_ACTION.into())
        );
    }

    #[test]
    fn timed_out_alert_is_a_dismissal() {
        let reply = parse_alert_reply("button returned:, gave up:true").unwrap();
        assert_eq!(reply.button, None);
        assert_eq!(response_for(&request(), &reply), UserResponse::Dismiss);
    }

    #[test]
    fn open_and_later_buttons() {
        let open = parse_alert_reply("button returned:Open, gave up:false").unwrap();
        let later = parse_alert_reply("button returned:Later").unwrap();
        assert_eq!(response_for(&request(), &open), UserResponse::Default);
        assert_eq!(response_for(&request(), &later), UserResponse::Dismiss);
    }

    #[test]
    fn button_titles_with_commas_survive() {
        let reply = parse_alert_reply("button returned:Yes, quit it, gave up:false").unwrap();
        assert_eq!(reply.button.as_deref(), Some("Yes, quit it"));
    }

    #[test]
    fn unexpected_reply_is_rejected() {
        assert!(matches!(
            parse_alert_reply("OK"),
            Err(Error::MalformedReply(_))
        ));
        assert!(matches!(
            parse_alert_reply("button returned:Open, gave up:maybe"),
            Err(Error::MalformedReply(_))
        ));
    }

    #[test]
    fn script_lists_buttons_and_timeout() {
        let script = alert_script(&request());
        assert!(script.contains(r#"buttons {"Open", "Later", "Quit Console"} default button "Open""#));
        assert!(script.contains("giving up after 300"));
    }
}
