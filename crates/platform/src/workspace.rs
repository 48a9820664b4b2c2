#![forbid(unsafe_code)]

use crate::error::Error;
use crate::osascript::{self, quote};
use std::process::Command;
use tracing::{debug, warn};
use watcher::domain::{AppStatus, TargetIdentity};
use watcher::workspace::Workspace;

const ABSENT: &str = "absent";

/// The running applications, as seen through System Events.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWorkspace;

impl SystemWorkspace {
    pub fn new() -> Self {
        Self
    }

    /// Asks System Events for the target's process. Fails with
    /// `-1743` until the user allows automation of System Events.
    pub fn query_status(&self, target: &TargetIdentity) -> Result<Option<AppStatus>, Error> {
        let reply = osascript::run(&status_script(target.bundle_id()))?;
        parse_status_reply(&reply)
    }

    fn tell(&self, target: &TargetIdentity, command: &str) -> Result<(), Error> {
        osascript::run(&format!(
            "tell application id {} to {command}",
            quote(target.bundle_id())
        ))?;
        Ok(())
    }
}

fn status_script(bundle_id: &str) -> String {
    format!(
        r#"tell application "System Events"
set matches to every application process whose bundle identifier is {bundle_id}
if matches is {{}} then return "{ABSENT}"
set proc to item 1 of matches
return ((frontmost of proc) as text) & "," & ((visible of proc) as text)
end tell"#,
        bundle_id = quote(bundle_id),
    )
}

/// Parses `absent` or `<frontmost>,<visible>`.
pub fn parse_status_reply(reply: &str) -> Result<Option<AppStatus>, Error> {
    let reply = reply.trim();
    if reply == ABSENT {
        return Ok(None);
    }
    let malformed = || Error::MalformedReply(reply.to_owned());
    let (frontmost, visible) = reply.split_once(',').ok_or_else(malformed)?;
    let frontmost = parse_bool(frontmost).ok_or_else(malformed)?;
    let visible = parse_bool(visible).ok_or_else(malformed)?;
    Ok(Some(AppStatus {
        frontmost,
        hidden: !visible,
    }))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl Workspace for SystemWorkspace {
    fn status(&self, target: &TargetIdentity) -> Result<Option<AppStatus>, watcher::Error> {
        Ok(self.query_status(target)?)
    }

    fn terminate(&self, target: &TargetIdentity) -> Result<(), watcher::Error> {
        debug!(app = %target, "asking target to quit");
        Ok(self.tell(target, "quit")?)
    }

    fn activate(&self, target: &TargetIdentity) -> Result<(), watcher::Error> {
        Ok(self.tell(target, "activate")?)
    }

    fn open_application(&self, bundle_id: &str) -> Result<(), watcher::Error> {
        let output = Command::new("open")
            .args(["-b", bundle_id])
            .output()
            .map_err(|source| Error::Spawn {
                program: "open",
                source,
            })?;
        if output.status.success() {
            return Ok(());
        }
        Err(Error::Command {
            program: "open",
            status: output.status,
            message: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        }
        .into())
    }

    fn beep(&self) {
        if let Err(err) = osascript::run("beep") {
            warn!(%err, "could not beep");
        }
    }
}
