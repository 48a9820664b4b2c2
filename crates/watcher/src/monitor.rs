#![forbid(unsafe_code)]

use crate::domain::{ActivationEdge, TargetIdentity, WorkspaceEvent};
use crate::error::Error;
use crate::schedule::IntervalSchedule;
use crate::timer::{DeferredTimer, TimerToken};
use crate::tracker::{ActivationTracker, WatchGroup};
use crate::workspace::Workspace;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Target is not in the background, nothing scheduled.
    Idle,
    /// Watching, the last check found nothing to warn about yet.
    ArmedWaiting,
    /// Watching, the next check that still finds the target in the background
    /// warns.
    ArmedPendingWarning,
}

/// Outcome of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Quiet,
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOutcome {
    Terminated,
    NotRunning,
}

/// Decides when the user gets reminded that the target is still running in
/// the background.
///
/// Checks happen when the target enters the background and whenever the
/// single deferred timer fires. A target found in the background twice in a
/// row produces [`Verdict::Warn`], after which the schedule backs off.
pub struct BackgroundMonitor {
    target: TargetIdentity,
    workspace: Arc<dyn Workspace>,
    tracker: ActivationTracker,
    timer: Box<dyn DeferredTimer>,
    schedule: IntervalSchedule,
    state: MonitorState,
    reset_on_resume: bool,
}

impl BackgroundMonitor {
    pub fn new(
        target: TargetIdentity,
        workspace: Arc<dyn Workspace>,
        tracker: ActivationTracker,
        timer: Box<dyn DeferredTimer>,
        schedule: IntervalSchedule,
    ) -> Self {
        Self {
            target,
            workspace,
            tracker,
            timer,
            schedule,
            state: MonitorState::Idle,
            reset_on_resume: false,
        }
    }

    /// Also go back to the first tier whenever the target leaves the
    /// background.
    pub fn reset_on_resume(mut self, reset: bool) -> Self {
        self.reset_on_resume = reset;
        self
    }

    pub fn start(&mut self) {
        if let Some(edge) = self.tracker.start(self.workspace.as_ref()) {
            self.on_edge(edge);
        }
    }

    pub fn handle_workspace_event(&mut self, event: &WorkspaceEvent) -> Option<ActivationEdge> {
        let edge = self.tracker.handle(event)?;
        self.on_edge(edge);
        Some(edge)
    }

    pub fn timer_fired(&mut self, token: TimerToken) -> Verdict {
        if !self.timer.claim(token) {
            trace!(%token, "ignoring stale timer fire");
            return Verdict::Quiet;
        }
        if self.state == MonitorState::Idle {
            return Verdict::Quiet;
        }

        match self.check() {
            Some(verdict) => {
                if self.state == MonitorState::ArmedPendingWarning {
                    self.arm_timer();
                }
                verdict
            }
            // Status unknown: keep the state and look again next interval.
            None => {
                self.arm_timer();
                Verdict::Quiet
            }
        }
    }

    /// The user waved the reminder away. Wait a full interval before the
    /// next one, without backing off further.
    pub fn user_dismissed(&mut self) {
        if self.state == MonitorState::Idle {
            debug!("reminder dismissed while idle");
            return;
        }
        self.arm_timer();
    }

    /// Quits the target and applies the outcome. Blocks on the workspace;
    /// an event loop runs [`request_quit`] elsewhere and reports back through
    /// [`BackgroundMonitor::quit_finished`] instead.
    pub fn quit_target(&mut self) -> Result<QuitOutcome, Error> {
        let result = request_quit(self.workspace.as_ref(), &self.target);
        self.quit_finished(&result);
        result
    }

    /// On success the schedule starts over and the monitor waits for the next
    /// time the target enters the background. Anything else leaves schedule
    /// and state alone.
    pub fn quit_finished(&mut self, result: &Result<QuitOutcome, Error>) {
        match result {
            Ok(QuitOutcome::Terminated) => {
                info!(app = %self.target, "target quit");
                self.schedule.reset();
                self.timer.cancel();
                self.state = MonitorState::Idle;
                self.tracker.rearm();
            }
            Ok(QuitOutcome::NotRunning) => {
                debug!(app = %self.target, "quit requested but target is not running");
            }
            Err(err) => warn!(app = %self.target, %err, "target is still running"),
        }
    }

    /// Cancels the timer and drops every workspace subscription.
    pub fn stop(&mut self) {
        self.timer.cancel();
        self.tracker.stop();
        self.state = MonitorState::Idle;
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn pending_warning(&self) -> bool {
        self.state == MonitorState::ArmedPendingWarning
    }

    pub fn schedule(&self) -> &IntervalSchedule {
        &self.schedule
    }

    pub fn watch_group(&self) -> Option<WatchGroup> {
        self.tracker.group()
    }

    pub fn timer_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Time until the next scheduled check.
    pub fn next_check_in(&self) -> Option<Duration> {
        self.timer.remaining()
    }

    pub fn target(&self) -> &TargetIdentity {
        &self.target
    }

    fn on_edge(&mut self, edge: ActivationEdge) {
        match edge {
            ActivationEdge::WentBackground => self.begin_watch(),
            ActivationEdge::LeftBackgroundOrQuit => self.end_watch(),
        }
    }

    fn begin_watch(&mut self) {
        self.state = MonitorState::ArmedWaiting;
        self.check();
        self.arm_timer();
    }

    fn end_watch(&mut self) {
        self.timer.cancel();
        self.state = MonitorState::Idle;
        if self.reset_on_resume {
            self.schedule.reset();
        }
        debug!(tier = self.schedule.tier(), "stopped watching");
    }

    /// `None` when the target's status could not be determined, in which
    /// case nothing changes.
    fn check(&mut self) -> Option<Verdict> {
        let backgrounded = match self.workspace.status(&self.target) {
            Ok(status) => status.is_some_and(|status| status.is_backgrounded()),
            Err(err) => {
                warn!(app = %self.target, %err, "could not query target status");
                return None;
            }
        };
        let verdict = match (backgrounded, self.state) {
            (true, MonitorState::ArmedPendingWarning) => {
                self.schedule.advance();
                info!(app = %self.target, tier = self.schedule.tier(), "target still in the background");
                Verdict::Warn
            }
            (true, _) => {
                self.state = MonitorState::ArmedPendingWarning;
                Verdict::Quiet
            }
            (false, _) => {
                self.state = MonitorState::ArmedWaiting;
                Verdict::Quiet
            }
        };
        Some(verdict)
    }

    fn arm_timer(&mut self) {
        let after = self.schedule.current_interval();
        let token = self.timer.schedule(after);
        debug!(
            %token,
            ?after,
            tier = self.schedule.tier(),
            pending_warning = self.pending_warning(),
            "next check scheduled"
        );
    }
}

/// Asks the workspace to quit `target`. A target that is not running is left
/// alone. When it refuses, the user hears a beep and gets the target brought
/// forward to deal with it.
pub fn request_quit(
    workspace: &dyn Workspace,
    target: &TargetIdentity,
) -> Result<QuitOutcome, Error> {
    match workspace.status(target) {
        Ok(Some(_)) => {}
        Ok(None) => return Ok(QuitOutcome::NotRunning),
        Err(err) => warn!(app = %target, %err, "status unknown, trying to quit anyway"),
    }

    if let Err(err) = workspace.terminate(target) {
        workspace.beep();
        if let Err(activate_err) = workspace.activate(target) {
            warn!(app = %target, %activate_err, "could not bring target forward");
        }
        return Err(Error::TerminateFailed {
            target: target.to_string(),
            reason: err.to_string(),
        });
    }
    Ok(QuitOutcome::Terminated)
}
