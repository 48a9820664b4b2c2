#![forbid(unsafe_code)]

//! In-memory collaborators. They keep the watcher runnable without a window
//! server and record what was asked of them.

use crate::domain::{AppStatus, TargetIdentity, WorkspaceEventKind};
use crate::error::Error;
use crate::notifier::{NotificationRequest, Notifier};
use crate::run_mode::{ErrorPresenter, HelperLauncher, LoginItemRegistry, RunningHelper};
use crate::timer::{DeferredTimer, TimerToken};
use crate::workspace::{NotificationCenter, Workspace};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceCall {
    Terminate(String),
    Activate(String),
    Open(String),
    Beep,
}

#[derive(Debug, Default)]
struct WorkspaceState {
    status: Option<AppStatus>,
    status_unavailable: bool,
    refuse_termination: bool,
    calls: Vec<WorkspaceCall>,
}

/// A workspace holding the target's status in memory. Terminating the
/// target removes it unless termination is refused.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkspace {
    state: Arc<Mutex<WorkspaceState>>,
}

impl InMemoryWorkspace {
    pub fn with_status(status: AppStatus) -> Self {
        let workspace = Self::default();
        workspace.set_status(Some(status));
        workspace
    }

    pub fn set_status(&self, status: Option<AppStatus>) {
        self.state.lock().status = status;
    }

    /// Makes status queries fail, as when System Events does not answer.
    pub fn status_unavailable(&self, unavailable: bool) {
        self.state.lock().status_unavailable = unavailable;
    }

    pub fn refuse_termination(&self, refuse: bool) {
        self.state.lock().refuse_termination = refuse;
    }

    pub fn calls(&self) -> Vec<WorkspaceCall> {
        self.state.lock().calls.clone()
    }
}

impl Workspace for InMemoryWorkspace {
    fn status(&self, _target: &TargetIdentity) -> Result<Option<AppStatus>, Error> {
        let state = self.state.lock();
        if state.status_unavailable {
            return Err(Error::Workspace("status unavailable".into()));
        }
        Ok(state.status)
    }

    fn terminate(&self, target: &TargetIdentity) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.calls.push(WorkspaceCall::Terminate(target.bundle_id().to_owned()));
        if state.refuse_termination {
            return Err(Error::Workspace("termination refused".into()));
        }
        state.status = None;
        Ok(())
    }

    fn activate(&self, target: &TargetIdentity) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.calls.push(WorkspaceCall::Activate(target.bundle_id().to_owned()));
        if let Some(status) = state.status.as_mut() {
            status.frontmost = true;
            status.hidden = false;
        }
        Ok(())
    }

    fn open_application(&self, bundle_id: &str) -> Result<(), Error> {
        self.state.lock().calls.push(WorkspaceCall::Open(bundle_id.to_owned()));
        Ok(())
    }

    fn beep(&self) {
        self.state.lock().calls.push(WorkspaceCall::Beep);
    }
}

/// Notification center that only counts subscriptions.
#[derive(Debug, Clone, Default)]
pub struct RecordingCenter {
    subscriptions: Arc<Mutex<BTreeMap<WorkspaceEventKind, usize>>>,
}

impl RecordingCenter {
    pub fn observed(&self) -> BTreeSet<WorkspaceEventKind> {
        self.subscriptions
            .lock()
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Highest number of simultaneous subscriptions to a single kind.
    pub fn max_duplicate_subscriptions(&self) -> usize {
        self.subscriptions.lock().values().copied().max().unwrap_or(0)
    }
}

impl NotificationCenter for RecordingCenter {
    fn add_observer(&self, kind: WorkspaceEventKind) {
        *self.subscriptions.lock().entry(kind).or_default() += 1;
    }

    fn remove_observer(&self, kind: WorkspaceEventKind) {
        if let Some(count) = self.subscriptions.lock().get_mut(&kind) {
            *count = count.saturating_sub(1);
        }
    }
}

#[derive(Debug, Default)]
struct TimerState {
    issued: u64,
    armed: Option<(TimerToken, Duration)>,
    history: Vec<Duration>,
}

/// Timer that only fires when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    state: Arc<Mutex<TimerState>>,
}

impl ManualTimer {
    /// Token and delay of the armed fire.
    pub fn armed(&self) -> Option<(TimerToken, Duration)> {
        self.state.lock().armed
    }

    pub fn armed_delay(&self) -> Option<Duration> {
        self.armed().map(|(_, after)| after)
    }

    /// Token to hand to the monitor as if the armed fire happened.
    pub fn fire(&self) -> Option<TimerToken> {
        self.armed().map(|(token, _)| token)
    }

    /// Every delay ever scheduled, oldest first.
    pub fn history(&self) -> Vec<Duration> {
        self.state.lock().history.clone()
    }
}

impl DeferredTimer for ManualTimer {
    fn schedule(&mut self, after: Duration) -> TimerToken {
        let mut state = self.state.lock();
        state.issued += 1;
        let token = TimerToken::new(state.issued);
        state.armed = Some((token, after));
        state.history.push(after);
        token
    }

    fn cancel(&mut self) {
        self.state.lock().armed = None;
    }

    fn is_armed(&self) -> bool {
        self.state.lock().armed.is_some()
    }

    fn remaining(&self) -> Option<Duration> {
        self.armed_delay()
    }

    fn claim(&mut self, token: TimerToken) -> bool {
        let mut state = self.state.lock();
        match state.armed {
            Some((armed, _)) if armed == token => {
                state.armed = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct NotifierState {
    permission: Option<Result<(), Error>>,
    permission_requests: usize,
    shown: Vec<NotificationRequest>,
}

/// Notifier that keeps the requests it was asked to show.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<Mutex<NotifierState>>,
}

impl RecordingNotifier {
    /// The answer given the first time permission is requested.
    pub fn deny_permission(&self) {
        self.state.lock().permission = Some(Err(Error::PermissionDenied("denied".into())));
    }

    pub fn shown(&self) -> Vec<NotificationRequest> {
        self.state.lock().shown.clone()
    }

    pub fn permission_requests(&self) -> usize {
        self.state.lock().permission_requests
    }
}

impl Notifier for RecordingNotifier {
    fn request_permission_once(&mut self) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.permission_requests += 1;
        state.permission.get_or_insert(Ok(())).clone()
    }

    fn show_warning(&mut self, request: &NotificationRequest) -> Result<(), Error> {
        let mut state = self.state.lock();
        if let Some(Err(err)) = &state.permission {
            return Err(err.clone());
        }
        state.shown.retain(|shown| shown.identifier != request.identifier);
        state.shown.push(request.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelperCall {
    Launch,
    Terminate(u32),
    SetLoginItem(bool),
}

#[derive(Debug, Default)]
struct HelperState {
    next_pid: u32,
    fail_launch: bool,
    fail_registration: bool,
    running: BTreeSet<u32>,
    calls: Vec<HelperCall>,
    presented: Vec<Error>,
}

/// Launcher, login-item registry and error presenter sharing one log of
/// calls, so their relative order can be checked.
#[derive(Debug, Clone, Default)]
pub struct RecordingHelperHost {
    state: Arc<Mutex<HelperState>>,
}

impl RecordingHelperHost {
    pub fn fail_launch(&self, fail: bool) {
        self.state.lock().fail_launch = fail;
    }

    pub fn fail_registration(&self, fail: bool) {
        self.state.lock().fail_registration = fail;
    }

    pub fn calls(&self) -> Vec<HelperCall> {
        self.state.lock().calls.clone()
    }

    pub fn running(&self) -> BTreeSet<u32> {
        self.state.lock().running.clone()
    }

    pub fn presented(&self) -> Vec<Error> {
        self.state.lock().presented.clone()
    }
}

struct RecordedHelper {
    pid: u32,
    host: RecordingHelperHost,
}

impl RunningHelper for RecordedHelper {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn terminate(&mut self) -> Result<(), Error> {
        let mut state = self.host.state.lock();
        state.calls.push(HelperCall::Terminate(self.pid));
        state.running.remove(&self.pid);
        Ok(())
    }
}

impl HelperLauncher for RecordingHelperHost {
    fn launch(&self) -> Result<Box<dyn RunningHelper>, Error> {
        let mut state = self.state.lock();
        state.calls.push(HelperCall::Launch);
        if state.fail_launch {
            return Err(Error::LaunchFailed("helper missing".into()));
        }
        state.next_pid += 1;
        let pid = state.next_pid;
        state.running.insert(pid);
        Ok(Box::new(RecordedHelper {
            pid,
            host: self.clone(),
        }))
    }
}

impl LoginItemRegistry for RecordingHelperHost {
    fn set_enabled(&self, enabled: bool) -> Result<(), Error> {
        let mut state = self.state.lock();
        state.calls.push(HelperCall::SetLoginItem(enabled));
        if state.fail_registration {
            return Err(Error::RegistrationFailed {
                enabled,
                reason: "not allowed".into(),
            });
        }
        Ok(())
    }
}

impl ErrorPresenter for RecordingHelperHost {
    fn present(&self, error: &Error) {
        self.state.lock().presented.push(error.clone());
    }
}
