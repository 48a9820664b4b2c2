#![forbid(unsafe_code)]

use crate::error::Error;
use crate::event::ControlEvent;
use crate::monitor::{BackgroundMonitor, Verdict, request_quit};
use crate::notifier::{NotificationRequest, Notifier, UserIntent, UserResponse};
use crate::workspace::Workspace;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Owns the monitor and the notifier and is the single consumer of
/// [`ControlEvent`]s.
///
/// Commands that may block on another application (quitting the target,
/// opening the main app) run on the blocking pool. Their outcome comes back
/// through `events`.
pub struct WatchController {
    monitor: BackgroundMonitor,
    notifier: Box<dyn Notifier>,
    workspace: Arc<dyn Workspace>,
    events: flume::Sender<ControlEvent>,
    request: NotificationRequest,
    parent_bundle_id: String,
}

impl WatchController {
    pub fn new(
        monitor: BackgroundMonitor,
        notifier: Box<dyn Notifier>,
        workspace: Arc<dyn Workspace>,
        events: flume::Sender<ControlEvent>,
        request: NotificationRequest,
        parent_bundle_id: impl Into<String>,
    ) -> Self {
        Self {
            monitor,
            notifier,
            workspace,
            events,
            request,
            parent_bundle_id: parent_bundle_id.into(),
        }
    }

    pub fn start(&mut self) {
        if let Err(err) = self.notifier.request_permission_once() {
            error!(%err, "reminders cannot be shown until alerts are allowed");
        }
        self.monitor.start();
    }

    pub fn handle(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Workspace(event) => {
                self.monitor.handle_workspace_event(&event);
            }
            ControlEvent::TimerFired(token) => {
                if self.monitor.timer_fired(token) == Verdict::Warn {
                    self.notify();
                }
            }
            ControlEvent::Response(response) => self.handle_response(response),
            ControlEvent::QuitFinished(result) => self.monitor.quit_finished(&result),
            ControlEvent::DumpState => self.dump_info(),
        }
    }

    /// Starts the monitor and handles events until `cancel` fires. All
    /// workspace subscriptions are gone when this returns.
    pub async fn run_until(
        &mut self,
        cancel: CancellationToken,
        events: flume::Receiver<ControlEvent>,
    ) -> Result<(), Error> {
        self.start();

        let result = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown requested");
                    break Ok(());
                }
                received = events.recv_async() => match received {
                    Ok(event) => self.handle(event),
                    Err(_) => break Err(Error::ChannelClosed),
                },
            }
        };

        self.monitor.stop();
        result
    }

    pub fn dump_info(&self) {
        let span = tracing::info_span!("monitor dump");
        let _enter = span.enter();
        info!(app = %self.monitor.target(), "target");
        info!(state = ?self.monitor.state(), next_check_in = ?self.monitor.next_check_in());
        info!(
            tier = self.monitor.schedule().tier(),
            interval = ?self.monitor.schedule().current_interval(),
            watching = ?self.monitor.watch_group(),
        );
    }

    pub fn monitor(&self) -> &BackgroundMonitor {
        &self.monitor
    }

    fn notify(&mut self) {
        if let Err(err) = self.notifier.show_warning(&self.request) {
            error!(%err, "could not show reminder");
        }
    }

    fn handle_response(&mut self, response: UserResponse) {
        match response.intent() {
            Some(UserIntent::QuitTarget) => self.quit_in_background(),
            Some(UserIntent::BringAppForward) => self.open_parent_in_background(),
            Some(UserIntent::Dismissed) => self.monitor.user_dismissed(),
            None => warn!(?response, "unknown reminder response"),
        }
    }

    fn quit_in_background(&self) {
        let workspace = Arc::clone(&self.workspace);
        let target = self.monitor.target().clone();
        let events = self.events.clone();
        tokio::task::spawn_blocking(move || {
            let result = request_quit(workspace.as_ref(), &target);
            if events.send(ControlEvent::QuitFinished(result)).is_err() {
                debug!("control loop gone, dropping quit result");
            }
        });
    }

    fn open_parent_in_background(&self) {
        let workspace = Arc::clone(&self.workspace);
        let bundle_id = self.parent_bundle_id.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(err) = workspace.open_application(&bundle_id) {
                error!(%err, %bundle_id, "could not open main app");
            }
        });
    }
}
