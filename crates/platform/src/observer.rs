#![forbid(unsafe_code)]

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use watcher::ControlEvent;
use watcher::domain::{AppStatus, TargetIdentity, WorkspaceEvent, WorkspaceEventKind};
use watcher::workspace::{NotificationCenter, Workspace};

type Sample = Result<Option<AppStatus>, watcher::Error>;

/// Lifecycle notifications derived from sampling the workspace.
///
/// Clones share one subscription set and the latest sample, so the tracker
/// can own one clone while the sampling task holds another.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceObserver {
    subscribed: Arc<Mutex<HashSet<WorkspaceEventKind>>>,
    latest: Arc<Mutex<Option<(TargetIdentity, Sample)>>>,
}

impl WorkspaceObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self, kind: WorkspaceEventKind) -> bool {
        self.subscribed.lock().contains(&kind)
    }

    /// Events between two samples, or nothing once every subscription is
    /// gone.
    ///
    /// Kinds are not filtered by the current subscriptions. Events wait in
    /// the channel while the tracker switches groups, so the tracker decides
    /// what still applies when it reads them.
    pub fn forwarded_events(
        &self,
        previous: Option<AppStatus>,
        next: Option<AppStatus>,
        target: &TargetIdentity,
    ) -> Vec<WorkspaceEvent> {
        if self.subscribed.lock().is_empty() {
            return Vec::new();
        }
        diff(previous, next)
            .into_iter()
            .map(|kind| WorkspaceEvent::new(kind, target.bundle_id()))
            .collect()
    }

    /// Most recent sample of `target`, if one was taken.
    pub fn latest(&self, target: &TargetIdentity) -> Option<Sample> {
        match &*self.latest.lock() {
            Some((sampled, sample)) if sampled == target => Some(sample.clone()),
            _ => None,
        }
    }

    /// Takes one sample so status answers are available before the sampling
    /// task runs.
    pub async fn prime(&self, workspace: &Arc<dyn Workspace>, target: &TargetIdentity) {
        if let Err(err) = self.sample(workspace, target).await {
            warn!(app = %target, %err, "initial workspace sample failed");
        }
    }

    /// Samples the target every `interval` and forwards events until `cancel`
    /// fires or the receiver goes away. Without a primed sample, the first
    /// one only sets the baseline.
    pub fn spawn(
        &self,
        workspace: Arc<dyn Workspace>,
        target: TargetIdentity,
        interval: Duration,
        events: flume::Sender<ControlEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let observer = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut previous = match observer.latest(&target) {
                Some(Ok(status)) => Some(status),
                _ => None,
            };

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let next = match observer.sample(&workspace, &target).await {
                    Ok(next) => next,
                    Err(err) => {
                        warn!(app = %target, %err, "workspace sample failed");
                        continue;
                    }
                };
                let Some(last) = previous.replace(next) else {
                    continue;
                };

                for event in observer.forwarded_events(last, next, &target) {
                    trace!(kind = %event.kind, "workspace event");
                    if events.send_async(ControlEvent::Workspace(event)).await.is_err() {
                        debug!("control channel closed, observer exiting");
                        return;
                    }
                }
            }
            debug!("observer stopped");
        })
    }

    async fn sample(&self, workspace: &Arc<dyn Workspace>, target: &TargetIdentity) -> Sample {
        let workspace = Arc::clone(workspace);
        let sampled = target.clone();
        let sample = tokio::task::spawn_blocking(move || workspace.status(&sampled))
            .await
            .unwrap_or_else(|err| Err(watcher::Error::Workspace(err.to_string())));
        *self.latest.lock() = Some((target.clone(), sample.clone()));
        sample
    }
}

impl NotificationCenter for WorkspaceObserver {
    fn add_observer(&self, kind: WorkspaceEventKind) {
        self.subscribed.lock().insert(kind);
    }

    fn remove_observer(&self, kind: WorkspaceEventKind) {
        self.subscribed.lock().remove(&kind);
    }
}

/// A [`Workspace`] that answers status queries from the observer's latest
/// sample and sends commands to `live`. Reading the status never waits on
/// System Events.
pub struct SampledWorkspace {
    live: Arc<dyn Workspace>,
    observer: WorkspaceObserver,
}

impl SampledWorkspace {
    pub fn new(live: Arc<dyn Workspace>, observer: WorkspaceObserver) -> Self {
        Self { live, observer }
    }
}

impl Workspace for SampledWorkspace {
    fn status(&self, target: &TargetIdentity) -> Sample {
        self.observer
            .latest(target)
            .unwrap_or_else(|| Err(watcher::Error::Workspace(format!("{target} not sampled yet"))))
    }

    fn terminate(&self, target: &TargetIdentity) -> Result<(), watcher::Error> {
        self.live.terminate(target)
    }

    fn activate(&self, target: &TargetIdentity) -> Result<(), watcher::Error> {
        self.live.activate(target)
    }

    fn open_application(&self, bundle_id: &str) -> Result<(), watcher::Error> {
        self.live.open_application(bundle_id)
    }

    fn beep(&self) {
        self.live.beep();
    }
}

/// Lifecycle notifications implied by the target going from `previous` to
/// `next`, in the order the window server would post them.
pub fn diff(previous: Option<AppStatus>, next: Option<AppStatus>) -> Vec<WorkspaceEventKind> {
    use WorkspaceEventKind::*;

    match (previous, next) {
        (None, None) => Vec::new(),
        (Some(_), None) => vec![Terminate],
        (None, Some(next)) => {
            let mut kinds = Vec::new();
            if next.frontmost {
                kinds.push(Activate);
            } else {
                kinds.push(Deactivate);
            }
            if next.hidden {
                kinds.push(Hide);
            }
            kinds
        }
        (Some(previous), Some(next)) => {
            let mut kinds = Vec::new();
            if previous.hidden && !next.hidden {
                kinds.push(Unhide);
            }
            if !previous.frontmost && next.frontmost {
                kinds.push(Activate);
            }
            if previous.frontmost && !next.frontmost {
                kinds.push(Deactivate);
            }
            if !previous.hidden && next.hidden {
                kinds.push(Hide);
            }
            kinds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkspaceEventKind::*;
    use pretty_assertions::assert_eq;
    use watcher::ActivationTracker;
    use watcher::domain::ActivationEdge;
    use watcher::memory::{InMemoryWorkspace, WorkspaceCall};
    use watcher::tracker::WatchGroup;

    const FRONT: AppStatus = AppStatus {
        frontmost: true,
        hidden: false,
    };
    const BEHIND: AppStatus = AppStatus {
        frontmost: false,
        hidden: false,
    };
    const HIDDEN: AppStatus = AppStatus {
        frontmost: false,
        hidden: true,
    };

    #[test]
    fn unchanged_sample_is_silent() {
        assert!(diff(None, None).is_empty());
        assert!(diff(Some(HIDDEN), Some(HIDDEN)).is_empty());
    }

    #[test]
    fn hiding_the_frontmost_app() {
        assert_eq!(diff(Some(FRONT), Some(HIDDEN)), vec![Deactivate, Hide]);
    }

    #[test]
    fn switching_away_and_back() {
        assert_eq!(diff(Some(FRONT), Some(BEHIND)), vec![Deactivate]);
        assert_eq!(diff(Some(BEHIND), Some(FRONT)), vec![Activate]);
    }

    #[test]
    fn unhiding_brings_it_forward() {
        assert_eq!(diff(Some(HIDDEN), Some(FRONT)), vec![Unhide, Activate]);
    }

    #[test]
    fn launch_and_quit() {
        assert_eq!(diff(None, Some(FRONT)), vec![Activate]);
        assert_eq!(diff(None, Some(HIDDEN)), vec![Deactivate, Hide]);
        assert_eq!(diff(Some(BEHIND), None), vec![Terminate]);
    }

    fn console() -> TargetIdentity {
        TargetIdentity::new("com.apple.Console", "Console")
    }

    #[test]
    fn nothing_is_forwarded_without_subscribers() {
        let observer = WorkspaceObserver::new();
        let target = console();
        assert!(observer.forwarded_events(Some(FRONT), Some(HIDDEN), &target).is_empty());

        observer.add_observer(Hide);
        observer.add_observer(Hide);
        let events = observer.forwarded_events(Some(FRONT), Some(HIDDEN), &target);
        assert_eq!(
            events,
            vec![
                WorkspaceEvent::new(Deactivate, "com.apple.Console"),
                WorkspaceEvent::new(Hide, "com.apple.Console"),
            ]
        );

        observer.remove_observer(Hide);
        assert!(!observer.is_subscribed(Hide));
        assert!(observer.forwarded_events(Some(FRONT), Some(HIDDEN), &target).is_empty());
    }

    #[test]
    fn events_queued_across_a_group_switch_still_reach_the_tracker() {
        let observer = WorkspaceObserver::new();
        let target = console();
        let mut tracker = ActivationTracker::new(target.clone(), Box::new(observer.clone()));
        assert_eq!(tracker.start(&InMemoryWorkspace::with_status(FRONT)), None);
        assert_eq!(tracker.group(), Some(WatchGroup::BackgroundEntry));

        // Two samples land before the loop reads either of them.
        let mut queued = observer.forwarded_events(Some(FRONT), Some(BEHIND), &target);
        queued.extend(observer.forwarded_events(Some(BEHIND), Some(FRONT), &target));
        let edges: Vec<_> = queued.iter().filter_map(|event| tracker.handle(event)).collect();
        assert_eq!(
            edges,
            vec![ActivationEdge::WentBackground, ActivationEdge::LeftBackgroundOrQuit]
        );
        assert_eq!(tracker.group(), Some(WatchGroup::BackgroundEntry));

        let edges: Vec<_> = observer
            .forwarded_events(Some(FRONT), Some(HIDDEN), &target)
            .iter()
            .filter_map(|event| tracker.handle(event))
            .collect();
        assert_eq!(edges, vec![ActivationEdge::WentBackground]);
        assert_eq!(tracker.group(), Some(WatchGroup::BackgroundExit));
    }

    #[tokio::test]
    async fn sampled_status_does_not_query_the_live_workspace() {
        let live = InMemoryWorkspace::with_status(HIDDEN);
        let live_handle: Arc<dyn Workspace> = Arc::new(live.clone());
        let observer = WorkspaceObserver::new();
        let sampled = SampledWorkspace::new(Arc::clone(&live_handle), observer.clone());
        let target = console();
        assert!(sampled.status(&target).is_err());

        observer.prime(&live_handle, &target).await;
        live.set_status(Some(FRONT));
        assert_eq!(sampled.status(&target), Ok(Some(HIDDEN)));

        live.status_unavailable(true);
        observer.prime(&live_handle, &target).await;
        assert!(sampled.status(&target).is_err());
    }

    #[test]
    fn sampled_workspace_forwards_commands() {
        let live = InMemoryWorkspace::with_status(BEHIND);
        let sampled = SampledWorkspace::new(Arc::new(live.clone()), WorkspaceObserver::new());
        let target = console();

        sampled.activate(&target).unwrap();
        sampled.terminate(&target).unwrap();
        sampled.open_application("com.example.parent").unwrap();
        sampled.beep();
        assert_eq!(
            live.calls(),
            vec![
                WorkspaceCall::Activate("com.apple.Console".into()),
                WorkspaceCall::Terminate("com.apple.Console".into()),
                WorkspaceCall::Open("com.example.parent".into()),
                WorkspaceCall::Beep,
            ]
        );
    }

    #[test]
    fn clones_share_subscriptions() {
        let observer = WorkspaceObserver::new();
        let clone = observer.clone();
        clone.add_observer(Terminate);
        assert!(observer.is_subscribed(Terminate));
    }
}
