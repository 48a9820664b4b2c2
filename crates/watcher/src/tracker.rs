#![forbid(unsafe_code)]

use crate::domain::{ActivationEdge, TargetIdentity, WorkspaceEvent, WorkspaceEventKind};
use crate::workspace::{NotificationCenter, Workspace, is_backgrounded};
use tracing::{debug, trace};

/// The two mutually exclusive sets of notifications the tracker listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchGroup {
    /// Waiting for the target to be hidden or deactivated.
    BackgroundEntry,
    /// Waiting for the target to be activated, unhidden or quit.
    BackgroundExit,
}

impl WatchGroup {
    pub const fn kinds(self) -> &'static [WorkspaceEventKind] {
        match self {
            Self::BackgroundEntry => &[WorkspaceEventKind::Hide, WorkspaceEventKind::Deactivate],
            Self::BackgroundExit => &[
                WorkspaceEventKind::Activate,
                WorkspaceEventKind::Unhide,
                WorkspaceEventKind::Terminate,
            ],
        }
    }

    /// The edge reported when a notification of this group arrives.
    pub const fn edge(self) -> ActivationEdge {
        match self {
            Self::BackgroundEntry => ActivationEdge::WentBackground,
            Self::BackgroundExit => ActivationEdge::LeftBackgroundOrQuit,
        }
    }

    pub const fn next(self) -> Self {
        match self {
            Self::BackgroundEntry => Self::BackgroundExit,
            Self::BackgroundExit => Self::BackgroundEntry,
        }
    }

    pub fn contains(self, kind: WorkspaceEventKind) -> bool {
        self.kinds().contains(&kind)
    }
}

/// Turns raw workspace notifications into background entry/exit edges for
/// the target.
///
/// Once started it is subscribed to exactly one [`WatchGroup`] and flips to
/// the other one every time it reports an edge.
pub struct ActivationTracker {
    target: TargetIdentity,
    center: Box<dyn NotificationCenter>,
    group: Option<WatchGroup>,
}

impl ActivationTracker {
    pub fn new(target: TargetIdentity, center: Box<dyn NotificationCenter>) -> Self {
        Self {
            target,
            center,
            group: None,
        }
    }

    /// Looks at the target as it is right now. A target that already runs in
    /// the background is reported straight away.
    pub fn start(&mut self, workspace: &dyn Workspace) -> Option<ActivationEdge> {
        if is_backgrounded(workspace, &self.target) {
            debug!(app = %self.target, "target already in the background");
            self.switch_to(WatchGroup::BackgroundExit);
            Some(ActivationEdge::WentBackground)
        } else {
            self.switch_to(WatchGroup::BackgroundEntry);
            None
        }
    }

    pub fn handle(&mut self, event: &WorkspaceEvent) -> Option<ActivationEdge> {
        let group = self.group?;
        if !self.target.matches(&event.bundle_id) || !group.contains(event.kind) {
            trace!(?event, ?group, "ignoring workspace event");
            return None;
        }

        self.switch_to(group.next());
        let edge = group.edge();
        debug!(kind = %event.kind, ?edge, "target changed background residency");
        Some(edge)
    }

    /// Back to waiting for the target to enter the background.
    pub fn rearm(&mut self) {
        self.switch_to(WatchGroup::BackgroundEntry);
    }

    /// Drops every subscription.
    pub fn stop(&mut self) {
        if let Some(group) = self.group.take() {
            for kind in group.kinds() {
                self.center.remove_observer(*kind);
            }
        }
    }

    pub fn group(&self) -> Option<WatchGroup> {
        self.group
    }

    fn switch_to(&mut self, group: WatchGroup) {
        if self.group == Some(group) {
            return;
        }
        self.stop();
        for kind in group.kinds() {
            self.center.add_observer(*kind);
        }
        self.group = Some(group);
    }
}

impl Drop for ActivationTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AppStatus;
    use crate::memory::{InMemoryWorkspace, RecordingCenter};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    const CONSOLE: &str = "com.apple.Console";

    fn target() -> TargetIdentity {
        TargetIdentity::new(CONSOLE, "Console")
    }

    fn kinds(group: WatchGroup) -> BTreeSet<WorkspaceEventKind> {
        group.kinds().iter().copied().collect()
    }

    fn background() -> AppStatus {
        AppStatus {
            frontmost: false,
            hidden: true,
        }
    }

    #[test]
    fn not_running_subscribes_background_entry() {
        let center = RecordingCenter::default();
        let mut tracker = ActivationTracker::new(target(), Box::new(center.clone()));

        let edge = tracker.start(&InMemoryWorkspace::default());

        assert_eq!(edge, None);
        assert_eq!(tracker.group(), Some(WatchGroup::BackgroundEntry));
        assert_eq!(center.observed(), kinds(WatchGroup::BackgroundEntry));
    }

    #[test]
    fn already_backgrounded_reports_immediately() {
        let center = RecordingCenter::default();
        let workspace = InMemoryWorkspace::with_status(background());
        let mut tracker = ActivationTracker::new(target(), Box::new(center.clone()));

        let edge = tracker.start(&workspace);

        assert_eq!(edge, Some(ActivationEdge::WentBackground));
        assert_eq!(center.observed(), kinds(WatchGroup::BackgroundExit));
    }

    #[test]
    fn frontmost_target_waits_for_background_entry() {
        let workspace = InMemoryWorkspace::with_status(AppStatus {
            frontmost: true,
            hidden: false,
        });
        let mut tracker = ActivationTracker::new(target(), Box::new(RecordingCenter::default()));

        assert_eq!(tracker.start(&workspace), None);
        assert_eq!(tracker.group(), Some(WatchGroup::BackgroundEntry));
    }

    #[test]
    fn other_applications_are_ignored() {
        let center = RecordingCenter::default();
        let mut tracker = ActivationTracker::new(target(), Box::new(center.clone()));
        tracker.start(&InMemoryWorkspace::default());

        let event = WorkspaceEvent::new(WorkspaceEventKind::Hide, "com.apple.Safari");
        assert_eq!(tracker.handle(&event), None);
        assert_eq!(center.observed(), kinds(WatchGroup::BackgroundEntry));
    }

    #[test]
    fn events_outside_the_current_group_are_ignored() {
        let mut tracker = ActivationTracker::new(target(), Box::new(RecordingCenter::default()));
        tracker.start(&InMemoryWorkspace::default());

        let event = WorkspaceEvent::new(WorkspaceEventKind::Activate, CONSOLE);
        assert_eq!(tracker.handle(&event), None);
        assert_eq!(tracker.group(), Some(WatchGroup::BackgroundEntry));
    }

    #[test]
    fn hide_then_activate_cycles_groups() {
        let center = RecordingCenter::default();
        let mut tracker = ActivationTracker::new(target(), Box::new(center.clone()));
        tracker.start(&InMemoryWorkspace::default());

        let hide = WorkspaceEvent::new(WorkspaceEventKind::Hide, CONSOLE);
        assert_eq!(tracker.handle(&hide), Some(ActivationEdge::WentBackground));
        assert_eq!(center.observed(), kinds(WatchGroup::BackgroundExit));

        let activate = WorkspaceEvent::new(WorkspaceEventKind::Activate, CONSOLE);
        assert_eq!(
            tracker.handle(&activate),
            Some(ActivationEdge::LeftBackgroundOrQuit)
        );
        assert_eq!(center.observed(), kinds(WatchGroup::BackgroundEntry));
    }

    #[test]
    fn stop_unsubscribes_everything() {
        let center = RecordingCenter::default();
        let mut tracker = ActivationTracker::new(target(), Box::new(center.clone()));
        tracker.start(&InMemoryWorkspace::default());

        tracker.stop();

        assert!(center.observed().is_empty());
        assert_eq!(tracker.group(), None);
        let hide = WorkspaceEvent::new(WorkspaceEventKind::Hide, CONSOLE);
        assert_eq!(tracker.handle(&hide), None);
    }

    #[test]
    fn dropping_the_tracker_unsubscribes() {
        let center = RecordingCenter::default();
        {
            let mut tracker = ActivationTracker::new(target(), Box::new(center.clone()));
            tracker.start(&InMemoryWorkspace::with_status(background()));
        }
        assert!(center.observed().is_empty());
    }

    fn any_event() -> impl Strategy<Value = WorkspaceEvent> {
        let kind = proptest::sample::select(WorkspaceEventKind::ALL.to_vec());
        let bundle = prop_oneof![Just(CONSOLE), Just("com.apple.Safari")];
        (kind, bundle).prop_map(|(kind, bundle)| WorkspaceEvent::new(kind, bundle))
    }

    proptest! {
        #[test]
        fn always_subscribed_to_exactly_one_group(
            backgrounded in any::<bool>(),
            events in proptest::collection::vec(any_event(), 0..64),
            rearm_at in proptest::option::of(0usize..64),
        ) {
            let center = RecordingCenter::default();
            let workspace = if backgrounded {
                InMemoryWorkspace::with_status(background())
            } else {
                InMemoryWorkspace::default()
            };
            let mut tracker = ActivationTracker::new(target(), Box::new(center.clone()));
            tracker.start(&workspace);

            for (i, event) in events.iter().enumerate() {
                if rearm_at == Some(i) {
                    tracker.rearm();
                }
                let before = tracker.group().unwrap();
                let edge = tracker.handle(event);
                let after = tracker.group().unwrap();

                let observed = center.observed();
                prop_assert!(
                    observed == kinds(WatchGroup::BackgroundEntry)
                        || observed == kinds(WatchGroup::BackgroundExit)
                );
                prop_assert_eq!(observed, kinds(after));
                prop_assert_eq!(edge.is_some(), before != after);
                prop_assert!(center.max_duplicate_subscriptions() <= 1);
            }
        }
    }
}
