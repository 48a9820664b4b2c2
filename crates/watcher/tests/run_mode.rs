#![forbid(unsafe_code)]

use pretty_assertions::assert_eq;
use watcher::Error;
use watcher::memory::{HelperCall, RecordingHelperHost};
use watcher::run_mode::RunModeController;

fn controller(host: &RecordingHelperHost, run_as_login_item: bool) -> RunModeController {
    RunModeController::new(
        run_as_login_item,
        Box::new(host.clone()),
        Box::new(host.clone()),
        Box::new(host.clone()),
    )
}

#[test]
fn manual_mode_unregisters_then_launches() {
    let host = RecordingHelperHost::default();
    let mut controller = controller(&host, false);

    controller.start();

    assert_eq!(
        host.calls(),
        vec![HelperCall::SetLoginItem(false), HelperCall::Launch]
    );
    assert_eq!(controller.manual_helper_pid(), Some(1));
}

#[test]
fn login_item_mode_stops_manual_helper_first() {
    let host = RecordingHelperHost::default();
    let mut controller = controller(&host, false);
    controller.start();

    controller.set_run_as_login_item(true);

    assert_eq!(
        host.calls(),
        vec![
            HelperCall::SetLoginItem(false),
            HelperCall::Launch,
            HelperCall::Terminate(1),
            HelperCall::SetLoginItem(true),
        ]
    );
    assert!(!controller.has_manual_helper());
    assert!(host.running().is_empty());
}

#[test]
fn relaunch_replaces_previous_helper() {
    let host = RecordingHelperHost::default();
    let mut controller = controller(&host, false);
    controller.start();

    controller.set_run_as_login_item(false);

    assert_eq!(controller.manual_helper_pid(), Some(2));
    assert_eq!(host.running().into_iter().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn registration_failure_is_presented_and_nothing_launches() {
    let host = RecordingHelperHost::default();
    host.fail_registration(true);
    let mut controller = controller(&host, false);

    controller.start();

    assert_eq!(host.calls(), vec![HelperCall::SetLoginItem(false)]);
    assert!(matches!(
        host.presented().as_slice(),
        [Error::RegistrationFailed { enabled: false, .. }]
    ));
    assert!(!controller.has_manual_helper());
}

#[test]
fn launch_failure_is_presented_once() {
    let host = RecordingHelperHost::default();
    host.fail_launch(true);
    let mut controller = controller(&host, false);

    controller.start();

    assert_eq!(
        host.calls(),
        vec![HelperCall::SetLoginItem(false), HelperCall::Launch]
    );
    assert!(matches!(host.presented().as_slice(), [Error::LaunchFailed(_)]));
}

#[test]
fn shutdown_stops_manual_helper() {
    let host = RecordingHelperHost::default();
    let mut controller = controller(&host, false);
    controller.start();

    controller.shutdown();

    assert!(host.running().is_empty());
    assert!(!controller.run_as_login_item());
}
