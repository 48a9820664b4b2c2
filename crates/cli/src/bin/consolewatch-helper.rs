use clap::Parser;
use consolewatch::cli::HelperCli;
use consolewatch::signals::{SignalEvent, wait_for_signal};
use consolewatch::{load_config, logging};
use flume::{bounded, unbounded};
use platform::{AlertNotifier, SampledWorkspace, SystemWorkspace, WorkspaceObserver};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use watcher::clock::SystemClock;
use watcher::domain::TargetIdentity;
use watcher::notifier::NotificationRequest;
use watcher::timer::TokioTimer;
use watcher::workspace::Workspace;
use watcher::{ActivationTracker, BackgroundMonitor, ControlEvent, IntervalSchedule, WatchController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = HelperCli::parse();
    logging::init(&cli.common.verbosity, cli.common.logfile.as_deref())?;

    debug!(config = ?cli);

    let config = load_config(cli.common.conffile.as_deref())?;
    let target = TargetIdentity::from(&config.target);
    let (events_tx, events_rx) = unbounded();

    let live: Arc<dyn Workspace> = Arc::new(SystemWorkspace::new());
    let observer = WorkspaceObserver::new();
    observer.prime(&live, &target).await;
    let workspace: Arc<dyn Workspace> =
        Arc::new(SampledWorkspace::new(Arc::clone(&live), observer.clone()));
    let tracker = ActivationTracker::new(target.clone(), Box::new(observer.clone()));
    let timer = TokioTimer::new(Arc::new(SystemClock), events_tx.clone());
    let monitor = BackgroundMonitor::new(
        target.clone(),
        Arc::clone(&workspace),
        tracker,
        Box::new(timer),
        IntervalSchedule::from(&config.schedule),
    )
    .reset_on_resume(config.schedule.reset_on_resume);
    let mut controller = WatchController::new(
        monitor,
        Box::new(AlertNotifier::new(events_tx.clone())),
        Arc::clone(&workspace),
        events_tx.clone(),
        NotificationRequest::warning(&config.notification),
        config.helper.parent_bundle_id.clone(),
    );

    let cancel = CancellationToken::new();
    let observer_task = observer.spawn(
        live,
        target,
        config.workspace.poll_interval,
        events_tx.clone(),
        cancel.clone(),
    );

    let (signal_tx, signal_rx) = bounded(8);
    tokio::spawn(async move {
        if let Err(err) = wait_for_signal(&signal_tx).await {
            error!(error = ?err, "Error while waiting for signal");
        }
    });
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        while let Ok(event) = signal_rx.recv_async().await {
            debug!(?event, "Received signal event");
            match event {
                SignalEvent::DumpState => {
                    if events_tx.send_async(ControlEvent::DumpState).await.is_err() {
                        break;
                    }
                }
                SignalEvent::Shutdown => {
                    signal_cancel.cancel();
                    break;
                }
            }
        }
    });

    controller.run_until(cancel.clone(), events_rx).await?;
    cancel.cancel();
    observer_task.await?;
    Ok(())
}
