use anyhow::Context;
use clap::Parser;
use consolewatch::cli::{Cli, Command};
use consolewatch::preferences::PreferenceWatcher;
use consolewatch::signals::{SignalEvent, wait_for_signal};
use consolewatch::{load_config, logging};
use flume::bounded;
use platform::{AlertPresenter, ChildLauncher, LaunchAgentRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use watcher::run_mode::RunModeController;

const APP_NAME: &str = "Console Watch";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.common.verbosity, cli.common.logfile.as_deref())?;

    debug!(config = ?cli);

    let config = load_config(cli.common.conffile.as_deref())?;
    let store = config.preferences.store()?;

    if let Some(Command::LoginItem { state }) = cli.command {
        store.set_run_at_login(state.enabled())?;
        info!(run_at_login = state.enabled(), path = %store.path().display(), "preference saved");
        return Ok(());
    }

    let helper_args = cli.common.helper_args();
    let launcher = ChildLauncher::from_config(&config.helper)?.args(helper_args.clone());
    let program = std::iter::once(launcher.executable().as_os_str())
        .chain(helper_args.iter().map(|arg| arg.as_os_str()))
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let agents_dir = config
        .helper
        .launch_agents_dir()
        .context("could not determine the LaunchAgents directory")?;
    let registry = LaunchAgentRegistry::new(&config.helper.login_item_label, program, agents_dir);

    let mut preferences = PreferenceWatcher::new(store, config.preferences.poll_interval);
    let mut run_mode = RunModeController::new(
        preferences.current(),
        Box::new(launcher),
        Box::new(registry),
        Box::new(AlertPresenter::new(APP_NAME)),
    );
    run_mode.start();

    let cancel = CancellationToken::new();
    let (prefs_tx, prefs_rx) = bounded(8);
    let prefs_task = preferences.spawn(prefs_tx, cancel.clone());

    let (signal_tx, signal_rx) = bounded(8);
    tokio::spawn(async move {
        if let Err(err) = wait_for_signal(&signal_tx).await {
            error!(error = ?err, "Error while waiting for signal");
        }
    });

    loop {
        tokio::select! {
            res = prefs_rx.recv_async() => {
                let Ok(enabled) = res else { break };
                run_mode.set_run_as_login_item(enabled);
            }
            res = signal_rx.recv_async() => {
                let event = res?;
                debug!(?event, "Received signal event");
                match event {
                    SignalEvent::DumpState => info!(
                        run_as_login_item = run_mode.run_as_login_item(),
                        helper_pid = ?run_mode.manual_helper_pid(),
                        "run mode"
                    ),
                    SignalEvent::Shutdown => break,
                }
            }
        }
    }

    cancel.cancel();
    run_mode.shutdown();
    prefs_task.await?;
    Ok(())
}
