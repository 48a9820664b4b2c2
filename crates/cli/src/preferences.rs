use config::PreferenceStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls the preferences file and reports every change of `run_at_login`.
#[derive(Debug, Clone)]
pub struct PreferenceWatcher {
    store: PreferenceStore,
    interval: Duration,
    last: Option<bool>,
}

impl PreferenceWatcher {
    pub fn new(store: PreferenceStore, interval: Duration) -> Self {
        Self {
            store,
            interval,
            last: None,
        }
    }

    /// Reads the current value once. Read errors are logged and treated as
    /// "off".
    pub fn current(&mut self) -> bool {
        let enabled = self.read().unwrap_or(false);
        self.last = Some(enabled);
        enabled
    }

    /// The new value when it differs from the last one seen. A read error
    /// keeps the last value.
    pub fn poll(&mut self) -> Option<bool> {
        let enabled = self.read()?;
        if self.last == Some(enabled) {
            return None;
        }
        self.last = Some(enabled);
        Some(enabled)
    }

    fn read(&self) -> Option<bool> {
        match self.store.run_at_login() {
            Ok(enabled) => Some(enabled),
            Err(err) => {
                warn!(%err, path = %self.store.path().display(), "could not read preferences");
                None
            }
        }
    }

    /// Polls until `cancel` fires or the receiver goes away.
    pub fn spawn(mut self, changes: flume::Sender<bool>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                if let Some(enabled) = self.poll() {
                    info!(run_at_login = enabled, "preference changed");
                    if changes.send_async(enabled).await.is_err() {
                        break;
                    }
                }
            }
            debug!("preference watcher stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn watcher(dir: &tempfile::TempDir) -> (PreferenceWatcher, PreferenceStore) {
        let store = PreferenceStore::new(dir.path().join("prefs.toml"));
        (
            PreferenceWatcher::new(store.clone(), Duration::from_secs(1)),
            store,
        )
    }

    #[test]
    fn missing_file_means_off() {
        let dir = tempfile::tempdir().unwrap();
        let (mut watcher, _) = watcher(&dir);
        assert!(!watcher.current());
        assert_eq!(watcher.poll(), None);
    }

    #[test]
    fn only_changes_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (mut watcher, store) = watcher(&dir);
        assert_eq!(watcher.poll(), Some(false));

        store.set_run_at_login(true).unwrap();
        assert_eq!(watcher.poll(), Some(true));
        assert_eq!(watcher.poll(), None);

        store.set_run_at_login(false).unwrap();
        assert_eq!(watcher.poll(), Some(false));
    }

    #[test]
    fn unreadable_file_keeps_last_value() {
        let dir = tempfile::tempdir().unwrap();
        let (mut watcher, store) = watcher(&dir);
        store.set_run_at_login(true).unwrap();
        assert!(watcher.current());

        fs::write(store.path(), "run_at_login = [").unwrap();
        assert_eq!(watcher.poll(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_watcher_sends_changes() {
        let dir = tempfile::tempdir().unwrap();
        let (mut watcher, store) = watcher(&dir);
        watcher.current();
        let (tx, rx) = flume::unbounded();
        let cancel = CancellationToken::new();
        let handle = watcher.spawn(tx, cancel.clone());

        store.set_run_at_login(true).unwrap();
        assert_eq!(rx.recv_async().await, Ok(true));

        cancel.cancel();
        handle.await.unwrap();
        assert!(rx.is_empty());
    }
}
