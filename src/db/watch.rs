//! Change notification for the `configs` collection.
//!
//! SQLite has no change streams, so the watcher observes the configs
//! revision instead: it wakes when a local write nudges its `Notify`, and
//! on a polling interval to catch writes from other processes. The listener
//! is called only when the revision moved. Failures are logged and the
//! watcher keeps going.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::repository::find_configs;
use super::sqlite::open_database;
use super::DatabaseError;
use crate::models::Configs;

/// Receives configuration changes. Implementations must not block.
pub trait ConfigsListener: Send + Sync {
    fn on_configs_changed(&self, configs: &Configs);
}

pub struct ConfigsWatcher {
    database_path: PathBuf,
    timeout: Duration,
    interval: Duration,
    notify: Arc<Notify>,
}

impl ConfigsWatcher {
    pub fn new(database_path: PathBuf, timeout: Duration, interval: Duration, notify: Arc<Notify>) -> Self {
        Self {
            database_path,
            timeout,
            interval,
            notify,
        }
    }

    /// Start watching on the current tokio runtime. The revision present at
    /// start is the baseline and is not reported.
    pub fn spawn(self, listener: Arc<dyn ConfigsListener>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(listener).await })
    }

    async fn run(self, listener: Arc<dyn ConfigsListener>) {
        let mut last_seen = match self.read().await {
            Ok(configs) => configs.map(|c| c.revision()),
            Err(e) => {
                tracing::warn!(error = %e, "Configs watcher could not read baseline");
                None
            }
        };
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = ticker.tick() => {}
            }
            match self.read().await {
                Ok(Some(configs)) => {
                    let revision = configs.revision();
                    if changed(last_seen, revision) {
                        last_seen = Some(revision);
                        tracing::info!(revision = %revision, "Configs changed");
                        listener.on_configs_changed(&configs);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Configs watcher poll failed"),
            }
        }
    }

    async fn read(&self) -> Result<Option<Configs>, DatabaseError> {
        let path = self.database_path.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || {
            let conn = open_database(&path, timeout)?;
            find_configs(&conn)
        })
        .await
        .map_err(|e| DatabaseError::StoreUnavailable(format!("configs watcher task failed: {e}")))?
    }
}

fn changed(last_seen: Option<u64>, revision: u64) -> bool {
    last_seen.map_or(true, |seen| revision > seen)
}
