//! Coordinated store operations.
//!
//! `Storage` is the entry point request handlers use. It holds no
//! connection: every call opens one against the configured database, so
//! the facade is `Send + Sync` and stateless between calls. Operations
//! that touch one unreferenced document go straight to the repository;
//! everything that validates references, spans collections or
//! invalidates cached statuses runs inside one transaction. Committed
//! mutations are reported to the audit sink.

mod content;
mod county;
mod policy;
mod provider;
mod test_type;
mod testing;
mod user;

pub use user::ErasedUserData;

use std::sync::Arc;

use rusqlite::{Connection, Transaction};
use tokio::sync::Notify;

use crate::audit::{AuditEntry, AuditSink};
use crate::config::StoreConfig;
use crate::db::watch::ConfigsWatcher;
use crate::db::{self, run_in_transaction, DatabaseError};

pub struct Storage {
    config: StoreConfig,
    audit: Arc<dyn AuditSink>,
    configs_changed: Arc<Notify>,
}

impl Storage {
    /// Open the store, creating the database, collections and indexes if
    /// they do not exist yet.
    pub fn open(config: StoreConfig, audit: Arc<dyn AuditSink>) -> Result<Self, DatabaseError> {
        db::open_database(&config.database_path, config.operation_timeout)?;
        tracing::info!(path = %config.database_path.display(), "Store opened");
        Ok(Self {
            config,
            audit,
            configs_changed: Arc::new(Notify::new()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open a connection for one operation.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_database(&self.config.database_path, self.config.operation_timeout)
    }

    /// A watcher over the configs collection, woken by this facade's
    /// configs writes and polling for everyone else's.
    pub fn configs_watcher(&self) -> ConfigsWatcher {
        ConfigsWatcher::new(
            self.config.database_path.clone(),
            self.config.operation_timeout,
            self.config.config_watch_interval,
            self.configs_changed.clone(),
        )
    }

    fn write<T, F>(&self, operation: &str, steps: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, DatabaseError>,
    {
        let mut conn = self.open_db()?;
        run_in_transaction(&mut conn, operation, steps)
    }

    fn record(&self, action: &str, entity: &str, entity_id: &str) {
        self.audit.record(AuditEntry {
            timestamp: chrono::Utc::now(),
            action: action.into(),
            entity: entity.into(),
            entity_id: entity_id.into(),
        });
    }
}
