use std::sync::Arc;
use std::time::Duration;

use campus_health_store::audit::AuditLogger;
use campus_health_store::config::{self, StoreConfig};
use campus_health_store::db::watch::ConfigsListener;
use campus_health_store::db::{collection_sizes, count_collections};
use campus_health_store::models::Configs;
use campus_health_store::Storage;

struct LogConfigsChanges;

impl ConfigsListener for LogConfigsChanges {
    fn on_configs_changed(&self, configs: &Configs) {
        tracing::info!(
            settings = configs.settings.len(),
            revision = %configs.revision(),
            "Configuration reloaded"
        );
    }
}

/// Hand buffered audit entries to the log. Stands in for the downstream
/// audit writer.
fn flush_audit(audit: &AuditLogger) {
    for entry in audit.drain() {
        tracing::info!(
            target: "audit",
            at = %entry.timestamp,
            action = %entry.action,
            entity = %entry.entity,
            entity_id = %entry.entity_id,
            "Audit"
        );
    }
}

async fn run_audit_flusher(audit: Arc<AuditLogger>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        flush_audit(&audit);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    campus_health_store::init_logging();
    tracing::info!("Health store starting v{}", config::APP_VERSION);

    let config = StoreConfig::from_env()?;
    let audit = Arc::new(AuditLogger::new());
    let storage = Storage::open(config, audit.clone())?;

    let conn = storage.open_db()?;
    tracing::info!(collections = count_collections(&conn)?, "Schema ready");
    for (collection, documents) in collection_sizes(&conn)? {
        tracing::debug!(collection, documents, "Collection");
    }
    drop(conn);

    let watcher = storage.configs_watcher().spawn(Arc::new(LogConfigsChanges));
    let flusher = tokio::spawn(run_audit_flusher(
        audit.clone(),
        storage.config().config_watch_interval,
    ));
    tokio::signal::ctrl_c().await?;
    watcher.abort();
    flusher.abort();
    flush_audit(&audit);
    tracing::info!("Health store stopped");
    Ok(())
}
