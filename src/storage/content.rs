use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::Storage;
use crate::db::{repository, DatabaseError};
use crate::models::{AppVersion, Configs, Faq, News, Resource, UinOverride};

impl Storage {
    // ── Resources ───────────────────────────────────────────

    pub fn create_resource(&self, resource: Resource) -> Result<Resource, DatabaseError> {
        let resource = repository::create(&self.open_db()?, resource)?;
        self.record("create_resource", "resources", &resource.id);
        Ok(resource)
    }

    pub fn find_resources(&self) -> Result<Vec<Resource>, DatabaseError> {
        repository::find_resources(&self.open_db()?)
    }

    pub fn save_resource(&self, resource: &mut Resource) -> Result<(), DatabaseError> {
        repository::save(&self.open_db()?, resource)?;
        self.record("save_resource", "resources", &resource.id);
        Ok(())
    }

    pub fn delete_resource(&self, id: &str) -> Result<(), DatabaseError> {
        repository::delete::<Resource>(&self.open_db()?, id)?;
        self.record("delete_resource", "resources", id);
        Ok(())
    }

    /// Reorder all listed resources in one transaction; an unknown id
    /// leaves the previous order intact.
    pub fn reorder_resources(&self, ids: &[String]) -> Result<(), DatabaseError> {
        self.write("reorder_resources", |tx| repository::reorder_resources(tx, ids))?;
        self.record("reorder_resources", "resources", "*");
        Ok(())
    }

    // ── FAQ and news ────────────────────────────────────────

    pub fn find_faq(&self) -> Result<Option<Faq>, DatabaseError> {
        repository::find_faq(&self.open_db()?)
    }

    pub fn save_faq(&self, faq: Faq) -> Result<Faq, DatabaseError> {
        let faq = self.write("save_faq", |tx| repository::save_faq(tx, faq))?;
        self.record("save_faq", "faq", &faq.id);
        Ok(faq)
    }

    pub fn create_news(&self, news: News) -> Result<News, DatabaseError> {
        let news = repository::create(&self.open_db()?, news)?;
        self.record("create_news", "news", &news.id);
        Ok(news)
    }

    pub fn find_news(&self, limit: Option<u32>) -> Result<Vec<News>, DatabaseError> {
        repository::find_news(&self.open_db()?, limit)
    }

    pub fn delete_news(&self, id: &str) -> Result<(), DatabaseError> {
        repository::delete::<News>(&self.open_db()?, id)?;
        self.record("delete_news", "news", id);
        Ok(())
    }

    // ── Administration ──────────────────────────────────────

    pub fn upsert_uin_override(
        &self,
        uin: &str,
        interval: i32,
        category: Option<&str>,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<UinOverride, DatabaseError> {
        let entry = self.write("upsert_uin_override", |tx| {
            repository::upsert_uin_override(tx, uin, interval, category, expiration)
        })?;
        self.record("upsert_uin_override", "uinoverrides", &entry.id);
        Ok(entry)
    }

    pub fn find_uin_override(&self, uin: &str) -> Result<Option<UinOverride>, DatabaseError> {
        repository::find_uin_override(&self.open_db()?, uin)
    }

    pub fn find_uin_overrides(&self) -> Result<Vec<UinOverride>, DatabaseError> {
        repository::find_uin_overrides(&self.open_db()?)
    }

    pub fn delete_uin_override(&self, uin: &str) -> Result<(), DatabaseError> {
        repository::delete_uin_override(&self.open_db()?, uin)?;
        self.record("delete_uin_override", "uinoverrides", uin);
        Ok(())
    }

    pub fn create_app_version(&self, version: &str) -> Result<AppVersion, DatabaseError> {
        let version = repository::create_app_version(&self.open_db()?, version)?;
        self.record("create_app_version", "appversions", &version.id);
        Ok(version)
    }

    pub fn find_app_versions(&self) -> Result<Vec<AppVersion>, DatabaseError> {
        repository::find_app_versions(&self.open_db()?)
    }

    pub fn find_configs(&self) -> Result<Option<Configs>, DatabaseError> {
        repository::find_configs(&self.open_db()?)
    }

    /// Replace the settings and wake the configs watcher.
    pub fn save_configs(&self, settings: BTreeMap<String, serde_json::Value>) -> Result<Configs, DatabaseError> {
        let configs = self.write("save_configs", |tx| repository::save_configs(tx, settings))?;
        self.configs_changed.notify_one();
        self.record("save_configs", "configs", &configs.id);
        Ok(configs)
    }
}
