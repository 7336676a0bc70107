use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-UIN override of the testing interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UinOverride {
    pub id: String,
    pub uin: String,
    pub interval: i32,
    pub category: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(UinOverride, "uinoverrides", "UINOverride");

impl UinOverride {
    pub fn new(uin: &str, interval: i32, category: Option<&str>, expiration: Option<DateTime<Utc>>) -> Self {
        Self {
            id: String::new(),
            uin: uin.into(),
            interval,
            category: category.map(Into::into),
            expiration,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppVersion {
    pub id: String,
    pub version: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(AppVersion, "appversions", "AppVersion");

/// Well-known id of the single configuration document.
pub const CONFIGS_ID: &str = "configs";

/// Service-wide settings consumed by collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configs {
    pub id: String,
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
    /// Bumped by every save.
    #[serde(default)]
    pub version: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(Configs, "configs", "Configs");

impl Configs {
    /// Change marker observed by the configs watcher.
    pub fn revision(&self) -> u64 {
        self.version
    }
}
