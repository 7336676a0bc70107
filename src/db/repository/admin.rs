use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::{DatabaseError, Filter, FindOptions, IndexSpec, Sort};
use crate::models::{AppVersion, Configs, UinOverride, CONFIGS_ID};

pub(super) const INDEXES: &[IndexSpec] = &[
    IndexSpec::unique("uinoverrides", "uin"),
    IndexSpec::unique("appversions", "version"),
];

// ═══════════════════════════════════════════
// UIN overrides
// ═══════════════════════════════════════════

pub fn find_uin_overrides(conn: &Connection) -> Result<Vec<UinOverride>, DatabaseError> {
    super::find_many(conn, &Filter::All, &FindOptions::sorted(Sort::asc("uin")))
}

pub fn find_uin_override(conn: &Connection, uin: &str) -> Result<Option<UinOverride>, DatabaseError> {
    super::find_one(conn, &Filter::eq("uin", uin))
}

/// Create the override for `uin` or update the existing one in place.
pub fn upsert_uin_override(
    conn: &Connection,
    uin: &str,
    interval: i32,
    category: Option<&str>,
    expiration: Option<DateTime<Utc>>,
) -> Result<UinOverride, DatabaseError> {
    match find_uin_override(conn, uin)? {
        Some(mut existing) => {
            existing.interval = interval;
            existing.category = category.map(Into::into);
            existing.expiration = expiration;
            super::save(conn, &mut existing)?;
            Ok(existing)
        }
        None => super::create(conn, UinOverride::new(uin, interval, category, expiration)),
    }
}

pub fn delete_uin_override(conn: &Connection, uin: &str) -> Result<(), DatabaseError> {
    let existing = find_uin_override(conn, uin)?
        .ok_or_else(|| DatabaseError::not_found("UINOverride", uin))?;
    super::delete::<UinOverride>(conn, &existing.id)
}

// ═══════════════════════════════════════════
// App versions
// ═══════════════════════════════════════════

pub fn find_app_versions(conn: &Connection) -> Result<Vec<AppVersion>, DatabaseError> {
    super::find_many(conn, &Filter::All, &FindOptions::sorted(Sort::asc("date_created")))
}

/// Register a client version. Registering a known version is `DuplicateKey`.
pub fn create_app_version(conn: &Connection, version: &str) -> Result<AppVersion, DatabaseError> {
    if version.trim().is_empty() {
        return Err(DatabaseError::Validation("app version must not be empty".into()));
    }
    super::create(
        conn,
        AppVersion {
            id: String::new(),
            version: version.trim().into(),
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        },
    )
}

// ═══════════════════════════════════════════
// Configs
// ═══════════════════════════════════════════

pub fn find_configs(conn: &Connection) -> Result<Option<Configs>, DatabaseError> {
    super::find_one(conn, &Filter::id(CONFIGS_ID))
}

/// Replace the settings document, creating it under its well-known id on
/// first write.
pub fn save_configs(
    conn: &Connection,
    settings: std::collections::BTreeMap<String, serde_json::Value>,
) -> Result<Configs, DatabaseError> {
    match find_configs(conn)? {
        Some(mut configs) => {
            configs.settings = settings;
            configs.version += 1;
            super::save(conn, &mut configs)?;
            Ok(configs)
        }
        None => super::create(
            conn,
            Configs {
                id: CONFIGS_ID.into(),
                settings,
                version: 1,
                date_created: DateTime::<Utc>::UNIX_EPOCH,
                date_updated: None,
            },
        ),
    }
}
