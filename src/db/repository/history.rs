use rusqlite::Connection;

use crate::db::{Collection, DatabaseError, Filter, FindOptions, IndexSpec, Sort};
use crate::models::{EHistory, EStatus};

pub(super) const INDEXES: &[IndexSpec] = &[
    IndexSpec::new("ehistory", "user_id"),
    IndexSpec::new("estatus", "user_id"),
    IndexSpec::new("estatus", "app_version"),
];

// ═══════════════════════════════════════════
// History
// ═══════════════════════════════════════════

/// A user's history, newest event first.
pub fn find_history_by_user(conn: &Connection, user_id: &str) -> Result<Vec<EHistory>, DatabaseError> {
    super::find_many(
        conn,
        &Filter::eq("user_id", user_id),
        &FindOptions::sorted(Sort::desc("date")),
    )
}

pub fn delete_history_by_user(conn: &Connection, user_id: &str) -> Result<usize, DatabaseError> {
    Collection::<EHistory>::new().delete_many(conn, &Filter::eq("user_id", user_id))
}

// ═══════════════════════════════════════════
// Cached statuses
// ═══════════════════════════════════════════

pub fn find_statuses_by_user(conn: &Connection, user_id: &str) -> Result<Vec<EStatus>, DatabaseError> {
    super::find_many(conn, &Filter::eq("user_id", user_id), &FindOptions::default())
}

/// The cached status for a user under one app version (`None` matches
/// statuses stored without a version).
pub fn find_status(
    conn: &Connection,
    user_id: &str,
    app_version: Option<&str>,
) -> Result<Option<EStatus>, DatabaseError> {
    super::find_one(
        conn,
        &Filter::eq("user_id", user_id).and(Filter::eq("app_version", app_version)),
    )
}

/// Store a freshly computed status, replacing any previous one for the same
/// (user, app version) pair.
pub fn upsert_status(conn: &Connection, mut status: EStatus) -> Result<EStatus, DatabaseError> {
    match find_status(conn, &status.user_id, status.app_version.as_deref())? {
        Some(existing) => {
            status.id = existing.id;
            status.date_created = existing.date_created;
            super::save(conn, &mut status)?;
            Ok(status)
        }
        None => {
            status.id.clear();
            super::create(conn, status)
        }
    }
}
