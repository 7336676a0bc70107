use rusqlite::Connection;

use crate::db::{Collection, DatabaseError, Filter, FindOptions, IndexSpec, Sort, UpdateOps};
use crate::models::{now, CTest};

pub(super) const INDEXES: &[IndexSpec] = &[
    IndexSpec::new("ctests", "provider_id"),
    IndexSpec::new("ctests", "user_id"),
    IndexSpec::new("ctests", "order_number"),
];

/// A user's lab results, newest first.
pub fn find_ctests_by_user(conn: &Connection, user_id: &str) -> Result<Vec<CTest>, DatabaseError> {
    super::find_many(
        conn,
        &Filter::eq("user_id", user_id),
        &FindOptions::sorted(Sort::desc("date_created")),
    )
}

/// A provider's lab results, optionally narrowed to processed or pending ones.
pub fn find_ctests_by_provider(
    conn: &Connection,
    provider_id: &str,
    processed: Option<bool>,
) -> Result<Vec<CTest>, DatabaseError> {
    let mut filter = Filter::eq("provider_id", provider_id);
    if let Some(processed) = processed {
        filter = filter.and(Filter::eq("processed", processed));
    }
    super::find_many(conn, &filter, &FindOptions::sorted(Sort::asc("date_created")))
}

pub fn mark_ctest_processed(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let update = UpdateOps::new()
        .set("processed", true)
        .set("date_updated", now().timestamp_millis());
    if Collection::<CTest>::new().update_one(conn, &Filter::id(id), &update)? == 0 {
        return Err(DatabaseError::not_found("CTest", id));
    }
    Ok(())
}

pub fn delete_ctests_by_user(conn: &Connection, user_id: &str) -> Result<usize, DatabaseError> {
    Collection::<CTest>::new().delete_many(conn, &Filter::eq("user_id", user_id))
}
