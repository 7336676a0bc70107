//! Cached status invalidation.
//!
//! EStatus rows are derived from a user's history and the current policy.
//! Policy changes drop every cached row; absence tells the recompute
//! collaborator to rebuild on next read. Both purges are meant to run in
//! the same transaction as the mutation that caused them.

use rusqlite::Connection;

use super::{Collection, DatabaseError, Filter};
use crate::models::EStatus;

/// Delete every cached status. Returns the number of rows removed.
pub fn purge_all_statuses(conn: &Connection, reason: &str) -> Result<usize, DatabaseError> {
    let purged = Collection::<EStatus>::new().delete_many(conn, &Filter::All)?;
    tracing::info!(purged, reason, "Cached statuses invalidated");
    Ok(purged)
}

/// Delete the cached statuses of one user.
pub fn purge_user_statuses(conn: &Connection, user_id: &str) -> Result<usize, DatabaseError> {
    let purged = Collection::<EStatus>::new().delete_many(conn, &Filter::eq("user_id", user_id))?;
    tracing::info!(purged, user_id, "User statuses invalidated");
    Ok(purged)
}
