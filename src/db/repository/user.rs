use rusqlite::Connection;

use crate::db::{Collection, DatabaseError, Filter, IndexSpec, UpdateOps};
use crate::models::User;

pub(super) const INDEXES: &[IndexSpec] = &[
    IndexSpec::unique("users", "external_id"),
    IndexSpec::new("users", "shibboleth_id"),
    IndexSpec::new("users", "uuid"),
];

pub fn find_user_by_external_id(conn: &Connection, external_id: &str) -> Result<Option<User>, DatabaseError> {
    super::find_one(conn, &Filter::eq("external_id", external_id))
}

/// First user bound to a campus UIN. UINs are not unique across accounts.
pub fn find_user_by_shibboleth_id(conn: &Connection, uin: &str) -> Result<Option<User>, DatabaseError> {
    super::find_one(conn, &Filter::eq("shibboleth_id", uin))
}

pub fn find_user_by_uuid(conn: &Connection, uuid: &str) -> Result<Option<User>, DatabaseError> {
    super::find_one(conn, &Filter::eq("uuid", uuid))
}

/// Set or clear the re-submission flag without rewriting the document.
pub fn set_user_re_post(conn: &Connection, user_id: &str, re_post: bool) -> Result<(), DatabaseError> {
    let update = UpdateOps::new()
        .set("re_post", re_post)
        .set("date_updated", crate::models::now().timestamp_millis());
    let updated = Collection::<User>::new().update_one(conn, &Filter::id(user_id), &update)?;
    if updated == 0 {
        return Err(DatabaseError::not_found("User", user_id));
    }
    Ok(())
}
