use rusqlite::Connection;

use crate::db::embedded;
use crate::db::{Collection, DatabaseError, Filter, FindOptions, IndexSpec, Sort, UpdateOps};
use crate::models::{now, TestType, TestTypeResult};

pub(super) const INDEXES: &[IndexSpec] = &[IndexSpec::new("testtypes", "name")];

/// Test types by priority then name.
pub fn find_test_types(conn: &Connection) -> Result<Vec<TestType>, DatabaseError> {
    super::find_many(
        conn,
        &Filter::All,
        &FindOptions::sorted(Sort::asc("priority")).then(Sort::asc("name")),
    )
}

/// Rewrite name and priority only; results keep their stored state.
pub fn update_test_type_fields(conn: &Connection, test_type: &TestType) -> Result<TestType, DatabaseError> {
    let update = UpdateOps::new()
        .set("name", test_type.name.as_str())
        .set("priority", serde_json::json!(test_type.priority))
        .set("date_updated", now().timestamp_millis());
    let updated = Collection::<TestType>::new().update_one(conn, &Filter::id(&test_type.id), &update)?;
    if updated == 0 {
        return Err(DatabaseError::not_found("TestType", &test_type.id));
    }
    super::find(conn, &test_type.id)
}

pub fn create_test_type_result(
    conn: &Connection,
    test_type_id: &str,
    result: TestTypeResult,
) -> Result<TestTypeResult, DatabaseError> {
    embedded::create_sub::<TestType, TestTypeResult>(conn, test_type_id, result)
}

pub fn find_test_type_result(conn: &Connection, result_id: &str) -> Result<TestTypeResult, DatabaseError> {
    embedded::find_sub::<TestType, TestTypeResult>(conn, result_id)
}

pub fn find_test_type_results(conn: &Connection, test_type_id: &str) -> Result<Vec<TestTypeResult>, DatabaseError> {
    embedded::list_subs::<TestType, TestTypeResult>(conn, test_type_id)
}

pub fn update_test_type_result(
    conn: &Connection,
    result: TestTypeResult,
) -> Result<TestTypeResult, DatabaseError> {
    embedded::update_sub::<TestType, TestTypeResult>(conn, result)
}

/// Remove a result from its test type without any dependency check.
pub fn delete_test_type_result(conn: &Connection, result_id: &str) -> Result<TestTypeResult, DatabaseError> {
    embedded::delete_sub::<TestType, TestTypeResult>(conn, result_id)
}
