use super::Storage;
use crate::db::integrity::{self, EntityKind};
use crate::db::{invalidation, repository, DatabaseError};
use crate::models::{TestType, TestTypeResult};

impl Storage {
    pub fn create_test_type(&self, test_type: TestType) -> Result<TestType, DatabaseError> {
        let test_type = repository::create(&self.open_db()?, test_type)?;
        self.record("create_test_type", "testtypes", &test_type.id);
        Ok(test_type)
    }

    pub fn find_test_type(&self, id: &str) -> Result<TestType, DatabaseError> {
        repository::find(&self.open_db()?, id)
    }

    pub fn find_test_types(&self) -> Result<Vec<TestType>, DatabaseError> {
        repository::find_test_types(&self.open_db()?)
    }

    /// Save name and priority; results are managed one at a time.
    pub fn save_test_type(&self, test_type: &mut TestType) -> Result<(), DatabaseError> {
        *test_type = repository::update_test_type_fields(&self.open_db()?, test_type)?;
        self.record("save_test_type", "testtypes", &test_type.id);
        Ok(())
    }

    /// Refused while locations offer it, rules reference it, or it still
    /// owns results.
    pub fn delete_test_type(&self, id: &str) -> Result<(), DatabaseError> {
        self.write("delete_test_type", |tx| {
            integrity::ensure_deletable(tx, EntityKind::TestType, id)?;
            repository::delete::<TestType>(tx, id)
        })?;
        tracing::info!(test_type_id = id, "Test type deleted");
        self.record("delete_test_type", "testtypes", id);
        Ok(())
    }

    // ── Results ─────────────────────────────────────────────

    pub fn create_test_type_result(
        &self,
        test_type_id: &str,
        result: TestTypeResult,
    ) -> Result<TestTypeResult, DatabaseError> {
        let result = repository::create_test_type_result(&self.open_db()?, test_type_id, result)?;
        self.record("create_test_type_result", "testtypes", test_type_id);
        Ok(result)
    }

    pub fn find_test_type_result(&self, id: &str) -> Result<TestTypeResult, DatabaseError> {
        repository::find_test_type_result(&self.open_db()?, id)
    }

    pub fn find_test_type_results(&self, test_type_id: &str) -> Result<Vec<TestTypeResult>, DatabaseError> {
        repository::find_test_type_results(&self.open_db()?, test_type_id)
    }

    /// Next-step text and offsets feed computed statuses; updating them
    /// invalidates every cached one.
    pub fn update_test_type_result(&self, result: TestTypeResult) -> Result<TestTypeResult, DatabaseError> {
        let result = self.write("update_test_type_result", |tx| {
            let result = repository::update_test_type_result(tx, result)?;
            invalidation::purge_all_statuses(tx, "test type result updated")?;
            Ok(result)
        })?;
        self.record("update_test_type_result", "testtypes", &result.id);
        Ok(result)
    }

    pub fn delete_test_type_result(&self, id: &str) -> Result<(), DatabaseError> {
        self.write("delete_test_type_result", |tx| {
            integrity::ensure_deletable(tx, EntityKind::TestTypeResult, id)?;
            repository::delete_test_type_result(tx, id)
        })?;
        self.record("delete_test_type_result", "testtypes", id);
        Ok(())
    }
}
