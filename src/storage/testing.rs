use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::Storage;
use crate::db::repository::{self, ManualTestSubmission};
use crate::db::{integrity, pipeline, DatabaseError};
use crate::models::{
    CTest, EManualTest, EncryptedPayload, ManualTestStatus, ManualTestWithUser, Provider, User,
};

impl Storage {
    // ── Lab results ─────────────────────────────────────────

    /// Store a lab result for a user and flag the user to re-submit their
    /// derived data. Both writes commit together.
    pub fn create_ctest(
        &self,
        provider_id: &str,
        user_id: &str,
        payload: EncryptedPayload,
        order_number: Option<&str>,
    ) -> Result<CTest, DatabaseError> {
        let ctest = self.write("create_ctest", |tx| {
            integrity::ensure_exists::<Provider>(tx, provider_id)?;
            integrity::ensure_exists::<User>(tx, user_id)?;
            let ctest = repository::create(
                tx,
                CTest {
                    id: String::new(),
                    provider_id: provider_id.into(),
                    user_id: user_id.into(),
                    payload,
                    processed: false,
                    order_number: order_number.map(Into::into),
                    date_created: DateTime::<Utc>::UNIX_EPOCH,
                    date_updated: None,
                },
            )?;
            repository::set_user_re_post(tx, user_id, true)?;
            Ok(ctest)
        })?;
        tracing::info!(ctest_id = %ctest.id, provider_id, "Lab result stored");
        self.record("create_ctest", "ctests", &ctest.id);
        Ok(ctest)
    }

    pub fn find_ctests_by_user(&self, user_id: &str) -> Result<Vec<CTest>, DatabaseError> {
        repository::find_ctests_by_user(&self.open_db()?, user_id)
    }

    pub fn find_ctests_by_provider(
        &self,
        provider_id: &str,
        processed: Option<bool>,
    ) -> Result<Vec<CTest>, DatabaseError> {
        repository::find_ctests_by_provider(&self.open_db()?, provider_id, processed)
    }

    pub fn mark_ctest_processed(&self, id: &str) -> Result<(), DatabaseError> {
        repository::mark_ctest_processed(&self.open_db()?, id)?;
        self.record("mark_ctest_processed", "ctests", id);
        Ok(())
    }

    pub fn find_ctests_by_external_ids(
        &self,
        external_ids: &[String],
    ) -> Result<HashMap<String, Vec<CTest>>, DatabaseError> {
        pipeline::find_ctests_by_external_ids(&self.open_db()?, external_ids)
    }

    pub fn find_external_ids_by_order_numbers(
        &self,
        order_numbers: &[String],
    ) -> Result<HashMap<String, String>, DatabaseError> {
        pipeline::find_external_ids_by_order_numbers(&self.open_db()?, order_numbers)
    }

    // ── Manual tests ────────────────────────────────────────

    pub fn submit_manual_test(&self, submission: ManualTestSubmission) -> Result<EManualTest, DatabaseError> {
        let test = self.write("submit_manual_test", |tx| repository::create_manual_test(tx, submission))?;
        self.record("submit_manual_test", "emanualtests", &test.id);
        Ok(test)
    }

    pub fn find_manual_test(&self, id: &str) -> Result<EManualTest, DatabaseError> {
        repository::find(&self.open_db()?, id)
    }

    pub fn find_manual_tests_by_user(&self, user_id: &str) -> Result<Vec<EManualTest>, DatabaseError> {
        repository::find_manual_tests_by_user(&self.open_db()?, user_id)
    }

    /// Manual tests awaiting or past review, with their submitters.
    pub fn find_manual_tests(
        &self,
        county_id: Option<&str>,
        status: Option<ManualTestStatus>,
    ) -> Result<Vec<ManualTestWithUser>, DatabaseError> {
        pipeline::find_manual_tests_with_user(&self.open_db()?, county_id, status)
    }

    pub fn process_manual_test(
        &self,
        id: &str,
        status: ManualTestStatus,
        verified_payload: Option<EncryptedPayload>,
    ) -> Result<EManualTest, DatabaseError> {
        let test = self.write("process_manual_test", |tx| {
            repository::process_manual_test(tx, id, status, verified_payload)
        })?;
        self.record("process_manual_test", "emanualtests", id);
        Ok(test)
    }
}
