use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::embedded::EmbeddedList;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestType {
    pub id: String,
    pub name: String,
    pub priority: Option<i32>,
    #[serde(default)]
    pub results: Vec<TestTypeResult>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(TestType, "testtypes", "TestType");

impl TestType {
    pub fn new(name: &str, priority: Option<i32>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            priority,
            results: Vec::new(),
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }

    pub fn has_result(&self, result_id: &str) -> bool {
        self.results.iter().any(|r| r.id == result_id)
    }
}

/// One possible outcome of a test type, e.g. "Positive".
///
/// Offsets are expressed in hours relative to the test date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestTypeResult {
    pub id: String,
    pub name: String,
    pub next_step: String,
    pub next_step_offset: Option<i64>,
    pub result_expires_offset: Option<i64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

sub_entity!(TestTypeResult, "TestTypeResult");

impl TestTypeResult {
    pub fn new(
        name: &str,
        next_step: &str,
        next_step_offset: Option<i64>,
        result_expires_offset: Option<i64>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            next_step: next_step.into(),
            next_step_offset,
            result_expires_offset,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}

impl EmbeddedList<TestTypeResult> for TestType {
    const ARRAY_FIELD: &'static str = "results";

    fn items(&self) -> &[TestTypeResult] {
        &self.results
    }

    fn items_mut(&mut self) -> &mut Vec<TestTypeResult> {
        &mut self.results
    }
}
