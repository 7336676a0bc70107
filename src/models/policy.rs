use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AccessDecision;

/// Maps the results of one test type, in one county, to county statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub county_id: String,
    pub test_type_id: String,
    pub priority: Option<i32>,
    #[serde(default)]
    pub results_statuses: Vec<TestTypeResultCountyStatus>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(Rule, "rules", "Rule");

impl Rule {
    pub fn new(
        county_id: &str,
        test_type_id: &str,
        priority: Option<i32>,
        results_statuses: Vec<TestTypeResultCountyStatus>,
    ) -> Self {
        Self {
            id: String::new(),
            county_id: county_id.into(),
            test_type_id: test_type_id.into(),
            priority,
            results_statuses,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestTypeResultCountyStatus {
    pub test_type_result_id: String,
    pub county_status_id: String,
}

/// Symptom-based policy for a county. At most one per county.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomRule {
    pub id: String,
    pub county_id: String,
    pub gr1_count: i32,
    pub gr2_count: i32,
    #[serde(default)]
    pub items: Vec<SymptomRuleItem>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(SymptomRule, "symptomrules", "SymptomRule");

impl SymptomRule {
    pub fn new(county_id: &str, gr1_count: i32, gr2_count: i32, items: Vec<SymptomRuleItem>) -> Self {
        Self {
            id: String::new(),
            county_id: county_id.into(),
            gr1_count,
            gr2_count,
            items,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomRuleItem {
    pub gr1: bool,
    pub gr2: bool,
    pub county_status_id: String,
    pub next_step: String,
}

/// Building-access policy for a county. At most one per county.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRule {
    pub id: String,
    pub county_id: String,
    #[serde(default)]
    pub rules: Vec<AccessRuleCountyStatus>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(AccessRule, "accessrules", "AccessRule");

impl AccessRule {
    pub fn new(county_id: &str, rules: Vec<AccessRuleCountyStatus>) -> Self {
        Self {
            id: String::new(),
            county_id: county_id.into(),
            rules,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRuleCountyStatus {
    pub county_status_id: String,
    pub value: AccessDecision,
}
