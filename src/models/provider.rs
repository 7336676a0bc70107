use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A testing provider (lab, clinic, campus testing site operator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub provider_name: String,
    pub manual_test: bool,
    #[serde(default)]
    pub available_mechanisms: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(Provider, "providers", "Provider");

impl Provider {
    pub fn new(provider_name: &str, manual_test: bool, available_mechanisms: Vec<String>) -> Self {
        Self {
            id: String::new(),
            provider_name: provider_name.into(),
            manual_test,
            available_mechanisms,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}

/// A physical testing site run by one provider inside one county.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub contact: Option<String>,
    #[serde(default)]
    pub days_of_operation: Vec<OperationDay>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub wait_time_color: Option<String>,
    pub provider_id: String,
    pub county_id: String,
    #[serde(default)]
    pub available_tests: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(Location, "locations", "Location");

impl Location {
    /// A location with only its required references and name set.
    pub fn new(name: &str, provider_id: &str, county_id: &str) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            address1: String::new(),
            address2: None,
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            country: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            contact: None,
            days_of_operation: Vec::new(),
            url: None,
            notes: None,
            wait_time_color: None,
            provider_id: provider_id.into(),
            county_id: county_id.into(),
            available_tests: Vec::new(),
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDay {
    pub name: String,
    pub open_time: String,
    pub close_time: String,
}
