use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::ManualTestStatus;

/// An encrypted blob together with the key it was encrypted under,
/// itself encrypted for the owning user. The store never decrypts either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub encrypted_key: String,
    pub encrypted_blob: String,
}

impl EncryptedPayload {
    pub fn new(encrypted_key: &str, encrypted_blob: &str) -> Self {
        Self {
            encrypted_key: encrypted_key.into(),
            encrypted_blob: encrypted_blob.into(),
        }
    }
}

/// A lab-submitted test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CTest {
    pub id: String,
    pub provider_id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub payload: EncryptedPayload,
    pub processed: bool,
    pub order_number: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(CTest, "ctests", "CTest");

/// A user-submitted test result awaiting operator review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EManualTest {
    pub id: String,
    pub user_id: String,
    pub history_id: String,
    pub location_id: Option<String>,
    pub county_id: Option<String>,
    #[serde(flatten)]
    pub payload: EncryptedPayload,
    pub encrypted_image_key: String,
    pub encrypted_image_blob: String,
    pub status: ManualTestStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(EManualTest, "emanualtests", "EManualTest");

/// A timestamped encrypted event in a user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EHistory {
    pub id: String,
    pub user_id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    /// Free-form tag, e.g. `unverified_manual_test`.
    #[serde(rename = "type")]
    pub history_type: String,
    #[serde(flatten)]
    pub payload: EncryptedPayload,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(EHistory, "ehistory", "EHistory");

impl EHistory {
    pub fn new(user_id: &str, date: DateTime<Utc>, history_type: &str, payload: EncryptedPayload) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.into(),
            date,
            history_type: history_type.into(),
            payload,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}

/// Cached, derived exposure status for a (user, app version) pair.
///
/// Absence of a record means "needs recompute" to downstream readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EStatus {
    pub id: String,
    pub user_id: String,
    pub app_version: Option<String>,
    #[serde(flatten)]
    pub payload: EncryptedPayload,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(EStatus, "estatus", "EStatus");

impl EStatus {
    pub fn new(user_id: &str, app_version: Option<&str>, payload: EncryptedPayload) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.into(),
            app_version: app_version.map(Into::into),
            payload,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}
