use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Campus identity number (UIN) from Shibboleth. Not unique.
    pub shibboleth_id: Option<String>,
    /// Identity from the external identity provider. Unique when present.
    pub external_id: Option<String>,
    pub uuid: String,
    pub public_key: Option<String>,
    pub consent: bool,
    pub exposure_notification: bool,
    /// Set when the client must re-submit its derived data.
    pub re_post: bool,
    pub encrypted_key: Option<String>,
    pub encrypted_blob: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(User, "users", "User");

impl User {
    pub fn new(shibboleth_id: Option<&str>, external_id: Option<&str>) -> Self {
        Self {
            id: String::new(),
            shibboleth_id: shibboleth_id.map(Into::into),
            external_id: external_id.map(Into::into),
            uuid: uuid::Uuid::new_v4().to_string(),
            public_key: None,
            consent: false,
            exposure_notification: false,
            re_post: false,
            encrypted_key: None,
            encrypted_blob: None,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}
