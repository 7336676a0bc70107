use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::embedded::EmbeddedList;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct County {
    pub id: String,
    pub name: String,
    pub state_province: String,
    pub country: String,
    #[serde(default)]
    pub guidelines: Vec<Guideline>,
    #[serde(default)]
    pub statuses: Vec<CountyStatus>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(County, "counties", "County");

impl County {
    pub fn new(name: &str, state_province: &str, country: &str) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            state_province: state_province.into(),
            country: country.into(),
            guidelines: Vec::new(),
            statuses: Vec::new(),
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }

    /// Whether `status_id` belongs to this county's status catalog.
    pub fn has_status(&self, status_id: &str) -> bool {
        self.statuses.iter().any(|s| s.id == status_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guideline {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub items: Vec<GuidelineItem>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

sub_entity!(Guideline, "Guideline");

impl Guideline {
    pub fn new(name: &str, description: &str, items: Vec<GuidelineItem>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: description.into(),
            items,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidelineItem {
    pub icon: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

/// A named step in a county's testing/quarantine policy ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyStatus {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

sub_entity!(CountyStatus, "CountyStatus");

impl CountyStatus {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: description.into(),
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}

impl EmbeddedList<Guideline> for County {
    const ARRAY_FIELD: &'static str = "guidelines";

    fn items(&self) -> &[Guideline] {
        &self.guidelines
    }

    fn items_mut(&mut self) -> &mut Vec<Guideline> {
        &mut self.guidelines
    }
}

impl EmbeddedList<CountyStatus> for County {
    const ARRAY_FIELD: &'static str = "statuses";

    fn items(&self) -> &[CountyStatus] {
        &self.statuses
    }

    fn items_mut(&mut self) -> &mut Vec<CountyStatus> {
        &mut self.statuses
    }
}
