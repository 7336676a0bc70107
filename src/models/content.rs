use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub link: String,
    pub display_order: i32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(Resource, "resources", "Resource");

impl Resource {
    pub fn new(title: &str, link: &str, display_order: i32) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            link: link.into(),
            display_order,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}

/// The FAQ is a single document holding every section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub id: String,
    #[serde(default)]
    pub sections: Vec<FaqSection>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(Faq, "faq", "FAQ");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqSection {
    pub title: String,
    pub display_order: i32,
    #[serde(default)]
    pub questions: Vec<FaqQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqQuestion {
    pub title: String,
    pub description: String,
    pub display_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct News {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub html_content: Option<String>,
    pub link: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date_created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub date_updated: Option<DateTime<Utc>>,
}

document!(News, "news", "News");

impl News {
    pub fn new(date: DateTime<Utc>, title: &str, description: &str) -> Self {
        Self {
            id: String::new(),
            date,
            title: title.into(),
            description: description.into(),
            html_content: None,
            link: None,
            date_created: DateTime::<Utc>::UNIX_EPOCH,
            date_updated: None,
        }
    }
}
