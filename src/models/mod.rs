use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A top-level entity persisted as one JSON document in its own collection.
pub trait Document: Serialize + DeserializeOwned {
    /// Persisted collection name.
    const COLLECTION: &'static str;
    /// Human-readable entity name used in error messages.
    const ENTITY: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn stamp_created(&mut self, at: DateTime<Utc>);
    fn stamp_updated(&mut self, at: DateTime<Utc>);
}

/// Generate a fresh opaque identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time at the precision the store persists (milliseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Implements `Document` for a struct with `id`, `date_created` and
/// `date_updated` fields.
macro_rules! document {
    ($name:ident, $collection:literal, $entity:literal) => {
        impl $crate::models::Document for $name {
            const COLLECTION: &'static str = $collection;
            const ENTITY: &'static str = $entity;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn stamp_created(&mut self, at: chrono::DateTime<chrono::Utc>) {
                self.date_created = at;
            }

            fn stamp_updated(&mut self, at: chrono::DateTime<chrono::Utc>) {
                self.date_updated = Some(at);
            }
        }
    };
}

/// Implements `SubEntity` for an embedded element with the same
/// identity and timestamp fields.
macro_rules! sub_entity {
    ($name:ident, $entity:literal) => {
        impl $crate::db::embedded::SubEntity for $name {
            const ENTITY: &'static str = $entity;

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn stamp_created(&mut self, at: chrono::DateTime<chrono::Utc>) {
                self.date_created = at;
            }

            fn stamp_updated(&mut self, at: chrono::DateTime<chrono::Utc>) {
                self.date_updated = Some(at);
            }
        }
    };
}

pub mod admin;
pub mod content;
pub mod county;
pub mod enums;
pub mod joined;
pub mod policy;
pub mod provider;
pub mod test_record;
pub mod test_type;
pub mod user;

pub use admin::*;
pub use content::*;
pub use county::*;
pub use enums::*;
pub use joined::*;
pub use policy::*;
pub use provider::*;
pub use test_record::*;
pub use test_type::*;
pub use user::*;
