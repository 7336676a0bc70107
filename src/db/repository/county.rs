use rusqlite::Connection;

use crate::db::embedded;
use crate::db::{Collection, DatabaseError, Filter, FindOptions, IndexSpec, Sort, UpdateOps};
use crate::models::{now, County, CountyStatus, Guideline};

pub(super) const INDEXES: &[IndexSpec] = &[IndexSpec::new("counties", "name")];

/// Counties ordered by name, optionally narrowed by name/state/country.
pub fn find_counties(
    conn: &Connection,
    name: Option<&str>,
    state_province: Option<&str>,
    country: Option<&str>,
) -> Result<Vec<County>, DatabaseError> {
    let mut filter = Filter::All;
    if let Some(name) = name {
        filter = filter.and(Filter::eq("name", name));
    }
    if let Some(state) = state_province {
        filter = filter.and(Filter::eq("state_province", state));
    }
    if let Some(country) = country {
        filter = filter.and(Filter::eq("country", country));
    }
    super::find_many(conn, &filter, &FindOptions::sorted(Sort::asc("name")))
}

/// Rewrite the county's own fields and return the stored document.
/// Guidelines and statuses are left as stored; they change only through
/// their sub-entity operations.
pub fn update_county_fields(conn: &Connection, county: &County) -> Result<County, DatabaseError> {
    let update = UpdateOps::new()
        .set("name", county.name.as_str())
        .set("state_province", county.state_province.as_str())
        .set("country", county.country.as_str())
        .set("date_updated", now().timestamp_millis());
    let updated = Collection::<County>::new().update_one(conn, &Filter::id(&county.id), &update)?;
    if updated == 0 {
        return Err(DatabaseError::not_found("County", &county.id));
    }
    super::find(conn, &county.id)
}

// ═══════════════════════════════════════════
// Guidelines
// ═══════════════════════════════════════════

pub fn create_guideline(
    conn: &Connection,
    county_id: &str,
    guideline: Guideline,
) -> Result<Guideline, DatabaseError> {
    embedded::create_sub::<County, Guideline>(conn, county_id, guideline)
}

pub fn find_guideline(conn: &Connection, guideline_id: &str) -> Result<Guideline, DatabaseError> {
    embedded::find_sub::<County, Guideline>(conn, guideline_id)
}

pub fn find_guidelines(conn: &Connection, county_id: &str) -> Result<Vec<Guideline>, DatabaseError> {
    embedded::list_subs::<County, Guideline>(conn, county_id)
}

pub fn update_guideline(conn: &Connection, guideline: Guideline) -> Result<Guideline, DatabaseError> {
    embedded::update_sub::<County, Guideline>(conn, guideline)
}

pub fn delete_guideline(conn: &Connection, guideline_id: &str) -> Result<Guideline, DatabaseError> {
    embedded::delete_sub::<County, Guideline>(conn, guideline_id)
}

// ═══════════════════════════════════════════
// County statuses
// ═══════════════════════════════════════════

pub fn create_county_status(
    conn: &Connection,
    county_id: &str,
    status: CountyStatus,
) -> Result<CountyStatus, DatabaseError> {
    embedded::create_sub::<County, CountyStatus>(conn, county_id, status)
}

pub fn find_county_status(conn: &Connection, status_id: &str) -> Result<CountyStatus, DatabaseError> {
    embedded::find_sub::<County, CountyStatus>(conn, status_id)
}

pub fn find_county_statuses(conn: &Connection, county_id: &str) -> Result<Vec<CountyStatus>, DatabaseError> {
    embedded::list_subs::<County, CountyStatus>(conn, county_id)
}

pub fn update_county_status(conn: &Connection, status: CountyStatus) -> Result<CountyStatus, DatabaseError> {
    embedded::update_sub::<County, CountyStatus>(conn, status)
}

/// Remove a status from its county without any dependency check.
pub fn delete_county_status(conn: &Connection, status_id: &str) -> Result<CountyStatus, DatabaseError> {
    embedded::delete_sub::<County, CountyStatus>(conn, status_id)
}
