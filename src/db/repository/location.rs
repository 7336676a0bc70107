use rusqlite::Connection;

use crate::db::{DatabaseError, Filter, FindOptions, IndexSpec, Sort};
use crate::models::Location;

pub(super) const INDEXES: &[IndexSpec] = &[
    IndexSpec::new("locations", "provider_id"),
    IndexSpec::new("locations", "county_id"),
];

pub fn find_locations_by_county(conn: &Connection, county_id: &str) -> Result<Vec<Location>, DatabaseError> {
    super::find_many(
        conn,
        &Filter::eq("county_id", county_id),
        &FindOptions::sorted(Sort::asc("name")),
    )
}

pub fn find_locations_by_provider(conn: &Connection, provider_id: &str) -> Result<Vec<Location>, DatabaseError> {
    super::find_many(
        conn,
        &Filter::eq("provider_id", provider_id),
        &FindOptions::sorted(Sort::asc("name")),
    )
}

/// Locations offering the given test type.
pub fn find_locations_by_test_type(conn: &Connection, test_type_id: &str) -> Result<Vec<Location>, DatabaseError> {
    super::find_many(
        conn,
        &Filter::contains("available_tests", test_type_id),
        &FindOptions::sorted(Sort::asc("name")),
    )
}
