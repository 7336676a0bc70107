//! Denormalizing reads.
//!
//! Each read is one aggregation over its base collection with the joined
//! document attached under a field of the result. Nothing here writes.
//! An empty match is an empty result; batch lookups omit keys that matched
//! nothing.

use std::collections::HashMap;

use rusqlite::Connection;

use super::{Aggregation, Collection, DatabaseError, Filter, FindOptions, Lookup, Sort};
use crate::models::{
    CTest, CTestWithUser, EManualTest, Location, LocationWithProvider, ManualTestStatus,
    ManualTestWithUser, User, UserWithCTest,
};

const PROVIDER: Lookup = Lookup {
    from: "providers",
    local_field: "provider_id",
    foreign_field: "id",
    as_field: "provider",
    required: false,
};

/// Rows without a user are dropped; a test whose owner is gone has no
/// one to report to.
const USER: Lookup = Lookup {
    from: "users",
    local_field: "user_id",
    foreign_field: "id",
    as_field: "user",
    required: true,
};

/// Joined from the user side, so the batch is narrowed by the users'
/// external id index before any lab result is read.
const CTESTS: Lookup = Lookup {
    from: "ctests",
    local_field: "id",
    foreign_field: "user_id",
    as_field: "ctest",
    required: true,
};

// ═══════════════════════════════════════════
// Locations
// ═══════════════════════════════════════════

fn locations_with_provider(conn: &Connection, filter: Filter) -> Result<Vec<LocationWithProvider>, DatabaseError> {
    let aggregation = Aggregation::new(filter)
        .lookup(PROVIDER)
        .options(FindOptions::sorted(Sort::asc("name")));
    Collection::<Location>::new().aggregate(conn, &aggregation)
}

pub fn find_locations_with_provider(conn: &Connection) -> Result<Vec<LocationWithProvider>, DatabaseError> {
    locations_with_provider(conn, Filter::All)
}

pub fn find_locations_with_provider_by_county(
    conn: &Connection,
    county_id: &str,
) -> Result<Vec<LocationWithProvider>, DatabaseError> {
    locations_with_provider(conn, Filter::eq("county_id", county_id))
}

pub fn find_location_with_provider(
    conn: &Connection,
    location_id: &str,
) -> Result<Option<LocationWithProvider>, DatabaseError> {
    Ok(locations_with_provider(conn, Filter::id(location_id))?.pop())
}

// ═══════════════════════════════════════════
// Lab tests by external identity
// ═══════════════════════════════════════════

/// Lab results grouped by their owner's external id, newest first.
pub fn find_ctests_by_external_ids(
    conn: &Connection,
    external_ids: &[String],
) -> Result<HashMap<String, Vec<CTest>>, DatabaseError> {
    if external_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let aggregation = Aggregation::new(Filter::is_in(
        "external_id",
        external_ids.iter().map(String::as_str),
    ))
    .lookup(CTESTS)
    .options(FindOptions::sorted(Sort::desc("ctest.date_created")));
    let rows: Vec<UserWithCTest> = Collection::<User>::new().aggregate(conn, &aggregation)?;

    let mut grouped: HashMap<String, Vec<CTest>> = HashMap::new();
    for row in rows {
        if let Some(external_id) = row.user.external_id {
            grouped.entry(external_id).or_default().push(row.ctest);
        }
    }
    Ok(grouped)
}

/// Order number → external id of the user the lab result belongs to.
pub fn find_external_ids_by_order_numbers(
    conn: &Connection,
    order_numbers: &[String],
) -> Result<HashMap<String, String>, DatabaseError> {
    if order_numbers.is_empty() {
        return Ok(HashMap::new());
    }
    let aggregation = Aggregation::new(Filter::is_in(
        "order_number",
        order_numbers.iter().map(String::as_str),
    ))
    .lookup(USER)
    .options(FindOptions::sorted(Sort::asc("date_created")));
    let rows: Vec<CTestWithUser> = Collection::<CTest>::new().aggregate(conn, &aggregation)?;

    let mut mapped = HashMap::new();
    for row in rows {
        if let (Some(order_number), Some(external_id)) = (row.ctest.order_number, row.user.external_id) {
            mapped.entry(order_number).or_insert(external_id);
        }
    }
    Ok(mapped)
}

// ═══════════════════════════════════════════
// Manual tests for review
// ═══════════════════════════════════════════

/// Manual tests with their submitter, newest first.
pub fn find_manual_tests_with_user(
    conn: &Connection,
    county_id: Option<&str>,
    status: Option<ManualTestStatus>,
) -> Result<Vec<ManualTestWithUser>, DatabaseError> {
    let mut filter = Filter::All;
    if let Some(county_id) = county_id {
        filter = filter.and(Filter::eq("county_id", county_id));
    }
    if let Some(status) = status {
        filter = filter.and(Filter::eq("status", status.as_str()));
    }
    let aggregation = Aggregation::new(filter)
        .lookup(USER)
        .options(FindOptions::sorted(Sort::desc("date")));
    Collection::<EManualTest>::new().aggregate(conn, &aggregation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{create, create_manual_test, delete, process_manual_test, ManualTestSubmission};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{now, County, EncryptedPayload, Provider, User};

    fn ctest(conn: &Connection, user_id: &str, order: Option<&str>) -> CTest {
        create(
            conn,
            CTest {
                id: String::new(),
                provider_id: "p".into(),
                user_id: user_id.into(),
                payload: EncryptedPayload::new("k", "b"),
                processed: false,
                order_number: order.map(Into::into),
                date_created: now(),
                date_updated: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn locations_join_provider_by_county_and_id() {
        let conn = open_memory_database().unwrap();
        let p = create(&conn, Provider::new("Carle", false, vec![])).unwrap();
        let a = create(&conn, Location::new("Arena", &p.id, "c1")).unwrap();
        create(&conn, Location::new("Beta", &p.id, "c2")).unwrap();

        let in_c1 = find_locations_with_provider_by_county(&conn, "c1").unwrap();
        assert_eq!(in_c1.len(), 1);
        assert_eq!(in_c1[0].location, a);
        assert_eq!(in_c1[0].provider.as_ref(), Some(&p));

        assert_eq!(find_locations_with_provider(&conn).unwrap().len(), 2);
        assert!(find_location_with_provider(&conn, &a.id).unwrap().is_some());
        assert!(find_location_with_provider(&conn, "missing").unwrap().is_none());
        assert!(find_locations_with_provider_by_county(&conn, "c9").unwrap().is_empty());
    }

    #[test]
    fn ctests_group_by_external_id_and_omit_misses() {
        let conn = open_memory_database().unwrap();
        let u1 = create(&conn, User::new(None, Some("ext-1"))).unwrap();
        let u2 = create(&conn, User::new(None, Some("ext-2"))).unwrap();
        ctest(&conn, &u1.id, None);
        ctest(&conn, &u1.id, None);
        ctest(&conn, &u2.id, None);
        ctest(&conn, "erased-user", None);

        let grouped = find_ctests_by_external_ids(&conn, &["ext-1".into(), "ext-9".into()]).unwrap();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped["ext-1"].len(), 2);
        assert!(grouped["ext-1"].iter().all(|t| t.user_id == u1.id));
        assert!(!grouped.contains_key("ext-9"));
        assert!(find_ctests_by_external_ids(&conn, &[]).unwrap().is_empty());
    }

    #[test]
    fn order_numbers_map_to_external_ids() {
        let conn = open_memory_database().unwrap();
        let u1 = create(&conn, User::new(None, Some("ext-1"))).unwrap();
        let orphan_owner = create(&conn, User::new(None, Some("ext-2"))).unwrap();
        ctest(&conn, &u1.id, Some("A100"));
        ctest(&conn, &orphan_owner.id, Some("A200"));
        delete::<User>(&conn, &orphan_owner.id).unwrap();

        let mapped =
            find_external_ids_by_order_numbers(&conn, &["A100".into(), "A200".into(), "A300".into()]).unwrap();
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped["A100"], "ext-1");
    }

    #[test]
    fn manual_tests_filter_by_county_and_status() {
        let conn = open_memory_database().unwrap();
        let u = create(&conn, User::new(Some("1"), Some("ext-1"))).unwrap();
        let county = create(&conn, County::new("Champaign", "IL", "US")).unwrap();
        let submit = |county_id: Option<&str>| {
            create_manual_test(
                &conn,
                ManualTestSubmission {
                    user_id: u.id.clone(),
                    location_id: None,
                    county_id: county_id.map(Into::into),
                    date: now(),
                    payload: EncryptedPayload::new("k", "b"),
                    image: EncryptedPayload::new("ik", "ib"),
                },
            )
            .unwrap()
        };
        let a = submit(Some(&county.id));
        submit(Some(&county.id));
        submit(None);
        process_manual_test(&conn, &a.id, ManualTestStatus::Rejected, None).unwrap();

        let all = find_manual_tests_with_user(&conn, None, None).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|row| row.user.id == u.id));

        let pending = find_manual_tests_with_user(&conn, Some(&county.id), Some(ManualTestStatus::Unverified)).unwrap();
        assert_eq!(pending.len(), 1);
        let rejected = find_manual_tests_with_user(&conn, None, Some(ManualTestStatus::Rejected)).unwrap();
        assert_eq!(rejected[0].manual_test.id, a.id);
    }
}
