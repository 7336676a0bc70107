//! Referential integrity the document store does not enforce.
//!
//! Delete-side checks are a declarative table: for each referenced kind,
//! the collections and field shapes that may point at it. The first live
//! reference found fails the delete with `DependencyExists`. Insert-side
//! checks verify that referenced entities and catalog entries exist and
//! report misses as `Validation`.

use rusqlite::Connection;

use super::filter::Scope;
use super::{DatabaseError, Filter};
use crate::models::{AccessRule, County, Document, Location, Rule, SymptomRule, TestType};

/// Entity kinds that other documents reference by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    County,
    Provider,
    TestType,
    TestTypeResult,
    CountyStatus,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::County => "County",
            Self::Provider => "Provider",
            Self::TestType => "TestType",
            Self::TestTypeResult => "TestTypeResult",
            Self::CountyStatus => "CountyStatus",
        }
    }
}

/// How a referencing document holds the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefShape {
    /// Scalar field equal to the id.
    Field(&'static str),
    /// Array of ids containing it.
    ArrayContains(&'static str),
    /// Array of objects, one of which has `field` equal to it.
    ArrayElement {
        array: &'static str,
        field: &'static str,
    },
}

impl RefShape {
    fn filter(&self, id: &str) -> Filter {
        match *self {
            Self::Field(path) => Filter::eq(path, id),
            Self::ArrayContains(path) => Filter::contains(path, id),
            Self::ArrayElement { array, field } => Filter::elem_match(array, field, id),
        }
    }

    fn describe(&self) -> String {
        match *self {
            Self::Field(path) | Self::ArrayContains(path) => path.to_string(),
            Self::ArrayElement { array, field } => format!("{array}[].{field}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub referenced: EntityKind,
    pub collection: &'static str,
    pub shape: RefShape,
}

const fn dep(referenced: EntityKind, collection: &'static str, shape: RefShape) -> Dependency {
    Dependency {
        referenced,
        collection,
        shape,
    }
}

/// Checked in order; the first hit is reported.
pub const DEPENDENCIES: &[Dependency] = &[
    dep(EntityKind::County, "locations", RefShape::Field("county_id")),
    dep(EntityKind::County, "rules", RefShape::Field("county_id")),
    dep(EntityKind::County, "symptomrules", RefShape::Field("county_id")),
    dep(EntityKind::County, "accessrules", RefShape::Field("county_id")),
    dep(EntityKind::Provider, "locations", RefShape::Field("provider_id")),
    dep(EntityKind::Provider, "ctests", RefShape::Field("provider_id")),
    dep(EntityKind::TestType, "locations", RefShape::ArrayContains("available_tests")),
    dep(EntityKind::TestType, "rules", RefShape::Field("test_type_id")),
    dep(
        EntityKind::TestTypeResult,
        "rules",
        RefShape::ArrayElement {
            array: "results_statuses",
            field: "test_type_result_id",
        },
    ),
    dep(
        EntityKind::CountyStatus,
        "rules",
        RefShape::ArrayElement {
            array: "results_statuses",
            field: "county_status_id",
        },
    ),
    dep(
        EntityKind::CountyStatus,
        "symptomrules",
        RefShape::ArrayElement {
            array: "items",
            field: "county_status_id",
        },
    ),
    dep(
        EntityKind::CountyStatus,
        "accessrules",
        RefShape::ArrayElement {
            array: "rules",
            field: "county_status_id",
        },
    ),
];

/// Embedded children that block deleting their owner while non-empty.
pub const OWNED_CHILDREN: &[Dependency] = &[dep(
    EntityKind::TestType,
    "testtypes",
    RefShape::ArrayElement {
        array: "results",
        field: "id",
    },
)];

fn any_match(conn: &Connection, collection: &str, filter: &Filter) -> Result<bool, DatabaseError> {
    let mut params = Vec::new();
    let where_sql = filter.to_sql(Scope::table("doc", "id"), &mut params)?;
    let sql = format!("SELECT EXISTS (SELECT 1 FROM {collection} WHERE {where_sql})");
    let found: bool = conn.query_row(&sql, rusqlite::params_from_iter(params), |row| row.get(0))?;
    Ok(found)
}

/// Fail with `DependencyExists` if anything still references `id`.
pub fn ensure_deletable(conn: &Connection, kind: EntityKind, id: &str) -> Result<(), DatabaseError> {
    for dependency in DEPENDENCIES.iter().filter(|d| d.referenced == kind) {
        if any_match(conn, dependency.collection, &dependency.shape.filter(id))? {
            tracing::debug!(
                entity = kind.as_str(),
                id,
                collection = dependency.collection,
                "Delete blocked by live reference"
            );
            return Err(DatabaseError::DependencyExists {
                entity_type: kind.as_str().into(),
                id: id.into(),
                collection: dependency.collection.into(),
                field: dependency.shape.describe(),
            });
        }
    }
    for owned in OWNED_CHILDREN.iter().filter(|d| d.referenced == kind) {
        let RefShape::ArrayElement { array, .. } = owned.shape else {
            continue;
        };
        let has_children = Filter::id(id).and(Filter::not_empty(array));
        if any_match(conn, owned.collection, &has_children)? {
            return Err(DatabaseError::DependencyExists {
                entity_type: kind.as_str().into(),
                id: id.into(),
                collection: owned.collection.into(),
                field: array.into(),
            });
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Insert-side reference checks
// ═══════════════════════════════════════════

/// Load a referenced entity, reporting its absence as a validation failure.
fn referenced<T: Document>(conn: &Connection, id: &str) -> Result<T, DatabaseError> {
    super::repository::find::<T>(conn, id).map_err(|e| match e {
        DatabaseError::NotFound { .. } => {
            DatabaseError::Validation(format!("referenced {} {id} does not exist", T::ENTITY))
        }
        other => other,
    })
}

pub fn ensure_exists<T: Document>(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    referenced::<T>(conn, id).map(|_| ())
}

fn ensure_status_in_catalog(county: &County, status_id: &str) -> Result<(), DatabaseError> {
    if county.has_status(status_id) {
        return Ok(());
    }
    Err(DatabaseError::Validation(format!(
        "county status {status_id} is not in the catalog of county {}",
        county.id
    )))
}

pub fn validate_access_rule(conn: &Connection, rule: &AccessRule) -> Result<(), DatabaseError> {
    let county: County = referenced(conn, &rule.county_id)?;
    for entry in &rule.rules {
        ensure_status_in_catalog(&county, &entry.county_status_id)?;
    }
    Ok(())
}

pub fn validate_symptom_rule(conn: &Connection, rule: &SymptomRule) -> Result<(), DatabaseError> {
    let county: County = referenced(conn, &rule.county_id)?;
    for item in &rule.items {
        ensure_status_in_catalog(&county, &item.county_status_id)?;
    }
    Ok(())
}

pub fn validate_rule(conn: &Connection, rule: &Rule) -> Result<(), DatabaseError> {
    let county: County = referenced(conn, &rule.county_id)?;
    let test_type: TestType = referenced(conn, &rule.test_type_id)?;
    for pair in &rule.results_statuses {
        if !test_type.has_result(&pair.test_type_result_id) {
            return Err(DatabaseError::Validation(format!(
                "test type result {} is not in the catalog of test type {}",
                pair.test_type_result_id, test_type.id
            )));
        }
        ensure_status_in_catalog(&county, &pair.county_status_id)?;
    }
    Ok(())
}

pub fn validate_location(conn: &Connection, location: &Location) -> Result<(), DatabaseError> {
    ensure_exists::<crate::models::Provider>(conn, &location.provider_id)?;
    ensure_exists::<County>(conn, &location.county_id)?;
    for test_type_id in &location.available_tests {
        ensure_exists::<TestType>(conn, test_type_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{self, create};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{
        AccessDecision, AccessRuleCountyStatus, CountyStatus, Provider, SymptomRuleItem,
        TestTypeResult, TestTypeResultCountyStatus,
    };

    struct Fixture {
        county: County,
        status: CountyStatus,
        test_type: TestType,
        result: TestTypeResult,
    }

    fn fixture(conn: &Connection) -> Fixture {
        let county = create(conn, County::new("Champaign", "IL", "US")).unwrap();
        let status = repository::create_county_status(conn, &county.id, CountyStatus::new("Green", "ok")).unwrap();
        let test_type = create(conn, TestType::new("PCR", Some(1))).unwrap();
        let result = repository::create_test_type_result(
            conn,
            &test_type.id,
            TestTypeResult::new("Negative", "none", None, None),
        )
        .unwrap();
        Fixture {
            county,
            status,
            test_type,
            result,
        }
    }

    #[test]
    fn unreferenced_county_is_deletable() {
        let conn = open_memory_database().unwrap();
        let f = fixture(&conn);
        ensure_deletable(&conn, EntityKind::County, &f.county.id).unwrap();
    }

    #[test]
    fn location_blocks_county_and_provider() {
        let conn = open_memory_database().unwrap();
        let f = fixture(&conn);
        let provider = create(&conn, Provider::new("Carle", false, vec![])).unwrap();
        create(&conn, Location::new("Union", &provider.id, &f.county.id)).unwrap();

        let err = ensure_deletable(&conn, EntityKind::County, &f.county.id).unwrap_err();
        assert!(matches!(err, DatabaseError::DependencyExists { ref collection, .. } if collection == "locations"));
        let err = ensure_deletable(&conn, EntityKind::Provider, &provider.id).unwrap_err();
        assert!(matches!(err, DatabaseError::DependencyExists { ref field, .. } if field == "provider_id"));
    }

    #[test]
    fn test_type_with_results_is_not_deletable() {
        let conn = open_memory_database().unwrap();
        let f = fixture(&conn);
        let err = ensure_deletable(&conn, EntityKind::TestType, &f.test_type.id).unwrap_err();
        assert!(matches!(err, DatabaseError::DependencyExists { ref field, .. } if field == "results"));

        let bare = create(&conn, TestType::new("Antigen", None)).unwrap();
        ensure_deletable(&conn, EntityKind::TestType, &bare.id).unwrap();
    }

    #[test]
    fn test_type_offered_by_location_is_not_deletable() {
        let conn = open_memory_database().unwrap();
        let bare = create(&conn, TestType::new("Antigen", None)).unwrap();
        let mut l = Location::new("Union", "p", "c");
        l.available_tests = vec![bare.id.clone()];
        create(&conn, l).unwrap();
        let err = ensure_deletable(&conn, EntityKind::TestType, &bare.id).unwrap_err();
        assert!(matches!(err, DatabaseError::DependencyExists { ref field, .. } if field == "available_tests"));
    }

    #[test]
    fn embedded_references_block_status_and_result() {
        let conn = open_memory_database().unwrap();
        let f = fixture(&conn);
        let rule = Rule::new(
            &f.county.id,
            &f.test_type.id,
            None,
            vec![TestTypeResultCountyStatus {
                test_type_result_id: f.result.id.clone(),
                county_status_id: f.status.id.clone(),
            }],
        );
        create(&conn, rule).unwrap();

        let err = ensure_deletable(&conn, EntityKind::TestTypeResult, &f.result.id).unwrap_err();
        assert!(matches!(err, DatabaseError::DependencyExists { ref field, .. } if field == "results_statuses[].test_type_result_id"));
        let err = ensure_deletable(&conn, EntityKind::CountyStatus, &f.status.id).unwrap_err();
        assert!(matches!(err, DatabaseError::DependencyExists { ref collection, .. } if collection == "rules"));
    }

    #[test]
    fn access_rule_status_must_belong_to_county() {
        let conn = open_memory_database().unwrap();
        let f = fixture(&conn);
        let other = create(&conn, County::new("Cook", "IL", "US")).unwrap();
        let foreign = repository::create_county_status(&conn, &other.id, CountyStatus::new("Red", "x")).unwrap();

        let ok = AccessRule::new(
            &f.county.id,
            vec![AccessRuleCountyStatus {
                county_status_id: f.status.id.clone(),
                value: AccessDecision::Granted,
            }],
        );
        validate_access_rule(&conn, &ok).unwrap();

        let bad = AccessRule::new(
            &f.county.id,
            vec![AccessRuleCountyStatus {
                county_status_id: foreign.id,
                value: AccessDecision::Denied,
            }],
        );
        assert!(matches!(validate_access_rule(&conn, &bad).unwrap_err(), DatabaseError::Validation(_)));

        let missing_county = AccessRule::new("nowhere", vec![]);
        assert!(matches!(
            validate_access_rule(&conn, &missing_county).unwrap_err(),
            DatabaseError::Validation(_)
        ));
    }

    #[test]
    fn rule_checks_both_catalogs() {
        let conn = open_memory_database().unwrap();
        let f = fixture(&conn);
        let pair = |result: &str, status: &str| TestTypeResultCountyStatus {
            test_type_result_id: result.into(),
            county_status_id: status.into(),
        };

        validate_rule(&conn, &Rule::new(&f.county.id, &f.test_type.id, None, vec![pair(&f.result.id, &f.status.id)])).unwrap();
        let err = validate_rule(&conn, &Rule::new(&f.county.id, &f.test_type.id, None, vec![pair("x", &f.status.id)])).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        let err = validate_rule(&conn, &Rule::new(&f.county.id, &f.test_type.id, None, vec![pair(&f.result.id, "x")])).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        let err = validate_rule(&conn, &Rule::new(&f.county.id, "no-type", None, vec![])).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[test]
    fn symptom_rule_items_reference_county_statuses() {
        let conn = open_memory_database().unwrap();
        let f = fixture(&conn);
        let item = |status: &str| SymptomRuleItem {
            gr1: true,
            gr2: false,
            county_status_id: status.into(),
            next_step: "Stay home".into(),
        };
        validate_symptom_rule(&conn, &SymptomRule::new(&f.county.id, 1, 1, vec![item(&f.status.id)])).unwrap();
        let err = validate_symptom_rule(&conn, &SymptomRule::new(&f.county.id, 1, 1, vec![item("x")])).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[test]
    fn location_references_must_exist() {
        let conn = open_memory_database().unwrap();
        let f = fixture(&conn);
        let provider = create(&conn, Provider::new("Carle", false, vec![])).unwrap();
        let mut l = Location::new("Union", &provider.id, &f.county.id);
        l.available_tests = vec![f.test_type.id.clone()];
        validate_location(&conn, &l).unwrap();

        l.available_tests.push("gone".into());
        assert!(matches!(validate_location(&conn, &l).unwrap_err(), DatabaseError::Validation(_)));
        let orphan = Location::new("Union", "no-provider", &f.county.id);
        assert!(matches!(validate_location(&conn, &orphan).unwrap_err(), DatabaseError::Validation(_)));
    }

    #[test]
    fn every_dependency_targets_a_known_collection() {
        for d in DEPENDENCIES.iter().chain(OWNED_CHILDREN) {
            assert!(crate::db::COLLECTIONS.contains(&d.collection), "{}", d.collection);
        }
    }
}
