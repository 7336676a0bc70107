use rusqlite::Connection;

use crate::db::{DatabaseError, Filter, FindOptions, IndexSpec, Sort};
use crate::models::{AccessRule, Rule, SymptomRule};

pub(super) const INDEXES: &[IndexSpec] = &[
    IndexSpec::new("rules", "county_id"),
    IndexSpec::new("rules", "test_type_id"),
    IndexSpec::unique("symptomrules", "county_id"),
    IndexSpec::unique("accessrules", "county_id"),
];

// ═══════════════════════════════════════════
// Rules
// ═══════════════════════════════════════════

pub fn find_rules(conn: &Connection) -> Result<Vec<Rule>, DatabaseError> {
    super::find_many(conn, &Filter::All, &FindOptions::sorted(Sort::asc("county_id")).then(Sort::asc("priority")))
}

pub fn find_rules_by_county(conn: &Connection, county_id: &str) -> Result<Vec<Rule>, DatabaseError> {
    super::find_many(
        conn,
        &Filter::eq("county_id", county_id),
        &FindOptions::sorted(Sort::asc("priority")),
    )
}

/// The rule for a (county, test type) pair. Uniqueness of the pair is kept
/// by callers; if several exist the first is returned.
pub fn find_rule_by_county_and_test_type(
    conn: &Connection,
    county_id: &str,
    test_type_id: &str,
) -> Result<Option<Rule>, DatabaseError> {
    super::find_one(
        conn,
        &Filter::eq("county_id", county_id).and(Filter::eq("test_type_id", test_type_id)),
    )
}

// ═══════════════════════════════════════════
// Symptom rules
// ═══════════════════════════════════════════

pub fn find_symptom_rules(conn: &Connection) -> Result<Vec<SymptomRule>, DatabaseError> {
    super::find_many(conn, &Filter::All, &FindOptions::default())
}

pub fn find_symptom_rule_by_county(
    conn: &Connection,
    county_id: &str,
) -> Result<Option<SymptomRule>, DatabaseError> {
    super::find_one(conn, &Filter::eq("county_id", county_id))
}

// ═══════════════════════════════════════════
// Access rules
// ═══════════════════════════════════════════

pub fn find_access_rules(conn: &Connection) -> Result<Vec<AccessRule>, DatabaseError> {
    super::find_many(conn, &Filter::All, &FindOptions::default())
}

pub fn find_access_rule_by_county(
    conn: &Connection,
    county_id: &str,
) -> Result<Option<AccessRule>, DatabaseError> {
    super::find_one(conn, &Filter::eq("county_id", county_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::create;
    use crate::db::sqlite::open_memory_database;
    use crate::db::DatabaseError;

    #[test]
    fn symptom_rule_is_unique_per_county() {
        let conn = open_memory_database().unwrap();
        create(&conn, SymptomRule::new("c1", 1, 2, vec![])).unwrap();
        let err = create(&conn, SymptomRule::new("c1", 3, 4, vec![])).unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateKey { ref collection, .. } if collection == "symptomrules"));
        create(&conn, SymptomRule::new("c2", 3, 4, vec![])).unwrap();
        assert_eq!(find_symptom_rule_by_county(&conn, "c1").unwrap().unwrap().gr1_count, 1);
    }

    #[test]
    fn access_rule_is_unique_per_county() {
        let conn = open_memory_database().unwrap();
        create(&conn, AccessRule::new("c1", vec![])).unwrap();
        let err = create(&conn, AccessRule::new("c1", vec![])).unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateKey { .. }));
        assert!(find_access_rule_by_county(&conn, "c2").unwrap().is_none());
    }

    #[test]
    fn rules_by_county_and_pair() {
        let conn = open_memory_database().unwrap();
        let r1 = create(&conn, Rule::new("c1", "t1", Some(2), vec![])).unwrap();
        let r2 = create(&conn, Rule::new("c1", "t2", Some(1), vec![])).unwrap();
        create(&conn, Rule::new("c2", "t1", None, vec![])).unwrap();

        let ids: Vec<String> = find_rules_by_county(&conn, "c1").unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![r2.id, r1.id.clone()]);
        assert_eq!(
            find_rule_by_county_and_test_type(&conn, "c1", "t1").unwrap().unwrap().id,
            r1.id
        );
        assert!(find_rule_by_county_and_test_type(&conn, "c2", "t2").unwrap().is_none());
        assert_eq!(find_rules(&conn).unwrap().len(), 3);
    }
}
