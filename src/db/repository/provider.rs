use rusqlite::Connection;

use crate::db::{DatabaseError, Filter, FindOptions, IndexSpec, Sort};
use crate::models::Provider;

pub(super) const INDEXES: &[IndexSpec] = &[IndexSpec::new("providers", "provider_name")];

pub fn find_providers(conn: &Connection) -> Result<Vec<Provider>, DatabaseError> {
    super::find_many(conn, &Filter::All, &FindOptions::sorted(Sort::asc("provider_name")))
}

/// Providers that accept manually submitted test results.
pub fn find_manual_test_providers(conn: &Connection) -> Result<Vec<Provider>, DatabaseError> {
    super::find_many(
        conn,
        &Filter::eq("manual_test", true),
        &FindOptions::sorted(Sort::asc("provider_name")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::create;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn manual_test_filter_uses_boolean_flag() {
        let conn = open_memory_database().unwrap();
        create(&conn, Provider::new("Carle", true, vec![])).unwrap();
        create(&conn, Provider::new("Quest", false, vec![])).unwrap();
        create(&conn, Provider::new("Mckinley", true, vec![])).unwrap();

        let manual: Vec<String> = find_manual_test_providers(&conn)
            .unwrap()
            .into_iter()
            .map(|p| p.provider_name)
            .collect();
        assert_eq!(manual, vec!["Carle", "Mckinley"]);
        assert_eq!(find_providers(&conn).unwrap().len(), 3);
    }
}
