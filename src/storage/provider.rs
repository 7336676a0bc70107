use super::Storage;
use crate::db::integrity::{self, EntityKind};
use crate::db::{pipeline, repository, DatabaseError};
use crate::models::{Location, LocationWithProvider, Provider};

impl Storage {
    // ── Providers ───────────────────────────────────────────

    pub fn create_provider(&self, provider: Provider) -> Result<Provider, DatabaseError> {
        let provider = repository::create(&self.open_db()?, provider)?;
        self.record("create_provider", "providers", &provider.id);
        Ok(provider)
    }

    pub fn find_provider(&self, id: &str) -> Result<Provider, DatabaseError> {
        repository::find(&self.open_db()?, id)
    }

    pub fn find_providers(&self, manual_test_only: bool) -> Result<Vec<Provider>, DatabaseError> {
        let conn = self.open_db()?;
        if manual_test_only {
            repository::find_manual_test_providers(&conn)
        } else {
            repository::find_providers(&conn)
        }
    }

    pub fn save_provider(&self, provider: &mut Provider) -> Result<(), DatabaseError> {
        repository::save(&self.open_db()?, provider)?;
        self.record("save_provider", "providers", &provider.id);
        Ok(())
    }

    /// Refused while any location or lab result names the provider.
    pub fn delete_provider(&self, id: &str) -> Result<(), DatabaseError> {
        self.write("delete_provider", |tx| {
            integrity::ensure_deletable(tx, EntityKind::Provider, id)?;
            repository::delete::<Provider>(tx, id)
        })?;
        tracing::info!(provider_id = id, "Provider deleted");
        self.record("delete_provider", "providers", id);
        Ok(())
    }

    // ── Locations ───────────────────────────────────────────

    pub fn create_location(&self, location: Location) -> Result<Location, DatabaseError> {
        let location = self.write("create_location", |tx| {
            integrity::validate_location(tx, &location)?;
            repository::create(tx, location)
        })?;
        self.record("create_location", "locations", &location.id);
        Ok(location)
    }

    pub fn save_location(&self, location: &mut Location) -> Result<(), DatabaseError> {
        self.write("save_location", |tx| {
            integrity::validate_location(tx, location)?;
            repository::save(tx, location)
        })?;
        self.record("save_location", "locations", &location.id);
        Ok(())
    }

    pub fn delete_location(&self, id: &str) -> Result<(), DatabaseError> {
        repository::delete::<Location>(&self.open_db()?, id)?;
        self.record("delete_location", "locations", id);
        Ok(())
    }

    /// A location with its provider attached.
    pub fn find_location(&self, id: &str) -> Result<LocationWithProvider, DatabaseError> {
        pipeline::find_location_with_provider(&self.open_db()?, id)?
            .ok_or_else(|| DatabaseError::not_found("Location", id))
    }

    /// Locations with providers attached, optionally narrowed to a county.
    pub fn find_locations(&self, county_id: Option<&str>) -> Result<Vec<LocationWithProvider>, DatabaseError> {
        let conn = self.open_db()?;
        match county_id {
            Some(county_id) => pipeline::find_locations_with_provider_by_county(&conn, county_id),
            None => pipeline::find_locations_with_provider(&conn),
        }
    }

    pub fn find_locations_by_provider(&self, provider_id: &str) -> Result<Vec<Location>, DatabaseError> {
        repository::find_locations_by_provider(&self.open_db()?, provider_id)
    }

    /// Locations where a test type can be taken.
    pub fn find_locations_offering(&self, test_type_id: &str) -> Result<Vec<Location>, DatabaseError> {
        repository::find_locations_by_test_type(&self.open_db()?, test_type_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::DatabaseError;
    use crate::models::{County, Location, Provider, TestType};
    use crate::storage::test_support::*;

    #[test]
    fn location_lifecycle_with_provider_join() {
        let store = test_store();
        let s = &store.storage;
        let county = s.create_county(County::new("Champaign", "IL", "US")).unwrap();
        let provider = s.create_provider(Provider::new("Carle", true, vec!["walk-in".into()])).unwrap();
        let t = s.create_test_type(TestType::new("PCR", None)).unwrap();

        let mut location = Location::new("Union", &provider.id, &county.id);
        location.available_tests = vec![t.id.clone()];
        let mut location = s.create_location(location).unwrap();

        let joined = s.find_location(&location.id).unwrap();
        assert_eq!(joined.provider.as_ref().map(|p| p.id.as_str()), Some(provider.id.as_str()));
        assert_eq!(s.find_locations(Some(&county.id)).unwrap().len(), 1);
        assert!(s.find_locations(Some("elsewhere")).unwrap().is_empty());
        assert_eq!(s.find_locations_offering(&t.id).unwrap().len(), 1);
        assert!(s.find_locations_offering("antigen").unwrap().is_empty());

        location.wait_time_color = Some("green".into());
        s.save_location(&mut location).unwrap();
        assert_eq!(s.find_location(&location.id).unwrap().location.wait_time_color.as_deref(), Some("green"));

        let err = s.delete_provider(&provider.id).unwrap_err();
        assert!(matches!(err, DatabaseError::DependencyExists { .. }));
        s.delete_location(&location.id).unwrap();
        s.delete_provider(&provider.id).unwrap();
        assert!(s.find_location(&location.id).unwrap_err().is_not_found());
    }

    #[test]
    fn location_with_unknown_references_is_rejected() {
        let store = test_store();
        let s = &store.storage;
        let county = s.create_county(County::new("Champaign", "IL", "US")).unwrap();
        let err = s.create_location(Location::new("Union", "ghost", &county.id)).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let provider = s.create_provider(Provider::new("Carle", false, vec![])).unwrap();
        let mut location = s.create_location(Location::new("Union", &provider.id, &county.id)).unwrap();
        location.available_tests = vec!["ghost-test".into()];
        let err = s.save_location(&mut location).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert!(s.find_location(&location.id).unwrap().location.available_tests.is_empty());
    }

    #[test]
    fn manual_test_provider_listing() {
        let store = test_store();
        let s = &store.storage;
        s.create_provider(Provider::new("Carle", true, vec![])).unwrap();
        let mut quest = s.create_provider(Provider::new("Quest", false, vec![])).unwrap();
        assert_eq!(s.find_providers(true).unwrap().len(), 1);
        quest.manual_test = true;
        s.save_provider(&mut quest).unwrap();
        assert_eq!(s.find_providers(true).unwrap().len(), 2);
        assert_eq!(s.find_providers(false).unwrap().len(), 2);
    }
}
