use super::Storage;
use crate::db::integrity::{self, EntityKind};
use crate::db::{invalidation, repository, DatabaseError};
use crate::models::{County, CountyStatus, Guideline};

impl Storage {
    // ── Counties ────────────────────────────────────────────

    pub fn create_county(&self, county: County) -> Result<County, DatabaseError> {
        let conn = self.open_db()?;
        let county = repository::create(&conn, county)?;
        self.record("create_county", "counties", &county.id);
        Ok(county)
    }

    pub fn find_county(&self, id: &str) -> Result<County, DatabaseError> {
        repository::find(&self.open_db()?, id)
    }

    pub fn find_counties(
        &self,
        name: Option<&str>,
        state_province: Option<&str>,
        country: Option<&str>,
    ) -> Result<Vec<County>, DatabaseError> {
        repository::find_counties(&self.open_db()?, name, state_province, country)
    }

    /// Save name, state and country. Guidelines and statuses on `county`
    /// are ignored and refreshed from the store.
    pub fn save_county(&self, county: &mut County) -> Result<(), DatabaseError> {
        *county = repository::update_county_fields(&self.open_db()?, county)?;
        self.record("save_county", "counties", &county.id);
        Ok(())
    }

    /// Refused with `DependencyExists` while any location or policy
    /// document names the county.
    pub fn delete_county(&self, id: &str) -> Result<(), DatabaseError> {
        self.write("delete_county", |tx| {
            integrity::ensure_deletable(tx, EntityKind::County, id)?;
            repository::delete::<County>(tx, id)
        })?;
        tracing::info!(county_id = id, "County deleted");
        self.record("delete_county", "counties", id);
        Ok(())
    }

    // ── Guidelines ──────────────────────────────────────────

    pub fn create_guideline(&self, county_id: &str, guideline: Guideline) -> Result<Guideline, DatabaseError> {
        let guideline = repository::create_guideline(&self.open_db()?, county_id, guideline)?;
        self.record("create_guideline", "counties", county_id);
        Ok(guideline)
    }

    pub fn find_guideline(&self, id: &str) -> Result<Guideline, DatabaseError> {
        repository::find_guideline(&self.open_db()?, id)
    }

    pub fn find_guidelines(&self, county_id: &str) -> Result<Vec<Guideline>, DatabaseError> {
        repository::find_guidelines(&self.open_db()?, county_id)
    }

    pub fn update_guideline(&self, guideline: Guideline) -> Result<Guideline, DatabaseError> {
        let guideline = repository::update_guideline(&self.open_db()?, guideline)?;
        self.record("update_guideline", "counties", &guideline.id);
        Ok(guideline)
    }

    pub fn delete_guideline(&self, id: &str) -> Result<(), DatabaseError> {
        repository::delete_guideline(&self.open_db()?, id)?;
        self.record("delete_guideline", "counties", id);
        Ok(())
    }

    // ── County statuses ─────────────────────────────────────

    pub fn create_county_status(&self, county_id: &str, status: CountyStatus) -> Result<CountyStatus, DatabaseError> {
        let status = repository::create_county_status(&self.open_db()?, county_id, status)?;
        self.record("create_county_status", "counties", county_id);
        Ok(status)
    }

    pub fn find_county_status(&self, id: &str) -> Result<CountyStatus, DatabaseError> {
        repository::find_county_status(&self.open_db()?, id)
    }

    pub fn find_county_statuses(&self, county_id: &str) -> Result<Vec<CountyStatus>, DatabaseError> {
        repository::find_county_statuses(&self.open_db()?, county_id)
    }

    /// Status labels are copied into computed statuses, so a change
    /// invalidates every cached one.
    pub fn update_county_status(&self, status: CountyStatus) -> Result<CountyStatus, DatabaseError> {
        let status = self.write("update_county_status", |tx| {
            let status = repository::update_county_status(tx, status)?;
            invalidation::purge_all_statuses(tx, "county status updated")?;
            Ok(status)
        })?;
        self.record("update_county_status", "counties", &status.id);
        Ok(status)
    }

    pub fn delete_county_status(&self, id: &str) -> Result<(), DatabaseError> {
        self.write("delete_county_status", |tx| {
            integrity::ensure_deletable(tx, EntityKind::CountyStatus, id)?;
            repository::delete_county_status(tx, id)
        })?;
        self.record("delete_county_status", "counties", id);
        Ok(())
    }
}
