use super::Storage;
use crate::db::{integrity, invalidation, repository, DatabaseError};
use crate::models::{AccessRule, Rule, SymptomRule};

impl Storage {
    // ── Rules ───────────────────────────────────────────────

    pub fn create_rule(&self, rule: Rule) -> Result<Rule, DatabaseError> {
        let rule = self.write("create_rule", |tx| {
            integrity::validate_rule(tx, &rule)?;
            let rule = repository::create(tx, rule)?;
            invalidation::purge_all_statuses(tx, "rule created")?;
            Ok(rule)
        })?;
        self.record("create_rule", "rules", &rule.id);
        Ok(rule)
    }

    pub fn find_rule(&self, id: &str) -> Result<Rule, DatabaseError> {
        repository::find(&self.open_db()?, id)
    }

    pub fn find_rules(&self, county_id: Option<&str>) -> Result<Vec<Rule>, DatabaseError> {
        let conn = self.open_db()?;
        match county_id {
            Some(county_id) => repository::find_rules_by_county(&conn, county_id),
            None => repository::find_rules(&conn),
        }
    }

    /// The rule a county applies to results of one test type.
    pub fn find_rule_for_test_type(
        &self,
        county_id: &str,
        test_type_id: &str,
    ) -> Result<Option<Rule>, DatabaseError> {
        repository::find_rule_by_county_and_test_type(&self.open_db()?, county_id, test_type_id)
    }

    pub fn update_rule(&self, rule: &mut Rule) -> Result<(), DatabaseError> {
        self.write("update_rule", |tx| {
            integrity::validate_rule(tx, rule)?;
            repository::save(tx, rule)?;
            invalidation::purge_all_statuses(tx, "rule updated")?;
            Ok(())
        })?;
        self.record("update_rule", "rules", &rule.id);
        Ok(())
    }

    pub fn delete_rule(&self, id: &str) -> Result<(), DatabaseError> {
        self.write("delete_rule", |tx| {
            repository::delete::<Rule>(tx, id)?;
            invalidation::purge_all_statuses(tx, "rule deleted")?;
            Ok(())
        })?;
        self.record("delete_rule", "rules", id);
        Ok(())
    }

    // ── Symptom rules ───────────────────────────────────────

    /// A second symptom rule for the same county is `DuplicateKey`.
    pub fn create_symptom_rule(&self, rule: SymptomRule) -> Result<SymptomRule, DatabaseError> {
        let rule = self.write("create_symptom_rule", |tx| {
            integrity::validate_symptom_rule(tx, &rule)?;
            let rule = repository::create(tx, rule)?;
            invalidation::purge_all_statuses(tx, "symptom rule created")?;
            Ok(rule)
        })?;
        self.record("create_symptom_rule", "symptomrules", &rule.id);
        Ok(rule)
    }

    pub fn find_symptom_rule(&self, id: &str) -> Result<SymptomRule, DatabaseError> {
        repository::find(&self.open_db()?, id)
    }

    pub fn find_symptom_rule_by_county(&self, county_id: &str) -> Result<Option<SymptomRule>, DatabaseError> {
        repository::find_symptom_rule_by_county(&self.open_db()?, county_id)
    }

    pub fn find_symptom_rules(&self) -> Result<Vec<SymptomRule>, DatabaseError> {
        repository::find_symptom_rules(&self.open_db()?)
    }

    pub fn update_symptom_rule(&self, rule: &mut SymptomRule) -> Result<(), DatabaseError> {
        self.write("update_symptom_rule", |tx| {
            integrity::validate_symptom_rule(tx, rule)?;
            repository::save(tx, rule)?;
            invalidation::purge_all_statuses(tx, "symptom rule updated")?;
            Ok(())
        })?;
        self.record("update_symptom_rule", "symptomrules", &rule.id);
        Ok(())
    }

    pub fn delete_symptom_rule(&self, id: &str) -> Result<(), DatabaseError> {
        self.write("delete_symptom_rule", |tx| {
            repository::delete::<SymptomRule>(tx, id)?;
            invalidation::purge_all_statuses(tx, "symptom rule deleted")?;
            Ok(())
        })?;
        self.record("delete_symptom_rule", "symptomrules", id);
        Ok(())
    }

    // ── Access rules ────────────────────────────────────────
    // Evaluated live by readers, never cached: no invalidation.

    pub fn create_access_rule(&self, rule: AccessRule) -> Result<AccessRule, DatabaseError> {
        let rule = self.write("create_access_rule", |tx| {
            integrity::validate_access_rule(tx, &rule)?;
            repository::create(tx, rule)
        })?;
        self.record("create_access_rule", "accessrules", &rule.id);
        Ok(rule)
    }

    pub fn find_access_rule(&self, id: &str) -> Result<AccessRule, DatabaseError> {
        repository::find(&self.open_db()?, id)
    }

    pub fn find_access_rule_by_county(&self, county_id: &str) -> Result<Option<AccessRule>, DatabaseError> {
        repository::find_access_rule_by_county(&self.open_db()?, county_id)
    }

    pub fn find_access_rules(&self) -> Result<Vec<AccessRule>, DatabaseError> {
        repository::find_access_rules(&self.open_db()?)
    }

    pub fn update_access_rule(&self, rule: &mut AccessRule) -> Result<(), DatabaseError> {
        self.write("update_access_rule", |tx| {
            integrity::validate_access_rule(tx, rule)?;
            repository::save(tx, rule)
        })?;
        self.record("update_access_rule", "accessrules", &rule.id);
        Ok(())
    }

    pub fn delete_access_rule(&self, id: &str) -> Result<(), DatabaseError> {
        repository::delete::<AccessRule>(&self.open_db()?, id)?;
        self.record("delete_access_rule", "accessrules", id);
        Ok(())
    }
}
