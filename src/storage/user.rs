use super::Storage;
use crate::db::{invalidation, repository, DatabaseError};
use crate::models::{EHistory, EStatus, User};

/// Rows removed by a full user erasure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErasedUserData {
    pub ctests: usize,
    pub manual_tests: usize,
    pub history: usize,
    pub statuses: usize,
}

impl Storage {
    /// An external id already bound to another user is `DuplicateKey`.
    pub fn create_user(&self, user: User) -> Result<User, DatabaseError> {
        let user = repository::create(&self.open_db()?, user)?;
        self.record("create_user", "users", &user.id);
        Ok(user)
    }

    pub fn find_user(&self, id: &str) -> Result<User, DatabaseError> {
        repository::find(&self.open_db()?, id)
    }

    pub fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>, DatabaseError> {
        repository::find_user_by_external_id(&self.open_db()?, external_id)
    }

    pub fn find_user_by_shibboleth_id(&self, uin: &str) -> Result<Option<User>, DatabaseError> {
        repository::find_user_by_shibboleth_id(&self.open_db()?, uin)
    }

    pub fn find_user_by_uuid(&self, uuid: &str) -> Result<Option<User>, DatabaseError> {
        repository::find_user_by_uuid(&self.open_db()?, uuid)
    }

    pub fn save_user(&self, user: &mut User) -> Result<(), DatabaseError> {
        repository::save(&self.open_db()?, user)?;
        self.record("save_user", "users", &user.id);
        Ok(())
    }

    /// Remove a user and everything stored on their behalf, atomically.
    pub fn erase_user(&self, user_id: &str) -> Result<ErasedUserData, DatabaseError> {
        let erased = self.write("erase_user", |tx| {
            repository::find::<User>(tx, user_id)?;
            let erased = ErasedUserData {
                ctests: repository::delete_ctests_by_user(tx, user_id)?,
                manual_tests: repository::delete_manual_tests_by_user(tx, user_id)?,
                history: repository::delete_history_by_user(tx, user_id)?,
                statuses: invalidation::purge_user_statuses(tx, user_id)?,
            };
            repository::delete::<User>(tx, user_id)?;
            Ok(erased)
        })?;
        tracing::info!(
            user_id,
            ctests = erased.ctests,
            manual_tests = erased.manual_tests,
            history = erased.history,
            "User data erased"
        );
        self.record("erase_user", "users", user_id);
        Ok(erased)
    }

    // ── History and cached statuses ─────────────────────────

    pub fn create_history(&self, history: EHistory) -> Result<EHistory, DatabaseError> {
        let history = repository::create(&self.open_db()?, history)?;
        self.record("create_history", "ehistory", &history.id);
        Ok(history)
    }

    pub fn find_history(&self, user_id: &str) -> Result<Vec<EHistory>, DatabaseError> {
        repository::find_history_by_user(&self.open_db()?, user_id)
    }

    pub fn find_status(&self, user_id: &str, app_version: Option<&str>) -> Result<Option<EStatus>, DatabaseError> {
        repository::find_status(&self.open_db()?, user_id, app_version)
    }

    /// Store a recomputed status for (user, app version).
    pub fn save_status(&self, status: EStatus) -> Result<EStatus, DatabaseError> {
        repository::upsert_status(&self.open_db()?, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::ManualTestSubmission;
    use crate::models::{now, EncryptedPayload, Provider};
    use crate::storage::test_support::*;

    #[test]
    fn erase_removes_every_owned_record() {
        let store = test_store();
        let s = &store.storage;
        let provider = s.create_provider(Provider::new("Carle", false, vec![])).unwrap();
        let user = s.create_user(User::new(Some("650000001"), Some("ext-1"))).unwrap();
        let bystander = s.create_user(User::new(Some("650000002"), Some("ext-2"))).unwrap();

        for owner in [&user, &bystander] {
            s.create_ctest(&provider.id, &owner.id, EncryptedPayload::new("k", "b"), None).unwrap();
            s.save_status(EStatus::new(&owner.id, None, EncryptedPayload::new("k", "s"))).unwrap();
        }
        s.submit_manual_test(ManualTestSubmission {
            user_id: user.id.clone(),
            location_id: None,
            county_id: None,
            date: now(),
            payload: EncryptedPayload::new("k", "b"),
            image: EncryptedPayload::new("ik", "ib"),
        })
        .unwrap();

        let erased = s.erase_user(&user.id).unwrap();
        assert_eq!(
            erased,
            ErasedUserData {
                ctests: 1,
                manual_tests: 1,
                history: 1,
                statuses: 1,
            }
        );
        assert!(s.find_user(&user.id).unwrap_err().is_not_found());
        assert!(s.find_history(&user.id).unwrap().is_empty());

        let conn = s.open_db().unwrap();
        assert_eq!(count(&conn, "ctests"), 1);
        assert_eq!(count(&conn, "estatus"), 1);
        assert!(s.find_user(&bystander.id).is_ok());
    }

    #[test]
    fn erasing_unknown_user_is_not_found() {
        let store = test_store();
        assert!(store.storage.erase_user("ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn identity_lookups() {
        let store = test_store();
        let s = &store.storage;
        let user = s.create_user(User::new(Some("650000001"), Some("ext-1"))).unwrap();
        let err = s.create_user(User::new(None, Some("ext-1"))).unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateKey { .. }));

        assert_eq!(s.find_user_by_external_id("ext-1").unwrap().unwrap().id, user.id);
        assert_eq!(s.find_user_by_shibboleth_id("650000001").unwrap().unwrap().id, user.id);
        assert_eq!(s.find_user_by_uuid(&user.uuid).unwrap().unwrap().id, user.id);

        let mut user = user;
        user.consent = true;
        s.save_user(&mut user).unwrap();
        assert!(s.find_user(&user.id).unwrap().consent);
    }

    #[test]
    fn status_is_replaced_per_app_version() {
        let store = test_store();
        let s = &store.storage;
        let first = s.save_status(EStatus::new("u1", Some("2.0"), EncryptedPayload::new("k", "old"))).unwrap();
        let second = s.save_status(EStatus::new("u1", Some("2.0"), EncryptedPayload::new("k", "new"))).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(s.find_status("u1", Some("2.0")).unwrap().unwrap().payload.encrypted_blob, "new");
        assert!(s.find_status("u1", Some("3.0")).unwrap().is_none());
    }
}
