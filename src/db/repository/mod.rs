//! Repository layer: entity-scoped database operations.
//!
//! Generic CRUD lives here; entity modules add their finders and the
//! indexes they rely on. Everything takes a `&Connection`, so the same
//! functions run standalone or inside a coordinated transaction.

mod admin;
mod content;
mod county;
mod ctest;
mod history;
mod location;
mod policy;
mod provider;
mod test_type;
mod user;

use rusqlite::Connection;

use super::{Collection, DatabaseError, Filter, FindOptions, IndexSpec};
use crate::models::{new_id, now, Document};

pub use admin::*;
pub use content::*;
pub use county::*;
pub use ctest::*;
pub use history::*;
pub use location::*;
pub use manual_test::*;
pub use policy::*;
pub use provider::*;
pub use test_type::*;
pub use user::*;

/// Every index declared by the repositories, created once at startup.
pub fn declared_indexes() -> Vec<IndexSpec> {
    [
        county::INDEXES,
        test_type::INDEXES,
        policy::INDEXES,
        provider::INDEXES,
        location::INDEXES,
        user::INDEXES,
        ctest::INDEXES,
        manual_test::INDEXES,
        history::INDEXES,
        content::INDEXES,
        admin::INDEXES,
    ]
    .concat()
}

// ═══════════════════════════════════════════
// Generic CRUD
// ═══════════════════════════════════════════

/// Insert a new entity, assigning an id (unless one is set) and stamping
/// its creation time. Unique-index violations surface as `DuplicateKey`.
pub fn create<T: Document>(conn: &Connection, mut entity: T) -> Result<T, DatabaseError> {
    if entity.id().is_empty() {
        entity.set_id(new_id());
    }
    entity.stamp_created(now());
    Collection::<T>::new().insert_one(conn, &entity)?;
    Ok(entity)
}

pub fn find<T: Document>(conn: &Connection, id: &str) -> Result<T, DatabaseError> {
    Collection::<T>::new()
        .find_by_id(conn, id)?
        .ok_or_else(|| DatabaseError::not_found(T::ENTITY, id))
}

pub fn find_one<T: Document>(conn: &Connection, filter: &Filter) -> Result<Option<T>, DatabaseError> {
    Collection::<T>::new().find_one(conn, filter)
}

pub fn find_many<T: Document>(
    conn: &Connection,
    filter: &Filter,
    options: &FindOptions,
) -> Result<Vec<T>, DatabaseError> {
    Collection::<T>::new().find(conn, filter, options)
}

pub fn exists<T: Document>(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    Collection::<T>::new().exists(conn, &Filter::id(id))
}

/// Replace the stored entity wholesale, re-stamping its update time.
/// Last write wins; there is no version check.
pub fn save<T: Document>(conn: &Connection, entity: &mut T) -> Result<(), DatabaseError> {
    entity.stamp_updated(now());
    let id = entity.id().to_string();
    let replaced = Collection::<T>::new().replace_one(conn, &Filter::id(&id), entity)?;
    if replaced == 0 {
        return Err(DatabaseError::not_found(T::ENTITY, &id));
    }
    Ok(())
}

/// Delete by id without any dependency check. Callers deleting a
/// referenced entity go through the integrity validator first.
pub fn delete<T: Document>(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let deleted = Collection::<T>::new().delete_one(conn, &Filter::id(id))?;
    if deleted == 0 {
        return Err(DatabaseError::not_found(T::ENTITY, id));
    }
    Ok(())
}
