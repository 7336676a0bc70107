//! Embedded sub-entity manager.
//!
//! Sub-entities (a county's guidelines and statuses, a test type's results)
//! live inside their parent's document. Each operation loads the parent as
//! an aggregate root, indexes the embedded list by sub-id, mutates it in
//! memory and replaces the parent wholesale. Concurrent writes to the same
//! parent outside a transaction are last-write-wins.

use std::collections::HashMap;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Collection, DatabaseError, Filter};
use crate::models::{new_id, now, Document};

/// An element with its own identity inside a parent's embedded array.
pub trait SubEntity: Serialize + DeserializeOwned + Clone {
    const ENTITY: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn stamp_created(&mut self, at: DateTime<Utc>);
    fn stamp_updated(&mut self, at: DateTime<Utc>);
}

/// A parent document owning an ordered list of `S`.
pub trait EmbeddedList<S: SubEntity>: Document {
    /// Document field holding the list; also the path the store queries on.
    const ARRAY_FIELD: &'static str;

    fn items(&self) -> &[S];
    fn items_mut(&mut self) -> &mut Vec<S>;
}

/// A loaded parent together with a sub-id → position index of one of its
/// embedded lists. The index is rebuilt on every load.
pub struct Aggregate<P, S> {
    pub root: P,
    index: HashMap<String, usize>,
    _marker: PhantomData<S>,
}

impl<P: EmbeddedList<S>, S: SubEntity> Aggregate<P, S> {
    pub fn new(root: P) -> Self {
        let index = build_index(root.items());
        Self {
            root,
            index,
            _marker: PhantomData,
        }
    }

    /// Load the parent by its own id.
    pub fn load(conn: &Connection, parent_id: &str) -> Result<Self, DatabaseError> {
        let root = Collection::<P>::new()
            .find_by_id(conn, parent_id)?
            .ok_or_else(|| DatabaseError::not_found(P::ENTITY, parent_id))?;
        Ok(Self::new(root))
    }

    /// Load the parent that embeds `sub_id`: the store narrows to the parent
    /// via the array path, then the in-memory index locates the element.
    pub fn load_owning(conn: &Connection, sub_id: &str) -> Result<Self, DatabaseError> {
        let filter = Filter::elem_match(P::ARRAY_FIELD, "id", sub_id);
        let root = Collection::<P>::new()
            .find_one(conn, &filter)?
            .ok_or_else(|| DatabaseError::not_found(S::ENTITY, sub_id))?;
        Ok(Self::new(root))
    }

    pub fn position(&self, sub_id: &str) -> Option<usize> {
        self.index.get(sub_id).copied()
    }

    pub fn get(&self, sub_id: &str) -> Option<&S> {
        self.position(sub_id).map(|i| &self.root.items()[i])
    }

    fn push(&mut self, sub: S) {
        let items = self.root.items_mut();
        self.index.insert(sub.id().to_string(), items.len());
        items.push(sub);
    }

    fn replace(&mut self, sub: S) -> Result<(), DatabaseError> {
        let pos = self
            .position(sub.id())
            .ok_or_else(|| DatabaseError::not_found(S::ENTITY, sub.id()))?;
        self.root.items_mut()[pos] = sub;
        Ok(())
    }

    fn remove(&mut self, sub_id: &str) -> Result<S, DatabaseError> {
        let pos = self
            .position(sub_id)
            .ok_or_else(|| DatabaseError::not_found(S::ENTITY, sub_id))?;
        let removed = self.root.items_mut().remove(pos);
        self.index = build_index(self.root.items());
        Ok(removed)
    }

    /// Replace the parent document wholesale, re-stamping its update time.
    pub fn persist(&mut self, conn: &Connection) -> Result<(), DatabaseError> {
        self.root.stamp_updated(now());
        let id = self.root.id().to_string();
        let replaced = Collection::<P>::new().replace_one(conn, &Filter::id(&id), &self.root)?;
        if replaced == 0 {
            return Err(DatabaseError::not_found(P::ENTITY, &id));
        }
        Ok(())
    }
}

fn build_index<S: SubEntity>(items: &[S]) -> HashMap<String, usize> {
    items
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id().to_string(), i))
        .collect()
}

// ═══════════════════════════════════════════
// Sub-entity CRUD
// ═══════════════════════════════════════════

/// Append `sub` to the parent's list with a fresh id and creation stamp.
pub fn create_sub<P, S>(conn: &Connection, parent_id: &str, mut sub: S) -> Result<S, DatabaseError>
where
    P: EmbeddedList<S>,
    S: SubEntity,
{
    let mut aggregate = Aggregate::<P, S>::load(conn, parent_id)?;
    sub.set_id(new_id());
    sub.stamp_created(now());
    aggregate.push(sub.clone());
    aggregate.persist(conn)?;
    Ok(sub)
}

pub fn find_sub<P, S>(conn: &Connection, sub_id: &str) -> Result<S, DatabaseError>
where
    P: EmbeddedList<S>,
    S: SubEntity,
{
    let aggregate = Aggregate::<P, S>::load_owning(conn, sub_id)?;
    aggregate
        .get(sub_id)
        .cloned()
        .ok_or_else(|| DatabaseError::not_found(S::ENTITY, sub_id))
}

/// All elements of one parent's list, in stored order.
pub fn list_subs<P, S>(conn: &Connection, parent_id: &str) -> Result<Vec<S>, DatabaseError>
where
    P: EmbeddedList<S>,
    S: SubEntity,
{
    let aggregate = Aggregate::<P, S>::load(conn, parent_id)?;
    Ok(aggregate.root.items().to_vec())
}

/// Overwrite the element with `sub`'s id; siblings are written back unchanged.
pub fn update_sub<P, S>(conn: &Connection, mut sub: S) -> Result<S, DatabaseError>
where
    P: EmbeddedList<S>,
    S: SubEntity,
{
    let mut aggregate = Aggregate::<P, S>::load_owning(conn, sub.id())?;
    sub.stamp_updated(now());
    aggregate.replace(sub.clone())?;
    aggregate.persist(conn)?;
    Ok(sub)
}

/// Splice the element out of its parent's list and return it.
pub fn delete_sub<P, S>(conn: &Connection, sub_id: &str) -> Result<S, DatabaseError>
where
    P: EmbeddedList<S>,
    S: SubEntity,
{
    let mut aggregate = Aggregate::<P, S>::load_owning(conn, sub_id)?;
    let removed = aggregate.remove(sub_id)?;
    aggregate.persist(conn)?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{County, CountyStatus, Guideline, GuidelineItem, TestType, TestTypeResult};

    fn county(conn: &Connection) -> County {
        repository::create(conn, County::new("Champaign", "IL", "US")).unwrap()
    }

    fn raw_items(conn: &Connection, county_id: &str, field: &str) -> Vec<serde_json::Value> {
        let doc: String = conn
            .query_row("SELECT doc FROM counties WHERE id = ?1", [county_id], |r| r.get(0))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
        value[field].as_array().cloned().unwrap_or_default()
    }

    #[test]
    fn create_assigns_id_and_appends() {
        let conn = open_memory_database().unwrap();
        let c = county(&conn);
        let a = create_sub::<County, CountyStatus>(&conn, &c.id, CountyStatus::new("Green", "ok")).unwrap();
        let b = create_sub::<County, CountyStatus>(&conn, &c.id, CountyStatus::new("Red", "stop")).unwrap();
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);

        let statuses = list_subs::<County, CountyStatus>(&conn, &c.id).unwrap();
        assert_eq!(statuses, vec![a, b]);
    }

    #[test]
    fn create_under_missing_parent_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = create_sub::<County, Guideline>(&conn, "missing", Guideline::new("g", "d", vec![]))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { ref entity_type, .. } if entity_type == "County"));
    }

    #[test]
    fn find_locates_element_across_parents() {
        let conn = open_memory_database().unwrap();
        let first = county(&conn);
        let second = county(&conn);
        create_sub::<County, CountyStatus>(&conn, &first.id, CountyStatus::new("Green", "")).unwrap();
        let target = create_sub::<County, CountyStatus>(&conn, &second.id, CountyStatus::new("Orange", "")).unwrap();

        let found = find_sub::<County, CountyStatus>(&conn, &target.id).unwrap();
        assert_eq!(found, target);
        assert!(find_sub::<County, CountyStatus>(&conn, "nope").unwrap_err().is_not_found());
    }

    #[test]
    fn update_leaves_siblings_byte_identical() {
        let conn = open_memory_database().unwrap();
        let c = county(&conn);
        let item = GuidelineItem {
            icon: "mask".into(),
            description: "Wear a mask".into(),
            item_type: "required".into(),
        };
        let g1 = create_sub::<County, Guideline>(&conn, &c.id, Guideline::new("Masks", "", vec![item])).unwrap();
        let mut g2 = create_sub::<County, Guideline>(&conn, &c.id, Guideline::new("Distance", "", vec![])).unwrap();
        let g3 = create_sub::<County, Guideline>(&conn, &c.id, Guideline::new("Hands", "", vec![])).unwrap();
        let before = raw_items(&conn, &c.id, "guidelines");

        g2.description = "Six feet".into();
        let updated = update_sub::<County, Guideline>(&conn, g2).unwrap();
        assert!(updated.date_updated.is_some());

        let after = raw_items(&conn, &c.id, "guidelines");
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert_eq!(after[1]["description"], "Six feet");
        assert_eq!(find_sub::<County, Guideline>(&conn, &g1.id).unwrap(), g1);
        assert_eq!(find_sub::<County, Guideline>(&conn, &g3.id).unwrap(), g3);
    }

    #[test]
    fn update_does_not_touch_other_embedded_list() {
        let conn = open_memory_database().unwrap();
        let c = county(&conn);
        create_sub::<County, CountyStatus>(&conn, &c.id, CountyStatus::new("Green", "")).unwrap();
        let mut g = create_sub::<County, Guideline>(&conn, &c.id, Guideline::new("Masks", "", vec![])).unwrap();
        let statuses_before = raw_items(&conn, &c.id, "statuses");

        g.name = "Face coverings".into();
        update_sub::<County, Guideline>(&conn, g).unwrap();
        assert_eq!(raw_items(&conn, &c.id, "statuses"), statuses_before);
    }

    #[test]
    fn delete_splices_out_only_the_target() {
        let conn = open_memory_database().unwrap();
        let t = repository::create(&conn, TestType::new("PCR", Some(1))).unwrap();
        let pos = create_sub::<TestType, TestTypeResult>(&conn, &t.id, TestTypeResult::new("Positive", "Isolate", Some(0), Some(240))).unwrap();
        let neg = create_sub::<TestType, TestTypeResult>(&conn, &t.id, TestTypeResult::new("Negative", "Retest", Some(96), None)).unwrap();

        let removed = delete_sub::<TestType, TestTypeResult>(&conn, &pos.id).unwrap();
        assert_eq!(removed, pos);
        assert_eq!(list_subs::<TestType, TestTypeResult>(&conn, &t.id).unwrap(), vec![neg.clone()]);

        // the rebuilt index still resolves the survivor
        assert_eq!(find_sub::<TestType, TestTypeResult>(&conn, &neg.id).unwrap(), neg);
        assert!(delete_sub::<TestType, TestTypeResult>(&conn, &pos.id).unwrap_err().is_not_found());
    }

    #[test]
    fn aggregate_index_tracks_positions() {
        let mut c = County::new("Cook", "IL", "US");
        let mut a = CountyStatus::new("A", "");
        a.id = "a".into();
        let mut b = CountyStatus::new("B", "");
        b.id = "b".into();
        c.statuses = vec![a, b];

        let mut agg = Aggregate::<County, CountyStatus>::new(c);
        assert_eq!(agg.position("b"), Some(1));
        agg.remove("a").unwrap();
        assert_eq!(agg.position("b"), Some(0));
        assert_eq!(agg.position("a"), None);
    }
}
