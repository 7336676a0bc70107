//! Typed collection handles over SQLite-backed JSON document tables.
//!
//! Every collection is a table `(id TEXT PRIMARY KEY, doc TEXT NOT NULL)`.
//! Handle methods take a `&Connection`; passing a `rusqlite::Transaction`
//! (which dereferences to `Connection`) makes the same call transaction-bound.

use std::marker::PhantomData;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde::de::DeserializeOwned;

use super::filter::{json_path, FindOptions, Scope, UpdateOps};
use super::{DatabaseError, Filter};
use crate::models::Document;

// ═══════════════════════════════════════════
// Index declarations
// ═══════════════════════════════════════════

/// An expression index on one document field, declared by a repository
/// and created once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub collection: &'static str,
    pub field: &'static str,
    pub unique: bool,
}

impl IndexSpec {
    pub const fn new(collection: &'static str, field: &'static str) -> Self {
        Self {
            collection,
            field,
            unique: false,
        }
    }

    pub const fn unique(collection: &'static str, field: &'static str) -> Self {
        Self {
            collection,
            field,
            unique: true,
        }
    }

    pub fn name(&self) -> String {
        format!("{}_{}", self.collection, self.field.replace('.', "_"))
    }

    pub fn create(&self, conn: &Connection) -> Result<(), DatabaseError> {
        let sql = format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {}(json_extract(doc, {}))",
            if self.unique { "UNIQUE " } else { "" },
            self.name(),
            self.collection,
            json_path(self.field)?
        );
        conn.execute_batch(&sql)?;
        Ok(())
    }
}

/// Create the backing table for a collection if it does not exist.
pub fn create_collection(conn: &Connection, name: &str) -> Result<(), DatabaseError> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {name} (id TEXT PRIMARY KEY NOT NULL, doc TEXT NOT NULL)"
    ))?;
    Ok(())
}

// ═══════════════════════════════════════════
// Aggregation
// ═══════════════════════════════════════════

/// Left-join stage: attaches the document of `from` whose `foreign_field`
/// equals this document's `local_field` under `as_field`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub from: &'static str,
    pub local_field: &'static str,
    pub foreign_field: &'static str,
    pub as_field: &'static str,
    /// Drop rows with no match instead of attaching `null`.
    pub required: bool,
}

/// `match → lookup* → match → sort/limit` over one base collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Applied to the base documents before any join.
    pub filter: Filter,
    pub lookups: Vec<Lookup>,
    /// Applied to the joined shape; may address `as_field.*` paths.
    pub post_filter: Filter,
    pub options: FindOptions,
}

impl Aggregation {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.lookups.push(lookup);
        self
    }

    pub fn post_filter(mut self, filter: Filter) -> Self {
        self.post_filter = filter;
        self
    }

    pub fn options(mut self, options: FindOptions) -> Self {
        self.options = options;
        self
    }
}

// ═══════════════════════════════════════════
// Collection handle
// ═══════════════════════════════════════════

pub struct Collection<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Collection<T> {}

impl<T: Document> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> Collection<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        T::COLLECTION
    }

    pub fn find(
        &self,
        conn: &Connection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<T>, DatabaseError> {
        let scope = Scope::table("doc", "id");
        let mut params = Vec::new();
        let where_sql = filter.to_sql(scope, &mut params)?;
        let sql = format!(
            "SELECT doc FROM {} WHERE {where_sql}{}",
            T::COLLECTION,
            options.to_sql(scope)?
        );
        query_documents(conn, &sql, params)
    }

    pub fn find_one(&self, conn: &Connection, filter: &Filter) -> Result<Option<T>, DatabaseError> {
        let mut found = self.find(conn, filter, &FindOptions::default().limit(1))?;
        Ok(found.pop())
    }

    pub fn find_by_id(&self, conn: &Connection, id: &str) -> Result<Option<T>, DatabaseError> {
        self.find_one(conn, &Filter::id(id))
    }

    pub fn count(&self, conn: &Connection, filter: &Filter) -> Result<u64, DatabaseError> {
        let mut params = Vec::new();
        let where_sql = filter.to_sql(Scope::table("doc", "id"), &mut params)?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {where_sql}", T::COLLECTION);
        let count: i64 = conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn exists(&self, conn: &Connection, filter: &Filter) -> Result<bool, DatabaseError> {
        let mut params = Vec::new();
        let where_sql = filter.to_sql(Scope::table("doc", "id"), &mut params)?;
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE {where_sql})",
            T::COLLECTION
        );
        let found: bool = conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?;
        Ok(found)
    }

    pub fn insert_one(&self, conn: &Connection, doc: &T) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(doc)?;
        conn.execute(
            &format!("INSERT INTO {} (id, doc) VALUES (?1, ?2)", T::COLLECTION),
            rusqlite::params![doc.id(), json],
        )?;
        Ok(())
    }

    pub fn insert_many(&self, conn: &Connection, docs: &[T]) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(&format!(
            "INSERT INTO {} (id, doc) VALUES (?1, ?2)",
            T::COLLECTION
        ))?;
        for doc in docs {
            stmt.execute(rusqlite::params![doc.id(), serde_json::to_string(doc)?])?;
        }
        Ok(())
    }

    /// Replace the first document matching `filter` wholesale.
    /// Returns the number of documents replaced (0 or 1).
    pub fn replace_one(&self, conn: &Connection, filter: &Filter, doc: &T) -> Result<usize, DatabaseError> {
        let mut params = vec![
            SqlValue::Text(doc.id().to_string()),
            SqlValue::Text(serde_json::to_string(doc)?),
        ];
        let where_sql = filter.to_sql(Scope::table("doc", "id"), &mut params)?;
        let sql = format!(
            "UPDATE {t} SET id = ?, doc = ? WHERE rowid = (SELECT rowid FROM {t} WHERE {where_sql} LIMIT 1)",
            t = T::COLLECTION
        );
        Ok(conn.execute(&sql, params_from_iter(params))?)
    }

    /// Apply field assignments to the first document matching `filter`.
    pub fn update_one(
        &self,
        conn: &Connection,
        filter: &Filter,
        update: &UpdateOps,
    ) -> Result<usize, DatabaseError> {
        if update.is_empty() {
            return Ok(0);
        }
        let mut params = Vec::new();
        let set_sql = update.to_sql("doc", &mut params)?;
        let where_sql = filter.to_sql(Scope::table("doc", "id"), &mut params)?;
        let sql = format!(
            "UPDATE {t} SET doc = {set_sql} WHERE rowid = (SELECT rowid FROM {t} WHERE {where_sql} LIMIT 1)",
            t = T::COLLECTION
        );
        Ok(conn.execute(&sql, params_from_iter(params))?)
    }

    pub fn delete_one(&self, conn: &Connection, filter: &Filter) -> Result<usize, DatabaseError> {
        let mut params = Vec::new();
        let where_sql = filter.to_sql(Scope::table("doc", "id"), &mut params)?;
        let sql = format!(
            "DELETE FROM {t} WHERE rowid = (SELECT rowid FROM {t} WHERE {where_sql} LIMIT 1)",
            t = T::COLLECTION
        );
        Ok(conn.execute(&sql, params_from_iter(params))?)
    }

    pub fn delete_many(&self, conn: &Connection, filter: &Filter) -> Result<usize, DatabaseError> {
        let mut params = Vec::new();
        let where_sql = filter.to_sql(Scope::table("doc", "id"), &mut params)?;
        let sql = format!("DELETE FROM {} WHERE {where_sql}", T::COLLECTION);
        Ok(conn.execute(&sql, params_from_iter(params))?)
    }

    /// Run a read-only join pipeline rooted at this collection and decode
    /// each joined row as `R`. No matching rows is an empty result.
    pub fn aggregate<R: DeserializeOwned>(
        &self,
        conn: &Connection,
        aggregation: &Aggregation,
    ) -> Result<Vec<R>, DatabaseError> {
        let mut params = Vec::new();
        let mut shape = String::from("b.doc");
        let mut joins = String::new();

        if !aggregation.lookups.is_empty() {
            let mut sets = Vec::with_capacity(aggregation.lookups.len());
            for (i, lookup) in aggregation.lookups.iter().enumerate() {
                let alias = format!("j{i}");
                let foreign = if lookup.foreign_field == "id" {
                    format!("{alias}.id")
                } else {
                    format!("json_extract({alias}.doc, {})", json_path(lookup.foreign_field)?)
                };
                let local = if lookup.local_field == "id" {
                    "b.id".to_string()
                } else {
                    format!("json_extract(b.doc, {})", json_path(lookup.local_field)?)
                };
                joins.push_str(&format!(
                    " {} JOIN {} AS {alias} ON {foreign} = {local}",
                    if lookup.required { "INNER" } else { "LEFT" },
                    lookup.from
                ));
                sets.push(format!("{}, json({alias}.doc)", json_path(lookup.as_field)?));
            }
            shape = format!("json_set(b.doc, {})", sets.join(", "));
        }

        let base_where = aggregation
            .filter
            .to_sql(Scope::table("b.doc", "b.id"), &mut params)?;
        let outer = Scope::document("doc");
        let post_where = aggregation.post_filter.to_sql(outer, &mut params)?;
        let sql = format!(
            "SELECT doc FROM (SELECT {shape} AS doc FROM {base} AS b{joins} WHERE {base_where}) \
             WHERE {post_where}{tail}",
            base = T::COLLECTION,
            tail = aggregation.options.to_sql(outer)?
        );
        query_documents(conn, &sql, params)
    }
}

fn query_documents<R: DeserializeOwned>(
    conn: &Connection,
    sql: &str,
    params: Vec<SqlValue>,
) -> Result<Vec<R>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params_from_iter(params), |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    rows.iter()
        .map(|json| serde_json::from_str(json).map_err(DatabaseError::from))
        .collect()
}
