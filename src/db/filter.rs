//! Query documents for collection handles.
//!
//! Filters, sorts and update operations address document fields by dotted
//! path (`results_statuses`, `user.external_id`) and compile to SQL over
//! SQLite's JSON functions. Paths are restricted to identifier characters
//! so they can be inlined as literals; inlined paths are what lets the
//! expression indexes declared at startup serve these queries.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use super::DatabaseError;

/// Where a compiled filter reads its document (and, when available, the
/// primary-key column) from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub doc: &'a str,
    pub id_column: Option<&'a str>,
}

impl<'a> Scope<'a> {
    pub fn table(doc: &'a str, id_column: &'a str) -> Self {
        Self {
            doc,
            id_column: Some(id_column),
        }
    }

    pub fn document(doc: &'a str) -> Self {
        Self { doc, id_column: None }
    }

    fn field(&self, path: &str) -> Result<String, DatabaseError> {
        match self.id_column {
            Some(column) if path == "id" => Ok(column.to_string()),
            _ => Ok(format!("json_extract({}, {})", self.doc, json_path(path)?)),
        }
    }
}

/// Validate a dotted field path and render it as a quoted JSON path literal.
pub(crate) fn json_path(path: &str) -> Result<String, DatabaseError> {
    let valid = !path.is_empty()
        && path.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if !valid {
        return Err(DatabaseError::Validation(format!("invalid field path '{path}'")));
    }
    Ok(format!("'$.{path}'"))
}

fn scalar(value: &Value) -> Result<SqlValue, DatabaseError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(*b as i64)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(SqlValue::Integer(i)),
            None => Ok(SqlValue::Real(n.as_f64().unwrap_or_default())),
        },
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Err(DatabaseError::Validation(
            "filters compare scalar values only".into(),
        )),
    }
}

// ═══════════════════════════════════════════
// Filter
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every document.
    #[default]
    All,
    /// Field equals value. `Value::Null` matches missing or null fields.
    Eq(String, Value),
    /// Field equals any of the values. An empty list matches nothing.
    In(String, Vec<Value>),
    /// Array field contains the scalar value.
    ArrayContains(String, Value),
    /// Some element of an array of objects has `field == value`.
    ElemMatch {
        array: String,
        field: String,
        value: Value,
    },
    /// Array field exists and has at least one element.
    NotEmpty(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(path: &str, value: impl Into<Value>) -> Self {
        Self::Eq(path.into(), value.into())
    }

    pub fn id(id: &str) -> Self {
        Self::eq("id", id)
    }

    pub fn is_in<V: Into<Value>>(path: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self::In(path.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn contains(path: &str, value: impl Into<Value>) -> Self {
        Self::ArrayContains(path.into(), value.into())
    }

    pub fn elem_match(array: &str, field: &str, value: impl Into<Value>) -> Self {
        Self::ElemMatch {
            array: array.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn not_empty(path: &str) -> Self {
        Self::NotEmpty(path.into())
    }

    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Self::All, f) | (f, Self::All) => f,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), f) => {
                left.push(f);
                Self::And(left)
            }
            (f, g) => Self::And(vec![f, g]),
        }
    }

    /// Render as a SQL boolean expression, pushing bound values onto `params`.
    pub(crate) fn to_sql(
        &self,
        scope: Scope<'_>,
        params: &mut Vec<SqlValue>,
    ) -> Result<String, DatabaseError> {
        match self {
            Self::All => Ok("1".into()),
            Self::Eq(path, value) => {
                let field = scope.field(path)?;
                match scalar(value)? {
                    SqlValue::Null => Ok(format!("{field} IS NULL")),
                    v => {
                        params.push(v);
                        Ok(format!("{field} = ?"))
                    }
                }
            }
            Self::In(path, values) => {
                if values.is_empty() {
                    return Ok("0".into());
                }
                let field = scope.field(path)?;
                let mut placeholders = Vec::with_capacity(values.len());
                for value in values {
                    params.push(scalar(value)?);
                    placeholders.push("?");
                }
                Ok(format!("{field} IN ({})", placeholders.join(", ")))
            }
            Self::ArrayContains(path, value) => {
                let array = json_path(path)?;
                params.push(scalar(value)?);
                Ok(format!(
                    "EXISTS (SELECT 1 FROM json_each({}, {array}) AS je WHERE je.value = ?)",
                    scope.doc
                ))
            }
            Self::ElemMatch { array, field, value } => {
                let array = json_path(array)?;
                let field = json_path(field)?;
                params.push(scalar(value)?);
                Ok(format!(
                    "EXISTS (SELECT 1 FROM json_each({}, {array}) AS je \
                     WHERE json_extract(je.value, {field}) = ?)",
                    scope.doc
                ))
            }
            Self::NotEmpty(path) => Ok(format!(
                "COALESCE(json_array_length({}, {}), 0) > 0",
                scope.doc,
                json_path(path)?
            )),
            Self::And(filters) => join(filters, " AND ", "1", scope, params),
            Self::Or(filters) => join(filters, " OR ", "0", scope, params),
        }
    }
}

fn join(
    filters: &[Filter],
    separator: &str,
    empty: &str,
    scope: Scope<'_>,
    params: &mut Vec<SqlValue>,
) -> Result<String, DatabaseError> {
    if filters.is_empty() {
        return Ok(empty.into());
    }
    let parts = filters
        .iter()
        .map(|f| f.to_sql(scope, params).map(|sql| format!("({sql})")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(separator))
}

// ═══════════════════════════════════════════
// Sorting and limits
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub path: String,
    pub descending: bool,
}

impl Sort {
    pub fn asc(path: &str) -> Self {
        Self {
            path: path.into(),
            descending: false,
        }
    }

    pub fn desc(path: &str) -> Self {
        Self {
            path: path.into(),
            descending: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Vec<Sort>,
    pub limit: Option<u32>,
}

impl FindOptions {
    pub fn sorted(sort: Sort) -> Self {
        Self {
            sort: vec![sort],
            limit: None,
        }
    }

    pub fn then(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render the `ORDER BY ... LIMIT ...` tail (possibly empty).
    pub(crate) fn to_sql(&self, scope: Scope<'_>) -> Result<String, DatabaseError> {
        let mut sql = String::new();
        if !self.sort.is_empty() {
            let keys = self
                .sort
                .iter()
                .map(|s| {
                    scope
                        .field(&s.path)
                        .map(|f| format!("{f} {}", if s.descending { "DESC" } else { "ASC" }))
                })
                .collect::<Result<Vec<_>, _>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        Ok(sql)
    }
}

// ═══════════════════════════════════════════
// Update operations
// ═══════════════════════════════════════════

/// `$set`-style field assignments applied in place by `update_one`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOps {
    sets: Vec<(String, Value)>,
}

impl UpdateOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.sets.push((path.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Render as a `json_set(doc, ...)` expression.
    pub(crate) fn to_sql(&self, doc: &str, params: &mut Vec<SqlValue>) -> Result<String, DatabaseError> {
        let mut sql = format!("json_set({doc}");
        for (path, value) in &self.sets {
            if path == "id" {
                return Err(DatabaseError::Validation("the id field cannot be updated".into()));
            }
            sql.push_str(&format!(", {}, json(?)", json_path(path)?));
            params.push(SqlValue::Text(serde_json::to_string(value)?));
        }
        sql.push(')');
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(filter: &Filter) -> (String, Vec<SqlValue>) {
        let mut params = Vec::new();
        let sql = filter.to_sql(Scope::table("doc", "id"), &mut params).unwrap();
        (sql, params)
    }

    #[test]
    fn eq_on_id_uses_primary_key_column() {
        let (sql, params) = compile(&Filter::id("abc"));
        assert_eq!(sql, "id = ?");
        assert_eq!(params, vec![SqlValue::Text("abc".into())]);
    }

    #[test]
    fn eq_on_field_uses_json_extract() {
        let (sql, _) = compile(&Filter::eq("county_id", "c1"));
        assert_eq!(sql, "json_extract(doc, '$.county_id') = ?");
    }

    #[test]
    fn eq_null_renders_is_null() {
        let (sql, params) = compile(&Filter::Eq("external_id".into(), Value::Null));
        assert_eq!(sql, "json_extract(doc, '$.external_id') IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn booleans_bind_as_integers() {
        let (_, params) = compile(&Filter::eq("processed", true));
        assert_eq!(params, vec![SqlValue::Integer(1)]);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let (sql, params) = compile(&Filter::In("order_number".into(), vec![]));
        assert_eq!(sql, "0");
        assert!(params.is_empty());
    }

    #[test]
    fn elem_match_scans_array_elements() {
        let (sql, params) = compile(&Filter::elem_match("statuses", "id", "s1"));
        assert!(sql.contains("json_each(doc, '$.statuses')"));
        assert!(sql.contains("json_extract(je.value, '$.id') = ?"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn and_flattens_and_drops_all() {
        let f = Filter::All
            .and(Filter::eq("a", 1))
            .and(Filter::eq("b", 2))
            .and(Filter::All);
        assert_eq!(f, Filter::And(vec![Filter::eq("a", 1), Filter::eq("b", 2)]));
    }

    #[test]
    fn rejects_injection_in_paths() {
        let mut params = Vec::new();
        let err = Filter::eq("a') OR 1=1 --", "x")
            .to_sql(Scope::document("doc"), &mut params)
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[test]
    fn rejects_structured_filter_values() {
        let mut params = Vec::new();
        let err = Filter::eq("a", serde_json::json!({"x": 1}))
            .to_sql(Scope::document("doc"), &mut params)
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[test]
    fn find_options_render_order_and_limit() {
        let opts = FindOptions::sorted(Sort::desc("date")).then(Sort::asc("id")).limit(5);
        let sql = opts.to_sql(Scope::table("doc", "id")).unwrap();
        assert_eq!(sql, " ORDER BY json_extract(doc, '$.date') DESC, id ASC LIMIT 5");
    }

    #[test]
    fn update_ops_refuse_to_touch_id() {
        let mut params = Vec::new();
        let err = UpdateOps::new().set("id", "x").to_sql("doc", &mut params).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[test]
    fn update_ops_bind_json_text() {
        let mut params = Vec::new();
        let sql = UpdateOps::new()
            .set("status", "rejected")
            .set("re_post", true)
            .to_sql("doc", &mut params)
            .unwrap();
        assert_eq!(sql, "json_set(doc, '$.status', json(?), '$.re_post', json(?))");
        assert_eq!(
            params,
            vec![SqlValue::Text("\"rejected\"".into()), SqlValue::Text("true".into())]
        );
    }
}
