use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use tracing;

use super::collection::create_collection;
use super::repository::declared_indexes;
use super::DatabaseError;

/// Every persisted collection. Names are stable; the integrity checklist
/// and the read pipeline address collections by these strings.
pub const COLLECTIONS: &[&str] = &[
    "counties",
    "testtypes",
    "rules",
    "symptomrules",
    "accessrules",
    "providers",
    "locations",
    "users",
    "ctests",
    "emanualtests",
    "ehistory",
    "estatus",
    "resources",
    "faq",
    "news",
    "uinoverrides",
    "appversions",
    "configs",
];

/// Schema version written by this build.
pub const SCHEMA_VERSION: i64 = 1;

/// Open a SQLite connection to the given path, creating parent directories,
/// collections and indexes as needed. Lock waits are bounded by `timeout`.
pub fn open_database(path: &Path, timeout: Duration) -> Result<Connection, DatabaseError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::StoreUnavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
    }
    let conn = Connection::open(path)?;
    conn.busy_timeout(timeout)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    // journal_mode returns a row, so it cannot go through execute_batch
    let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA synchronous=NORMAL;")?;
    Ok(())
}

/// Create missing collections and indexes, then record the schema version.
/// Safe to run on every open.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL
         );",
    )?;
    let current_version = get_current_version(conn);
    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    tracing::info!(from = current_version, to = SCHEMA_VERSION, "Running migration");
    let migrate = || -> Result<(), DatabaseError> {
        for name in COLLECTIONS {
            create_collection(conn, name)?;
        }
        for index in declared_indexes() {
            index.create(conn)?;
        }
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![SCHEMA_VERSION, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    };
    migrate().map_err(|e| DatabaseError::MigrationFailed {
        version: SCHEMA_VERSION,
        reason: e.to_string(),
    })
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap_or(0)
}

/// Count collection tables in the database (for verification)
pub fn count_collections(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' \
         AND name NOT LIKE 'sqlite_%' AND name != 'schema_version'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

/// Number of documents in each collection, in `COLLECTIONS` order.
pub fn collection_sizes(conn: &Connection) -> Result<Vec<(&'static str, i64)>, DatabaseError> {
    COLLECTIONS
        .iter()
        .map(|name| -> Result<(&'static str, i64), DatabaseError> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {name}"), [], |row| row.get(0))?;
            Ok((*name, n))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_initializes_all_collections() {
        let conn = open_memory_database().unwrap();
        assert_eq!(count_collections(&conn).unwrap(), COLLECTIONS.len() as i64);
    }

    #[test]
    fn schema_version_is_current() {
        let conn = open_memory_database().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn migration_idempotent() {
        let conn = open_memory_database().unwrap();
        // Run migrations again, should not error
        assert!(run_migrations(&conn).is_ok());
    }

    #[test]
    fn declared_indexes_exist() {
        let conn = open_memory_database().unwrap();
        for index in declared_indexes() {
            let found: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name = ?1",
                    [index.name()],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(found, 1, "missing index {}", index.name());
        }
    }

    #[test]
    fn file_database_uses_wal_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("health.db");
        let conn = open_database(&path, Duration::from_millis(500)).unwrap();
        let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)).unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert!(path.exists());
    }

    #[test]
    fn fresh_collections_are_empty() {
        let conn = open_memory_database().unwrap();
        let sizes = collection_sizes(&conn).unwrap();
        assert_eq!(sizes.len(), COLLECTIONS.len());
        assert!(sizes.iter().all(|(_, n)| *n == 0));
    }
}
