//! SQLite board database utilities.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` so a TUI reader and a CLI writer can share the file
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON` so relation, label and comment rows cannot outlive
//!   their task, and a column cannot be dropped while it still holds tasks
//!
//! The per-entity stores in the submodules are thin, typed wrappers over
//! single statements. They return `anyhow::Result` with query context and
//! never enforce cross-row invariants; that is the job of
//! [`crate::graph`], [`crate::board`] and [`crate::service`].

pub mod columns;
pub mod comments;
pub mod labels;
pub mod migrations;
pub mod projects;
pub mod relations;
pub mod schema;
pub mod tasks;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

/// Busy timeout used for board DB connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the board database, apply runtime pragmas, and migrate
/// the schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create board db directory {}", parent.display()))?;
        }
    }

    let mut conn =
        Connection::open(path).with_context(|| format!("open board database {}", path.display()))?;

    configure_connection(&conn).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply board migrations")?;

    Ok(conn)
}

/// Open the database only if the file already exists.
///
/// Read-only commands use this so they do not silently create an empty
/// board in the wrong place.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be opened or migrated.
pub fn try_open_db(path: &Path) -> Result<Option<Connection>> {
    if !path.exists() {
        return Ok(None);
    }
    open_db(path).map(Some)
}

/// Fresh in-memory database with the full schema. Used by tests and by
/// callers that want a scratch board.
///
/// # Errors
///
/// Returns an error if configuring or migrating fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory board database")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("enable foreign keys")?;
    migrations::migrate(&mut conn).context("apply board migrations")?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

/// Run `f` inside a transaction, or inside the caller's when one is open.
///
/// Composite operations (deleting a project deletes its tasks) reuse the
/// single-entity paths, so nested calls join the outer transaction instead
/// of failing on a second `BEGIN`.
pub(crate) fn atomically<T, E>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> std::result::Result<T, E>,
) -> std::result::Result<T, E>
where
    E: From<rusqlite::Error>,
{
    if !conn.is_autocommit() {
        return f(conn);
    }
    let tx = conn.unchecked_transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Current wall-clock time in microseconds since the Unix epoch.
pub(crate) fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

/// Case-insensitive name comparison with full Unicode case folding.
///
/// SQLite's `NOCASE` only folds ASCII, so name lookups filter in Rust.
pub(crate) fn same_name(stored: &str, wanted: &str) -> bool {
    stored.to_lowercase() == wanted.trim().to_lowercase()
}

/// `LIMIT`/`OFFSET` suffix for paged queries.
pub(crate) fn limit_clause(limit: Option<u32>, offset: Option<u32>) -> String {
    match (limit, offset) {
        (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
        (Some(limit), None) => format!(" LIMIT {limit}"),
        (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_BUSY_TIMEOUT, limit_clause, open_db, open_in_memory, try_open_db};
    use crate::db::migrations;
    use tempfile::TempDir;

    fn temp_db_path() -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("nested").join("lanes.db");
        (dir, path)
    }

    #[test]
    fn open_db_sets_wal_busy_timeout_and_fk() {
        let (_dir, path) = temp_db_path();
        let conn = open_db(&path).expect("open board db");

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("query journal_mode");
        assert_eq!(journal_mode.to_ascii_lowercase(), "wal");

        let busy_timeout_ms: u64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .expect("query busy_timeout");
        assert_eq!(
            u128::from(busy_timeout_ms),
            DEFAULT_BUSY_TIMEOUT.as_millis()
        );

        let foreign_keys: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("query foreign_keys");
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn open_db_runs_migrations() {
        let (_dir, path) = temp_db_path();
        let conn = open_db(&path).expect("open board db");

        let version = migrations::current_schema_version(&conn).expect("schema version query");
        assert_eq!(version, migrations::LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn try_open_db_does_not_create_missing_file() {
        let (_dir, path) = temp_db_path();
        assert!(try_open_db(&path).expect("try open").is_none());
        assert!(!path.exists());

        drop(open_db(&path).expect("create"));
        assert!(try_open_db(&path).expect("reopen").is_some());
    }

    #[test]
    fn in_memory_db_enforces_foreign_keys() {
        let conn = open_in_memory().expect("in-memory db");
        let inserted = conn.execute(
            "INSERT INTO tasks (column_id, title, position, created_at_us, updated_at_us)
             VALUES (99, 'orphan', 0, 0, 0)",
            [],
        );
        assert!(inserted.is_err());
    }

    #[test]
    fn atomically_rolls_back_and_nests() {
        let conn = open_in_memory().expect("in-memory db");

        let failed: Result<(), rusqlite::Error> = super::atomically(&conn, |tx| {
            tx.execute("INSERT INTO projects (name, created_at_us) VALUES ('a', 0)", [])?;
            tx.execute("INSERT INTO projects (name, created_at_us) VALUES ('A', 0)", [])?;
            Ok(())
        });
        assert!(failed.is_err());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0, "first insert rolled back");

        let nested: Result<(), rusqlite::Error> = super::atomically(&conn, |outer| {
            outer.execute("INSERT INTO projects (name, created_at_us) VALUES ('a', 0)", [])?;
            super::atomically(outer, |inner| {
                inner.execute("INSERT INTO projects (name, created_at_us) VALUES ('b', 0)", [])?;
                Ok(())
            })
        });
        assert!(nested.is_ok());
        assert!(conn.is_autocommit());
    }

    #[test]
    fn limit_clause_variants() {
        assert_eq!(limit_clause(None, None), "");
        assert_eq!(limit_clause(Some(5), None), " LIMIT 5");
        assert_eq!(limit_clause(None, Some(2)), " LIMIT -1 OFFSET 2");
        assert_eq!(limit_clause(Some(5), Some(10)), " LIMIT 5 OFFSET 10");
    }
}
