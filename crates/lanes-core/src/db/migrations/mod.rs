//! SQLite schema migrations for the board database.

use super::schema;
use rusqlite::{Connection, types::Type};

/// One schema step, applied when `user_version` is below `version`.
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "core tables",
        sql: schema::MIGRATION_V1_SQL,
    },
    Migration {
        version: 2,
        name: "single holder per column role",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Latest schema version understood by this binary.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// The database's `PRAGMA user_version`.
///
/// # Errors
///
/// SQLite failures, or a negative or oversized stored version.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let raw: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(err)))
}

/// Bring the schema up to [`LATEST_SCHEMA_VERSION`], one transaction per
/// step. Steps at or below the stored version are skipped, and every DDL
/// statement is `IF NOT EXISTS`, so running this twice is harmless.
///
/// # Errors
///
/// The first failing step; earlier steps stay applied.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let start = current_schema_version(conn)?;
    let mut version = start;

    for step in MIGRATIONS.iter().filter(|m| m.version > start) {
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", i64::from(step.version))?;
        tx.execute(
            "UPDATE schema_meta SET schema_version = ?1, migrated_at_us = ?2 WHERE id = 1",
            [i64::from(step.version), super::now_us()],
        )?;
        tx.commit()?;
        tracing::debug!(version = step.version, name = step.name, "migrated board schema");
        version = step.version;
    }

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{LATEST_SCHEMA_VERSION, current_schema_version, migrate};
    use crate::db::schema;
    use rusqlite::{Connection, params};

    fn has_object(conn: &Connection, kind: &str, name: &str) -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = ?1 AND name = ?2",
            params![kind, name],
            |row| row.get(0),
        )
    }

    #[test]
    fn migrate_empty_db_to_latest() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        let applied = migrate(&mut conn)?;
        assert_eq!(applied, LATEST_SCHEMA_VERSION);
        assert_eq!(current_schema_version(&conn)?, LATEST_SCHEMA_VERSION);

        for table in schema::REQUIRED_TABLES {
            assert!(has_object(&conn, "table", table)?, "table {table}");
        }
        for index in schema::REQUIRED_INDEXES {
            assert!(has_object(&conn, "index", index)?, "index {index}");
        }

        Ok(())
    }

    #[test]
    fn migrate_is_idempotent() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);
        assert_eq!(migrate(&mut conn)?, LATEST_SCHEMA_VERSION);

        let (rows, recorded): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), MAX(schema_version) FROM schema_meta",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        assert_eq!(rows, 1);
        assert_eq!(recorded, i64::from(LATEST_SCHEMA_VERSION));

        Ok(())
    }

    #[test]
    fn v2_rejects_second_ready_column_in_same_project() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;
        migrate(&mut conn)?;

        conn.execute(
            "INSERT INTO projects (name, created_at_us) VALUES ('home', 0)",
            [],
        )?;
        conn.execute(
            "INSERT INTO columns (project_id, name, holds_ready, created_at_us)
             VALUES (1, 'Todo', 1, 0)",
            [],
        )?;
        let second = conn.execute(
            "INSERT INTO columns (project_id, name, holds_ready, created_at_us)
             VALUES (1, 'Backlog', 1, 0)",
            [],
        );
        assert!(second.is_err(), "second ready column must be rejected");

        // a column without the flag is fine
        conn.execute(
            "INSERT INTO columns (project_id, name, created_at_us) VALUES (1, 'Backlog', 0)",
            [],
        )?;
        Ok(())
    }

    #[test]
    fn migrate_upgrades_from_v1() -> rusqlite::Result<()> {
        let mut conn = Connection::open_in_memory()?;

        conn.execute_batch(schema::MIGRATION_V1_SQL)?;
        conn.pragma_update(None, "user_version", 1_i64)?;
        conn.execute(
            "INSERT INTO projects (name, created_at_us) VALUES ('home', 1)",
            [],
        )?;

        let applied = migrate(&mut conn)?;
        assert_eq!(applied, LATEST_SCHEMA_VERSION);
        let recorded: i64 =
            conn.query_row("SELECT schema_version FROM schema_meta WHERE id = 1", [], |row| {
                row.get(0)
            })?;
        assert_eq!(recorded, i64::from(LATEST_SCHEMA_VERSION));

        let projects: i64 = conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        assert_eq!(projects, 1);
        assert!(has_object(&conn, "index", "idx_columns_ready_role")?);

        Ok(())
    }
}
