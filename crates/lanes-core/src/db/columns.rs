//! Column rows and their chain pointers.
//!
//! Only single-row reads and writes live here. Splicing a column into (or
//! out of) its project's chain touches up to three rows and is coordinated
//! by [`crate::board::columns`].

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{now_us, same_name};
use crate::model::{Column, ColumnId, ColumnRole, ColumnRoles, ProjectId};

const COLUMN_COLUMNS: &str = "id, project_id, name, prev_id, next_id, \
                              holds_ready, holds_in_progress, holds_completed, created_at_us";

fn row_to_column(row: &Row<'_>) -> rusqlite::Result<Column> {
    Ok(Column {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        prev_id: row.get(3)?,
        next_id: row.get(4)?,
        roles: ColumnRoles {
            ready: row.get(5)?,
            in_progress: row.get(6)?,
            completed: row.get(7)?,
        },
        created_at_us: row.get(8)?,
    })
}

/// Insert an unlinked column row (both pointers NULL, no roles).
///
/// # Errors
///
/// Returns an error if the insert fails (including a duplicate name).
pub fn insert_column_row(conn: &Connection, project_id: ProjectId, name: &str) -> Result<Column> {
    let created_at_us = now_us();
    conn.execute(
        "INSERT INTO columns (project_id, name, created_at_us) VALUES (?1, ?2, ?3)",
        params![project_id, name, created_at_us],
    )
    .with_context(|| format!("insert column '{name}' into project {project_id}"))?;

    Ok(Column {
        id: ColumnId(conn.last_insert_rowid()),
        project_id,
        name: name.to_string(),
        prev_id: None,
        next_id: None,
        roles: ColumnRoles::none(),
        created_at_us,
    })
}

/// Fetch a column by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_column(conn: &Connection, id: ColumnId) -> Result<Option<Column>> {
    let sql = format!("SELECT {COLUMN_COLUMNS} FROM columns WHERE id = ?1");
    conn.query_row(&sql, params![id], row_to_column)
        .optional()
        .with_context(|| format!("get_column for {id}"))
}

/// Every column of a project in id order (not chain order).
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_project_columns(conn: &Connection, project_id: ProjectId) -> Result<Vec<Column>> {
    let sql = format!("SELECT {COLUMN_COLUMNS} FROM columns WHERE project_id = ?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql).context("prepare list_project_columns")?;
    let rows = stmt
        .query_map(params![project_id], row_to_column)
        .context("execute list_project_columns")?;

    let mut columns = Vec::new();
    for row in rows {
        columns.push(row.context("read column row")?);
    }
    Ok(columns)
}

/// Case-insensitive lookup of a column by name within a project.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_column_by_name(
    conn: &Connection,
    project_id: ProjectId,
    name: &str,
) -> Result<Option<Column>> {
    Ok(list_project_columns(conn, project_id)
        .with_context(|| format!("find_column_by_name for '{name}'"))?
        .into_iter()
        .find(|column| same_name(&column.name, name)))
}

/// The column of a project flagged with `role`, if any.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn role_column(
    conn: &Connection,
    project_id: ProjectId,
    role: ColumnRole,
) -> Result<Option<Column>> {
    let sql = format!(
        "SELECT {COLUMN_COLUMNS} FROM columns WHERE project_id = ?1 AND {} = 1",
        role.flag_column()
    );
    conn.query_row(&sql, params![project_id], row_to_column)
        .optional()
        .with_context(|| format!("role_column {role} for project {project_id}"))
}

/// Overwrite both chain pointers of a column.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_links(
    conn: &Connection,
    id: ColumnId,
    prev_id: Option<ColumnId>,
    next_id: Option<ColumnId>,
) -> Result<()> {
    conn.execute(
        "UPDATE columns SET prev_id = ?2, next_id = ?3 WHERE id = ?1",
        params![id, prev_id, next_id],
    )
    .with_context(|| format!("update links of column {id}"))?;
    Ok(())
}

/// Rename a column. Returns `false` if no row matched.
///
/// # Errors
///
/// Returns an error if the update fails (including a duplicate name).
pub fn rename_column(conn: &Connection, id: ColumnId, name: &str) -> Result<bool> {
    let changed = conn
        .execute("UPDATE columns SET name = ?2 WHERE id = ?1", params![id, name])
        .with_context(|| format!("rename column {id}"))?;
    Ok(changed > 0)
}

/// Clear `role` on every column of the project. Returns rows changed.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn clear_role(conn: &Connection, project_id: ProjectId, role: ColumnRole) -> Result<usize> {
    let flag = role.flag_column();
    let sql = format!("UPDATE columns SET {flag} = 0 WHERE project_id = ?1 AND {flag} = 1");
    conn.execute(&sql, params![project_id])
        .with_context(|| format!("clear role {role} in project {project_id}"))
}

/// Set the `role` flag on one column.
///
/// # Errors
///
/// Returns an error if the update fails, including when another column of
/// the project still holds the role.
pub fn set_role_flag(conn: &Connection, id: ColumnId, role: ColumnRole, value: bool) -> Result<()> {
    let sql = format!("UPDATE columns SET {} = ?2 WHERE id = ?1", role.flag_column());
    conn.execute(&sql, params![id, value])
        .with_context(|| format!("set role {role}={value} on column {id}"))?;
    Ok(())
}

/// Delete a column row. Returns `false` if no row matched.
///
/// # Errors
///
/// Returns an error if the delete fails (for example tasks still reference it).
pub fn delete_column_row(conn: &Connection, id: ColumnId) -> Result<bool> {
    let changed = conn
        .execute("DELETE FROM columns WHERE id = ?1", params![id])
        .with_context(|| format!("delete column {id}"))?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, projects::insert_project};

    #[test]
    fn insert_starts_unlinked_without_roles() -> Result<()> {
        let conn = open_in_memory()?;
        let project = insert_project(&conn, "p", "")?;
        let column = insert_column_row(&conn, project.id, "Todo")?;

        let stored = get_column(&conn, column.id)?.expect("column exists");
        assert_eq!(stored, column);
        assert!(stored.is_head() && stored.is_tail());
        assert_eq!(stored.roles, ColumnRoles::none());
        Ok(())
    }

    #[test]
    fn links_roles_and_lookup() -> Result<()> {
        let conn = open_in_memory()?;
        let project = insert_project(&conn, "p", "")?;
        let a = insert_column_row(&conn, project.id, "Todo")?;
        let b = insert_column_row(&conn, project.id, "Done")?;

        update_links(&conn, a.id, None, Some(b.id))?;
        update_links(&conn, b.id, Some(a.id), None)?;
        set_role_flag(&conn, b.id, ColumnRole::Completed, true)?;

        let done = role_column(&conn, project.id, ColumnRole::Completed)?.expect("done role");
        assert_eq!(done.id, b.id);
        assert_eq!(done.prev_id, Some(a.id));
        assert!(role_column(&conn, project.id, ColumnRole::Ready)?.is_none());

        let found = find_column_by_name(&conn, project.id, "tODO")?.expect("by name");
        assert_eq!(found.next_id, Some(b.id));

        assert_eq!(clear_role(&conn, project.id, ColumnRole::Completed)?, 1);
        assert!(role_column(&conn, project.id, ColumnRole::Completed)?.is_none());
        Ok(())
    }

    #[test]
    fn names_are_unique_per_project_only() -> Result<()> {
        let conn = open_in_memory()?;
        let p1 = insert_project(&conn, "p1", "")?;
        let p2 = insert_project(&conn, "p2", "")?;
        insert_column_row(&conn, p1.id, "Todo")?;
        assert!(insert_column_row(&conn, p1.id, "todo").is_err());
        insert_column_row(&conn, p2.id, "Todo")?;
        assert_eq!(list_project_columns(&conn, p1.id)?.len(), 1);
        Ok(())
    }
}
