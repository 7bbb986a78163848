//! Project rows.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{now_us, same_name};
use crate::model::{Project, ProjectId};

const PROJECT_COLUMNS: &str = "id, name, description, created_at_us";

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at_us: row.get(3)?,
    })
}

/// Insert a project and return the stored row.
///
/// # Errors
///
/// Returns an error if the insert fails (including a duplicate name).
pub fn insert_project(conn: &Connection, name: &str, description: &str) -> Result<Project> {
    let created_at_us = now_us();
    conn.execute(
        "INSERT INTO projects (name, description, created_at_us) VALUES (?1, ?2, ?3)",
        params![name, description, created_at_us],
    )
    .with_context(|| format!("insert project '{name}'"))?;

    Ok(Project {
        id: ProjectId(conn.last_insert_rowid()),
        name: name.to_string(),
        description: description.to_string(),
        created_at_us,
    })
}

/// Fetch a project by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_project(conn: &Connection, id: ProjectId) -> Result<Option<Project>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
    conn.query_row(&sql, params![id], row_to_project)
        .optional()
        .with_context(|| format!("get_project for {id}"))
}

/// Fetch a project by name (case-insensitive).
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_project_by_name(conn: &Connection, name: &str) -> Result<Option<Project>> {
    Ok(list_projects(conn)
        .with_context(|| format!("find_project_by_name for '{name}'"))?
        .into_iter()
        .find(|project| same_name(&project.name, name)))
}


/// All projects, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_projects(conn: &Connection) -> Result<Vec<Project>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id ASC");
    let mut stmt = conn.prepare(&sql).context("prepare list_projects")?;
    let rows = stmt
        .query_map([], row_to_project)
        .context("execute list_projects")?;

    let mut projects = Vec::new();
    for row in rows {
        projects.push(row.context("read project row")?);
    }
    Ok(projects)
}

/// Rename a project. Returns `false` if no row matched.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn rename_project(conn: &Connection, id: ProjectId, name: &str) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE projects SET name = ?2 WHERE id = ?1",
            params![id, name],
        )
        .with_context(|| format!("rename project {id}"))?;
    Ok(changed > 0)
}

/// Delete the project row only. Callers remove columns, tasks and labels
/// first.
///
/// # Errors
///
/// Returns an error if the delete fails (for example a dangling column).
pub fn delete_project(conn: &Connection, id: ProjectId) -> Result<bool> {
    let changed = conn
        .execute("DELETE FROM projects WHERE id = ?1", params![id])
        .with_context(|| format!("delete project {id}"))?;
    Ok(changed > 0)
}
