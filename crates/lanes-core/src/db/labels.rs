//! Labels and their task attachments.

use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params};

use super::{now_us, same_name};
use crate::model::{Label, LabelId, ProjectId, TaskId};

fn row_to_label(row: &Row<'_>) -> rusqlite::Result<Label> {
    Ok(Label {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
    })
}

/// Case-insensitive lookup of a label within a project.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn find_label(conn: &Connection, project_id: ProjectId, name: &str) -> Result<Option<Label>> {
    Ok(list_project_labels(conn, project_id)
        .with_context(|| format!("find_label '{name}' in project {project_id}"))?
        .into_iter()
        .find(|label| same_name(&label.name, name)))
}

/// Every label of a project, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_project_labels(conn: &Connection, project_id: ProjectId) -> Result<Vec<Label>> {
    let mut stmt = conn
        .prepare("SELECT id, project_id, name FROM labels WHERE project_id = ?1 ORDER BY id ASC")
        .context("prepare list_project_labels")?;
    let rows = stmt
        .query_map(params![project_id], row_to_label)
        .context("execute list_project_labels")?;

    let mut labels = Vec::new();
    for row in rows {
        labels.push(row.context("read label row")?);
    }
    Ok(labels)
}


/// Return the project's label called `name`, creating it when missing.
///
/// # Errors
///
/// Returns an error if the lookup or insert fails.
pub fn ensure_label(conn: &Connection, project_id: ProjectId, name: &str) -> Result<Label> {
    if let Some(label) = find_label(conn, project_id, name)? {
        return Ok(label);
    }
    let name = name.trim();
    conn.execute(
        "INSERT INTO labels (project_id, name) VALUES (?1, ?2)",
        params![project_id, name],
    )
    .with_context(|| format!("insert label '{name}' into project {project_id}"))?;
    Ok(Label {
        id: LabelId(conn.last_insert_rowid()),
        project_id,
        name: name.to_string(),
    })
}

/// Attach a label to a task. Returns `false` when it was already attached.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn attach(conn: &Connection, task: TaskId, label: LabelId) -> Result<bool> {
    let changed = conn
        .execute(
            "INSERT OR IGNORE INTO task_labels (task_id, label_id, created_at_us)
             VALUES (?1, ?2, ?3)",
            params![task, label, now_us()],
        )
        .with_context(|| format!("attach label {label} to task {task}"))?;
    Ok(changed > 0)
}

/// Detach a label from a task. Returns `false` when it was not attached.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn detach(conn: &Connection, task: TaskId, label: LabelId) -> Result<bool> {
    let changed = conn
        .execute(
            "DELETE FROM task_labels WHERE task_id = ?1 AND label_id = ?2",
            params![task, label],
        )
        .with_context(|| format!("detach label {label} from task {task}"))?;
    Ok(changed > 0)
}

/// Remove every label attachment of a task. Returns rows removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn detach_all(conn: &Connection, task: TaskId) -> Result<usize> {
    conn.execute("DELETE FROM task_labels WHERE task_id = ?1", params![task])
        .with_context(|| format!("detach all labels from task {task}"))
}

/// Labels attached to a task, sorted by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn labels_for_task(conn: &Connection, task: TaskId) -> Result<Vec<Label>> {
    let mut stmt = conn
        .prepare(
            "SELECT l.id, l.project_id, l.name FROM labels l
             JOIN task_labels tl ON tl.label_id = l.id
             WHERE tl.task_id = ?1
             ORDER BY l.name",
        )
        .context("prepare labels_for_task")?;
    let rows = stmt
        .query_map(params![task], row_to_label)
        .context("execute labels_for_task")?;

    let mut labels = Vec::new();
    for row in rows {
        labels.push(row.context("read label row")?);
    }
    Ok(labels)
}

/// Delete every label of a project and its attachments.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_project_labels(conn: &Connection, project_id: ProjectId) -> Result<usize> {
    conn.execute(
        "DELETE FROM task_labels WHERE label_id IN (SELECT id FROM labels WHERE project_id = ?1)",
        params![project_id],
    )
    .context("delete project label attachments")?;
    conn.execute("DELETE FROM labels WHERE project_id = ?1", params![project_id])
        .with_context(|| format!("delete labels of project {project_id}"))
}
