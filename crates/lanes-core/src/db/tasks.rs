//! Task rows, positions and paged task queries.
//!
//! Positions are stored verbatim; keeping them dense is the caller's job
//! (see [`crate::board::positions`]). The helpers here are the individual
//! statements that job is built from.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::{limit_clause, now_us};
use crate::model::{ColumnId, Priority, ProjectId, Task, TaskId, TaskType};

const TASK_COLUMNS: &str = "t.id, t.column_id, t.title, t.description, t.priority, t.task_type, \
                            t.position, t.created_at_us, t.updated_at_us";

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        column_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        priority: row.get(4)?,
        task_type: row.get(5)?,
        position: row.get(6)?,
        created_at_us: row.get(7)?,
        updated_at_us: row.get(8)?,
    })
}

/// Field values for a new task row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow<'a> {
    pub column_id: ColumnId,
    pub title: &'a str,
    pub description: &'a str,
    pub priority: Priority,
    pub task_type: TaskType,
    pub position: i64,
}

/// Filter criteria for task listings. Fields combine with AND.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Restrict to tasks whose column belongs to this project.
    pub project_id: Option<ProjectId>,
    /// Restrict to one column.
    pub column_id: Option<ColumnId>,
    /// Restrict to one priority.
    pub priority: Option<Priority>,
    /// Restrict to one task type.
    pub task_type: Option<TaskType>,
    /// Maximum number of results.
    pub limit: Option<u32>,
    /// Offset for pagination.
    pub offset: Option<u32>,
}

/// Insert a task row at an explicit position.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_task_row(conn: &Connection, row: &TaskRow<'_>) -> Result<Task> {
    let now = now_us();
    conn.execute(
        "INSERT INTO tasks (column_id, title, description, priority, task_type, position, \
         created_at_us, updated_at_us) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            row.column_id,
            row.title,
            row.description,
            row.priority,
            row.task_type,
            row.position,
            now
        ],
    )
    .with_context(|| format!("insert task '{}' into column {}", row.title, row.column_id))?;

    Ok(Task {
        id: TaskId(conn.last_insert_rowid()),
        column_id: row.column_id,
        title: row.title.to_string(),
        description: row.description.to_string(),
        priority: row.priority,
        task_type: row.task_type,
        position: row.position,
        created_at_us: now,
        updated_at_us: now,
    })
}

/// Fetch a task by id.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_task(conn: &Connection, id: TaskId) -> Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1");
    conn.query_row(&sql, params![id], row_to_task)
        .optional()
        .with_context(|| format!("get_task for {id}"))
}

/// Project that owns a task (through its column).
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn task_project(conn: &Connection, id: TaskId) -> Result<Option<ProjectId>> {
    conn.query_row(
        "SELECT c.project_id FROM tasks t JOIN columns c ON c.id = t.column_id WHERE t.id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("task_project for {id}"))
}

/// List tasks matching `filter`, ordered by column then position.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_tasks(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>> {
    let (where_clause, values) = filter_clause(filter);
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks t JOIN columns c ON c.id = t.column_id\
         {where_clause} ORDER BY t.column_id ASC, t.position ASC, t.id ASC{}",
        limit_clause(filter.limit, filter.offset)
    );

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare list_tasks query: {sql}"))?;
    let rows = stmt
        .query_map(params_from_iter(values), row_to_task)
        .context("execute list_tasks query")?;

    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row.context("read list_tasks row")?);
    }
    Ok(tasks)
}

/// Count tasks matching `filter` (ignores limit/offset).
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_tasks(conn: &Connection, filter: &TaskFilter) -> Result<u64> {
    let (where_clause, values) = filter_clause(filter);
    let sql = format!(
        "SELECT COUNT(*) FROM tasks t JOIN columns c ON c.id = t.column_id{where_clause}"
    );
    let count: i64 = conn
        .query_row(&sql, params_from_iter(values), |row| row.get(0))
        .with_context(|| format!("execute count_tasks: {sql}"))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

fn filter_clause(filter: &TaskFilter) -> (String, Vec<i64>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<i64> = Vec::new();

    if let Some(project_id) = filter.project_id {
        values.push(project_id.get());
        conditions.push(format!("c.project_id = ?{}", values.len()));
    }
    if let Some(column_id) = filter.column_id {
        values.push(column_id.get());
        conditions.push(format!("t.column_id = ?{}", values.len()));
    }
    if let Some(priority) = filter.priority {
        values.push(priority.level());
        conditions.push(format!("t.priority = ?{}", values.len()));
    }
    if let Some(task_type) = filter.task_type {
        // task types are a closed set of identifiers, safe to inline
        conditions.push(format!("t.task_type = '{task_type}'"));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    (where_clause, values)
}

/// Tasks of one column in position order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn tasks_in_column(conn: &Connection, column_id: ColumnId) -> Result<Vec<Task>> {
    list_tasks(
        conn,
        &TaskFilter {
            column_id: Some(column_id),
            ..TaskFilter::default()
        },
    )
}

/// Number of tasks in a column.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_in_column(conn: &Connection, column_id: ColumnId) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE column_id = ?1",
        params![column_id],
        |row| row.get(0),
    )
    .with_context(|| format!("count tasks in column {column_id}"))
}

/// The task at `position` in a column, if any.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn task_at_position(
    conn: &Connection,
    column_id: ColumnId,
    position: i64,
) -> Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.column_id = ?1 AND t.position = ?2");
    conn.query_row(&sql, params![column_id, position], row_to_task)
        .optional()
        .with_context(|| format!("task_at_position {position} in column {column_id}"))
}

/// Overwrite one task's position.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_position(conn: &Connection, id: TaskId, position: i64) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET position = ?2, updated_at_us = ?3 WHERE id = ?1",
        params![id, position, now_us()],
    )
    .with_context(|| format!("set position of task {id}"))?;
    Ok(())
}

/// Shift every task after `position` one slot up, closing the gap left by
/// a removed task. Returns rows changed.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn close_gap(conn: &Connection, column_id: ColumnId, position: i64) -> Result<usize> {
    conn.execute(
        "UPDATE tasks SET position = position - 1 WHERE column_id = ?1 AND position > ?2",
        params![column_id, position],
    )
    .with_context(|| format!("close position gap at {position} in column {column_id}"))
}

/// Point a task at a new column and position.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn relocate(conn: &Connection, id: TaskId, column_id: ColumnId, position: i64) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET column_id = ?2, position = ?3, updated_at_us = ?4 WHERE id = ?1",
        params![id, column_id, position, now_us()],
    )
    .with_context(|| format!("relocate task {id} to column {column_id}"))?;
    Ok(())
}

/// Overwrite the editable fields of a task.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_fields(
    conn: &Connection,
    id: TaskId,
    title: &str,
    description: &str,
    priority: Priority,
    task_type: TaskType,
) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET title = ?2, description = ?3, priority = ?4, task_type = ?5, \
         updated_at_us = ?6 WHERE id = ?1",
        params![id, title, description, priority, task_type, now_us()],
    )
    .with_context(|| format!("update fields of task {id}"))?;
    Ok(())
}

/// Delete a task row. Returns `false` if no row matched.
///
/// # Errors
///
/// Returns an error if the delete fails (for example edges still reference it).
pub fn delete_task_row(conn: &Connection, id: TaskId) -> Result<bool> {
    let changed = conn
        .execute("DELETE FROM tasks WHERE id = ?1", params![id])
        .with_context(|| format!("delete task {id}"))?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{columns::insert_column_row, open_in_memory, projects::insert_project};

    fn row(column_id: ColumnId, title: &str, position: i64) -> TaskRow<'_> {
        TaskRow {
            column_id,
            title,
            description: "",
            priority: Priority::default(),
            task_type: TaskType::default(),
            position,
        }
    }

    #[test]
    fn insert_and_read_back() -> Result<()> {
        let conn = open_in_memory()?;
        let project = insert_project(&conn, "p", "")?;
        let column = insert_column_row(&conn, project.id, "Todo")?;

        let task = insert_task_row(
            &conn,
            &TaskRow {
                priority: Priority::Urgent,
                task_type: TaskType::Bug,
                ..row(column.id, "Fix login", 0)
            },
        )?;
        assert_eq!(get_task(&conn, task.id)?, Some(task.clone()));
        assert_eq!(task_project(&conn, task.id)?, Some(project.id));
        assert_eq!(get_task(&conn, TaskId(999))?, None);
        Ok(())
    }

    #[test]
    fn filters_and_paging() -> Result<()> {
        let conn = open_in_memory()?;
        let p1 = insert_project(&conn, "p1", "")?;
        let p2 = insert_project(&conn, "p2", "")?;
        let todo = insert_column_row(&conn, p1.id, "Todo")?;
        let done = insert_column_row(&conn, p1.id, "Done")?;
        let other = insert_column_row(&conn, p2.id, "Todo")?;

        for (i, title) in ["a", "b", "c"].iter().enumerate() {
            insert_task_row(&conn, &row(todo.id, title, i64::try_from(i)?))?;
        }
        insert_task_row(
            &conn,
            &TaskRow {
                task_type: TaskType::Chore,
                ..row(done.id, "d", 0)
            },
        )?;
        insert_task_row(&conn, &row(other.id, "elsewhere", 0))?;

        let in_p1 = TaskFilter {
            project_id: Some(p1.id),
            ..TaskFilter::default()
        };
        assert_eq!(count_tasks(&conn, &in_p1)?, 4);

        let page = list_tasks(
            &conn,
            &TaskFilter {
                limit: Some(2),
                offset: Some(1),
                ..in_p1.clone()
            },
        )?;
        let titles: Vec<&str> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c"]);

        let chores = list_tasks(
            &conn,
            &TaskFilter {
                task_type: Some(TaskType::Chore),
                ..in_p1
            },
        )?;
        assert_eq!(chores.len(), 1);
        assert_eq!(chores[0].title, "d");
        Ok(())
    }

    #[test]
    fn close_gap_renumbers_tail_only() -> Result<()> {
        let conn = open_in_memory()?;
        let project = insert_project(&conn, "p", "")?;
        let column = insert_column_row(&conn, project.id, "Todo")?;
        let ids: Vec<TaskId> = (0..4)
            .map(|i| insert_task_row(&conn, &row(column.id, "t", i)).map(|t| t.id))
            .collect::<Result<_>>()?;

        assert!(delete_task_row(&conn, ids[1])?);
        assert_eq!(close_gap(&conn, column.id, 1)?, 2);

        let positions: Vec<(TaskId, i64)> = tasks_in_column(&conn, column.id)?
            .into_iter()
            .map(|t| (t.id, t.position))
            .collect();
        assert_eq!(positions, vec![(ids[0], 0), (ids[2], 1), (ids[3], 2)]);
        assert_eq!(count_in_column(&conn, column.id)?, 3);
        assert_eq!(task_at_position(&conn, column.id, 2)?.map(|t| t.id), Some(ids[3]));
        Ok(())
    }
}
