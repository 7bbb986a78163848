//! Task comments.

use anyhow::{Context, Result};
use rusqlite::{Connection, Row, params};

use super::{limit_clause, now_us};
use crate::model::{Comment, TaskId};

fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        task_id: row.get(1)?,
        body: row.get(2)?,
        created_at_us: row.get(3)?,
    })
}

/// Append a comment to a task.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_comment(conn: &Connection, task: TaskId, body: &str) -> Result<Comment> {
    let created_at_us = now_us();
    conn.execute(
        "INSERT INTO comments (task_id, body, created_at_us) VALUES (?1, ?2, ?3)",
        params![task, body, created_at_us],
    )
    .with_context(|| format!("insert comment on task {task}"))?;
    Ok(Comment {
        id: conn.last_insert_rowid(),
        task_id: task,
        body: body.to_string(),
        created_at_us,
    })
}

/// Comments on a task, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn comments_for_task(
    conn: &Connection,
    task: TaskId,
    limit: Option<u32>,
    offset: Option<u32>,
) -> Result<Vec<Comment>> {
    let sql = format!(
        "SELECT id, task_id, body, created_at_us FROM comments WHERE task_id = ?1 \
         ORDER BY created_at_us DESC, id DESC{}",
        limit_clause(limit, offset)
    );
    let mut stmt = conn.prepare(&sql).context("prepare comments_for_task")?;
    let rows = stmt
        .query_map(params![task], row_to_comment)
        .context("execute comments_for_task")?;

    let mut comments = Vec::new();
    for row in rows {
        comments.push(row.context("read comment row")?);
    }
    Ok(comments)
}

/// Delete every comment on a task. Returns rows removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_comments_for_task(conn: &Connection, task: TaskId) -> Result<usize> {
    conn.execute("DELETE FROM comments WHERE task_id = ?1", params![task])
        .with_context(|| format!("delete comments of task {task}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::columns::insert_column_row;
    use crate::db::open_in_memory;
    use crate::db::projects::insert_project;
    use crate::db::tasks::{TaskRow, insert_task_row};
    use crate::model::{Priority, TaskType};

    #[test]
    fn newest_first_with_paging() -> Result<()> {
        let conn = open_in_memory()?;
        let project = insert_project(&conn, "p", "")?;
        let column = insert_column_row(&conn, project.id, "Todo")?;
        let task = insert_task_row(
            &conn,
            &TaskRow {
                column_id: column.id,
                title: "t",
                description: "",
                priority: Priority::default(),
                task_type: TaskType::default(),
                position: 0,
            },
        )?;

        for body in ["one", "two", "three"] {
            insert_comment(&conn, task.id, body)?;
        }

        let all = comments_for_task(&conn, task.id, None, None)?;
        let bodies: Vec<&str> = all.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["three", "two", "one"]);

        let page = comments_for_task(&conn, task.id, Some(1), Some(1))?;
        assert_eq!(page[0].body, "two");

        assert_eq!(delete_comments_for_task(&conn, task.id)?, 3);
        assert!(comments_for_task(&conn, task.id, None, None)?.is_empty());
        Ok(())
    }
}
