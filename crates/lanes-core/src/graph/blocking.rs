//! Blocked status and the derived task sets.
//!
//! # Overview
//!
//! A task is **blocked** iff it is the source of at least one
//! [`RelationKind::Blocking`] edge. Nothing else matters: where the blocker
//! sits on the board, or whether it is finished, does not clear the block.
//! Removing the edge does.
//!
//! - **Ready set**: tasks in the project's ready column that are not blocked.
//!   A project without a ready column has an empty ready set.
//! - **Blocked set**: every blocked task of the project, in board order
//!   (column id, then position), regardless of column.
//!
//! ParentChild and Related edges never affect either set.

#![allow(clippy::module_name_repetitions)]

use rusqlite::Connection;
use serde::Serialize;

use super::relations::RelationGraph;
use crate::board::{project_in_scope, task_in_scope};
use crate::context::OpContext;
use crate::db::{columns, relations, tasks};
use crate::error::Result;
use crate::model::{ColumnRole, RelationKind, Task, TaskId};

/// A blocked task together with the tasks it waits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedTask {
    pub task: Task,
    pub blockers: Vec<TaskId>,
}

/// `true` iff `task` is the source of a blocking edge.
///
/// # Errors
///
/// Scope or storage failures.
pub fn is_blocked(conn: &Connection, ctx: &OpContext, task: TaskId) -> Result<bool> {
    task_in_scope(conn, ctx, task)?;
    Ok(relations::has_edge_from(conn, task, RelationKind::Blocking)?)
}

/// Unblocked tasks of the ready column, in position order.
///
/// # Errors
///
/// [`crate::error::LanesError::NotFound`] for a missing project, or storage
/// failures.
pub fn ready_set(conn: &Connection, ctx: &OpContext) -> Result<Vec<Task>> {
    project_in_scope(conn, ctx)?;
    let Some(ready) = columns::role_column(conn, ctx.project(), ColumnRole::Ready)? else {
        tracing::trace!(project = %ctx.project(), "no ready column; ready set is empty");
        return Ok(Vec::new());
    };
    let graph = RelationGraph::load_project(conn, ctx.project())?;
    Ok(tasks::tasks_in_column(conn, ready.id)?
        .into_iter()
        .filter(|task| !graph.is_blocked(task.id))
        .collect())
}

/// Every blocked task of the project with its blockers.
///
/// # Errors
///
/// Storage failures.
pub fn blocked_set(conn: &Connection, ctx: &OpContext) -> Result<Vec<BlockedTask>> {
    project_in_scope(conn, ctx)?;
    let graph = RelationGraph::load_project(conn, ctx.project())?;
    let blocked = graph.blocked_tasks();
    if blocked.is_empty() {
        return Ok(Vec::new());
    }

    let filter = tasks::TaskFilter {
        project_id: Some(ctx.project()),
        ..tasks::TaskFilter::default()
    };
    Ok(tasks::list_tasks(conn, &filter)?
        .into_iter()
        .filter(|task| blocked.contains(&task.id))
        .map(|task| BlockedTask {
            blockers: graph.blockers(task.id),
            task,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{columns as board_columns, positions};
    use crate::db::tasks::{TaskRow, insert_task_row};
    use crate::db::{open_in_memory, projects::insert_project};
    use crate::graph::add_edge;
    use crate::model::{ColumnId, ColumnRoles, Priority, TaskType};

    fn task(conn: &Connection, column: ColumnId, title: &str) -> TaskId {
        let position = positions::append_position(conn, column).expect("position");
        insert_task_row(
            conn,
            &TaskRow {
                column_id: column,
                title,
                description: "",
                priority: Priority::default(),
                task_type: TaskType::default(),
                position,
            },
        )
        .expect("task")
        .id
    }

    fn ids(tasks: &[Task]) -> Vec<TaskId> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn blocked_task_is_excluded_from_ready_set() {
        let conn = open_in_memory().expect("db");
        let project = insert_project(&conn, "p", "").expect("project");
        let ctx = OpContext::new(project.id);
        let todo = board_columns::insert_after(&conn, &ctx, "Todo", None, ColumnRoles::only(ColumnRole::Ready))
            .expect("todo");
        let t1 = task(&conn, todo.id, "T1");
        let t2 = task(&conn, todo.id, "T2");

        add_edge(&conn, &ctx, t1, t2, RelationKind::Blocking).expect("t1 waits on t2");

        assert_eq!(ids(&ready_set(&conn, &ctx).expect("ready")), vec![t2]);
        assert!(is_blocked(&conn, &ctx, t1).expect("t1"));
        assert!(!is_blocked(&conn, &ctx, t2).expect("t2"));

        let blocked = blocked_set(&conn, &ctx).expect("blocked");
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].task.id, t1);
        assert_eq!(blocked[0].blockers, vec![t2]);
    }

    #[test]
    fn non_blocking_kinds_do_not_block() {
        let conn = open_in_memory().expect("db");
        let project = insert_project(&conn, "p", "").expect("project");
        let ctx = OpContext::new(project.id);
        let todo = board_columns::insert_after(&conn, &ctx, "Todo", None, ColumnRoles::only(ColumnRole::Ready))
            .expect("todo");
        let a = task(&conn, todo.id, "a");
        let b = task(&conn, todo.id, "b");
        add_edge(&conn, &ctx, a, b, RelationKind::ParentChild).expect("parent");

        assert_eq!(ids(&ready_set(&conn, &ctx).expect("ready")), vec![a, b]);
        assert!(blocked_set(&conn, &ctx).expect("blocked").is_empty());
    }

    #[test]
    fn blocked_set_ignores_columns_and_ready_set_needs_a_ready_column() {
        let conn = open_in_memory().expect("db");
        let project = insert_project(&conn, "p", "").expect("project");
        let ctx = OpContext::new(project.id);
        let backlog =
            board_columns::insert_after(&conn, &ctx, "Backlog", None, ColumnRoles::none()).expect("backlog");
        let done = board_columns::insert_after(&conn, &ctx, "Done", None, ColumnRoles::none()).expect("done");
        let a = task(&conn, backlog.id, "a");
        let b = task(&conn, done.id, "b");
        add_edge(&conn, &ctx, b, a, RelationKind::Blocking).expect("b waits on a");

        assert!(ready_set(&conn, &ctx).expect("ready").is_empty());
        let blocked = blocked_set(&conn, &ctx).expect("blocked");
        assert_eq!(blocked.iter().map(|b| b.task.id).collect::<Vec<_>>(), vec![b]);
    }
}
