//! Dense task ordering within a column.
//!
//! Positions in a column are always `0..n`. Every operation here either
//! preserves that or fails before writing.

use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use super::{column_in_scope, task_in_scope};
use crate::context::OpContext;
use crate::db::{self, tasks as store};
use crate::error::{LanesError, Result};
use crate::model::{ColumnId, Task, TaskId};

/// Result of a relocation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    Moved {
        task: TaskId,
        from: ColumnId,
        to: ColumnId,
        position: i64,
    },
    /// The task was already in the target column; nothing changed.
    AlreadyIn { task: TaskId, column: ColumnId },
}

impl MoveOutcome {
    #[must_use]
    pub const fn moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }

    #[must_use]
    pub const fn column(&self) -> ColumnId {
        match self {
            Self::Moved { to, .. } => *to,
            Self::AlreadyIn { column, .. } => *column,
        }
    }
}

/// Position a task appended to `column` would take.
///
/// # Errors
///
/// Storage failures.
pub fn append_position(conn: &Connection, column: ColumnId) -> Result<i64> {
    Ok(store::count_in_column(conn, column)?)
}

/// Exchange a task with the one just above it.
///
/// # Errors
///
/// [`LanesError::AlreadyFirst`] at position 0; positions are unchanged.
pub fn swap_up(conn: &Connection, ctx: &OpContext, id: TaskId) -> Result<Task> {
    let task = task_in_scope(conn, ctx, id)?;
    if task.position == 0 {
        return Err(LanesError::AlreadyFirst(id));
    }
    swap_with(conn, ctx, task, -1)
}

/// Exchange a task with the one just below it.
///
/// # Errors
///
/// [`LanesError::AlreadyLast`] at the last position; positions are unchanged.
pub fn swap_down(conn: &Connection, ctx: &OpContext, id: TaskId) -> Result<Task> {
    let task = task_in_scope(conn, ctx, id)?;
    let count = store::count_in_column(conn, task.column_id)?;
    if task.position + 1 >= count {
        return Err(LanesError::AlreadyLast(id));
    }
    swap_with(conn, ctx, task, 1)
}

fn swap_with(conn: &Connection, ctx: &OpContext, mut task: Task, offset: i64) -> Result<Task> {
    let target = task.position + offset;
    let neighbour = store::task_at_position(conn, task.column_id, target)?.ok_or_else(|| {
        LanesError::CorruptChain(format!(
            "column {} has no task at position {target}",
            task.column_id
        ))
    })?;

    db::atomically(conn, |tx| -> Result<()> {
        ctx.check("swap task positions")?;
        store::set_position(tx, neighbour.id, task.position)?;
        store::set_position(tx, task.id, target)?;
        Ok(())
    })?;

    debug!(task = %task.id, other = %neighbour.id, from = task.position, to = target, "swapped tasks");
    task.position = target;
    Ok(task)
}

/// Relocate a task to the end of `target`.
///
/// Moving to the current column is a no-op. Otherwise the source column is
/// renumbered to close the gap and the task is appended to the target, in
/// one transaction.
///
/// # Errors
///
/// Lookup failures, [`LanesError::CrossProject`] for a foreign column,
/// interruption, or storage failures.
pub fn move_to_column(
    conn: &Connection,
    ctx: &OpContext,
    id: TaskId,
    target: ColumnId,
) -> Result<MoveOutcome> {
    let task = task_in_scope(conn, ctx, id)?;
    let target = column_in_scope(conn, ctx, target)?;
    if task.column_id == target.id {
        return Ok(MoveOutcome::AlreadyIn {
            task: id,
            column: target.id,
        });
    }
    relocate(conn, ctx, &task, target.id)
}

pub(crate) fn relocate(
    conn: &Connection,
    ctx: &OpContext,
    task: &Task,
    target: ColumnId,
) -> Result<MoveOutcome> {
    let position = db::atomically(conn, |tx| -> Result<i64> {
        ctx.check("close source gap")?;
        store::close_gap(tx, task.column_id, task.position)?;
        ctx.check("append to target column")?;
        let position = store::count_in_column(tx, target)?;
        store::relocate(tx, task.id, target, position)?;
        Ok(position)
    })?;

    debug!(task = %task.id, from = %task.column_id, to = %target, position, "moved task");
    Ok(MoveOutcome::Moved {
        task: task.id,
        from: task.column_id,
        to: target,
        position,
    })
}

/// Move a task into the column after its current one.
///
/// # Errors
///
/// [`LanesError::NoNextColumn`] when the task is in the tail column.
pub fn move_to_next(conn: &Connection, ctx: &OpContext, id: TaskId) -> Result<MoveOutcome> {
    let task = task_in_scope(conn, ctx, id)?;
    let column = column_in_scope(conn, ctx, task.column_id)?;
    let next = column.next_id.ok_or(LanesError::NoNextColumn)?;
    relocate(conn, ctx, &task, next)
}

/// Move a task into the column before its current one.
///
/// # Errors
///
/// [`LanesError::NoPrevColumn`] when the task is in the head column.
pub fn move_to_prev(conn: &Connection, ctx: &OpContext, id: TaskId) -> Result<MoveOutcome> {
    let task = task_in_scope(conn, ctx, id)?;
    let column = column_in_scope(conn, ctx, task.column_id)?;
    let prev = column.prev_id.ok_or(LanesError::NoPrevColumn)?;
    relocate(conn, ctx, &task, prev)
}
