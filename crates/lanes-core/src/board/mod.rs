//! Column sequence and task ordering.
//!
//! - [`chain`]: in-memory arena for a project's column list
//! - [`columns`]: persisted column operations (splice, unsplice, roles)
//! - [`positions`]: dense per-column task ordering and relocation
//! - [`integrity`]: read-only checker for the invariants above

pub mod chain;
pub mod columns;
pub mod integrity;
pub mod positions;

use rusqlite::Connection;

use crate::context::OpContext;
use crate::db;
use crate::error::{LanesError, Result};
use crate::model::{Column, ColumnId, Project, ProjectId, Task, TaskId};
use crate::validate;

/// Load the context's project.
///
/// # Errors
///
/// [`LanesError::InvalidId`] for a non-positive id, [`LanesError::NotFound`]
/// when the project has been deleted or never existed.
pub fn project_in_scope(conn: &Connection, ctx: &OpContext) -> Result<Project> {
    let id = validate::id(ctx.project())?;
    db::projects::get_project(conn, id)?.ok_or(LanesError::not_found(ProjectId::LABEL, id.get()))
}

/// Load a column that must belong to the context's project.
///
/// # Errors
///
/// [`LanesError::InvalidId`] for a non-positive id, [`LanesError::NotFound`]
/// when the row is missing, [`LanesError::CrossProject`] when it belongs to
/// another project.
pub fn column_in_scope(conn: &Connection, ctx: &OpContext, id: ColumnId) -> Result<Column> {
    let id = validate::id(id)?;
    let column = db::columns::get_column(conn, id)?
        .ok_or(LanesError::not_found(ColumnId::LABEL, id.get()))?;
    if column.project_id != ctx.project() {
        return Err(LanesError::CrossProject {
            entity: ColumnId::LABEL,
            id: id.get(),
        });
    }
    Ok(column)
}

/// Load a task that must belong to the context's project.
///
/// # Errors
///
/// Same as [`column_in_scope`], for tasks.
pub fn task_in_scope(conn: &Connection, ctx: &OpContext, id: TaskId) -> Result<Task> {
    let id = validate::id(id)?;
    let task =
        db::tasks::get_task(conn, id)?.ok_or(LanesError::not_found(TaskId::LABEL, id.get()))?;
    let project = db::tasks::task_project(conn, id)?;
    if project != Some(ctx.project()) {
        return Err(LanesError::CrossProject {
            entity: TaskId::LABEL,
            id: id.get(),
        });
    }
    Ok(task)
}
