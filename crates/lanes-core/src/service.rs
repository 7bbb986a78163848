//! The engine's public surface.
//!
//! [`Board`] composes the relation graph, the column chain and task
//! positions into the operations adapters call. Each operation validates
//! everything it can before its first write, and multi-step writes run in a
//! single transaction, so a rejected or interrupted call leaves the board
//! exactly as it was.

use std::time::Duration;

use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::board::integrity::{self, IntegrityReport};
use crate::board::positions::{self, MoveOutcome};
use crate::board::{column_in_scope, columns, project_in_scope, task_in_scope};
use crate::context::OpContext;
use crate::db::{self, comments, labels, projects, relations, tasks};
use crate::error::{LanesError, Result};
use crate::graph::{self, blocking};
use crate::model::{
    Column, ColumnId, ColumnRole, ColumnRoles, Comment, Label, LabelId, Priority, Project,
    ProjectId, Relation, RelationKind, Task, TaskId, TaskType,
};
use crate::validate;

pub use crate::graph::Neighbours;
pub use crate::graph::blocking::BlockedTask;

/// Columns a new project starts with, head to tail.
pub const DEFAULT_COLUMNS: [(&str, ColumnRole); 3] = [
    ("Todo", ColumnRole::Ready),
    ("In Progress", ColumnRole::InProgress),
    ("Done", ColumnRole::Completed),
];

/// Fields and relation requests for a new task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    /// Target column; defaults to the ready column, then the head column.
    pub column: Option<ColumnId>,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub task_type: TaskType,
    /// Each `p` adds `p → new` (parent/child).
    pub parent_ids: Vec<TaskId>,
    /// Each `b` adds `new → b` (blocking): the new task waits on `b`.
    pub blocked_by_ids: Vec<TaskId>,
    /// Each `k` adds `k → new` (blocking): `k` waits on the new task.
    pub blocks_ids: Vec<TaskId>,
}

impl NewTask {
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Field edits; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub task_type: Option<TaskType>,
}

/// A task with everything attached to it.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetails {
    pub task: Task,
    pub column: Column,
    pub blocked: bool,
    pub relations: Vec<Relation>,
    pub neighbours: Neighbours,
    pub labels: Vec<Label>,
    pub comments: Vec<Comment>,
}

/// Engine handle over one connection.
#[derive(Debug, Clone, Copy)]
pub struct Board<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Board<'conn> {
    #[must_use]
    pub const fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    #[must_use]
    pub const fn conn(&self) -> &'conn Connection {
        self.conn
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Create an empty project.
    ///
    /// # Errors
    ///
    /// Validation errors or [`LanesError::DuplicateName`].
    pub fn create_project(&self, name: &str, description: &str) -> Result<Project> {
        let name = validate::name("project name", name)?;
        let description = validate::description(description)?;
        if projects::find_project_by_name(self.conn, name)?.is_some() {
            return Err(LanesError::DuplicateName {
                entity: ProjectId::LABEL,
                name: name.to_string(),
            });
        }
        let project = projects::insert_project(self.conn, name, description)?;
        debug!(project = %project.id, name = %project.name, "created project");
        Ok(project)
    }

    /// Create a project with the [`DEFAULT_COLUMNS`] and their roles. The
    /// column inserts run under a context for the new project that expires
    /// after `timeout`.
    ///
    /// # Errors
    ///
    /// As [`Board::create_project`]; nothing is written on error.
    pub fn create_project_with_defaults(
        &self,
        name: &str,
        description: &str,
        timeout: Duration,
    ) -> Result<Project> {
        db::atomically(self.conn, |tx| -> Result<Project> {
            let board = Board::new(tx);
            let project = board.create_project(name, description)?;
            let ctx = OpContext::with_timeout(project.id, timeout);
            for (column, role) in DEFAULT_COLUMNS {
                columns::insert_after(tx, &ctx, column, None, ColumnRoles::only(role))?;
            }
            Ok(project)
        })
    }

    /// # Errors
    ///
    /// Storage failures.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(projects::list_projects(self.conn)?)
    }

    /// # Errors
    ///
    /// [`LanesError::NotFound`] when no such project exists.
    pub fn get_project(&self, id: ProjectId) -> Result<Project> {
        let id = validate::id(id)?;
        projects::get_project(self.conn, id)?
            .ok_or(LanesError::not_found(ProjectId::LABEL, id.get()))
    }

    /// Resolve a project by numeric id or case-insensitive name.
    ///
    /// # Errors
    ///
    /// [`LanesError::NameNotFound`] when nothing matches.
    pub fn find_project(&self, key: &str) -> Result<Project> {
        if let Ok(id) = key.parse::<ProjectId>() {
            if let Some(project) = projects::get_project(self.conn, id)? {
                return Ok(project);
            }
        }
        projects::find_project_by_name(self.conn, key)?.ok_or_else(|| LanesError::NameNotFound {
            entity: ProjectId::LABEL,
            name: key.trim().to_string(),
        })
    }

    /// Delete the context's project with everything it owns: tasks through
    /// the task-deletion path, then columns tail first, then labels.
    ///
    /// # Errors
    ///
    /// Lookup, interruption, or storage failures. Nothing is removed on error.
    pub fn delete_project(&self, ctx: &OpContext) -> Result<Project> {
        let project = project_in_scope(self.conn, ctx)?;
        db::atomically(self.conn, |tx| -> Result<()> {
            let board = Board::new(tx);
            let filter = tasks::TaskFilter {
                project_id: Some(project.id),
                ..tasks::TaskFilter::default()
            };
            for task in tasks::list_tasks(tx, &filter)? {
                board.delete_task(ctx, task.id)?;
            }
            for column in columns::list(tx, ctx)?.into_iter().rev() {
                columns::remove(tx, ctx, column.id)?;
            }
            ctx.check("delete project labels")?;
            labels::delete_project_labels(tx, project.id)?;
            projects::delete_project(tx, project.id)?;
            Ok(())
        })?;
        debug!(project = %project.id, "deleted project");
        Ok(project)
    }

    // -----------------------------------------------------------------------
    // Columns
    // -----------------------------------------------------------------------

    /// Create a column after `after`, or at the tail.
    ///
    /// # Errors
    ///
    /// See [`columns::insert_after`].
    pub fn create_column(
        &self,
        ctx: &OpContext,
        name: &str,
        after: Option<ColumnId>,
        roles: ColumnRoles,
    ) -> Result<Column> {
        columns::insert_after(self.conn, ctx, name, after, roles)
    }

    /// Remove an empty column. Its tasks must be moved or deleted first.
    ///
    /// # Errors
    ///
    /// See [`columns::remove`].
    pub fn delete_column(&self, ctx: &OpContext, id: ColumnId) -> Result<Column> {
        columns::remove(self.conn, ctx, id)
    }

    /// # Errors
    ///
    /// See [`columns::list`].
    pub fn list_columns(&self, ctx: &OpContext) -> Result<Vec<Column>> {
        columns::list(self.conn, ctx)
    }

    /// # Errors
    ///
    /// See [`columns::find_by_name`].
    pub fn find_column(&self, ctx: &OpContext, name: &str) -> Result<Column> {
        columns::find_by_name(self.conn, ctx, name)
    }

    /// # Errors
    ///
    /// See [`columns::rename`].
    pub fn rename_column(&self, ctx: &OpContext, id: ColumnId, name: &str) -> Result<Column> {
        columns::rename(self.conn, ctx, id, name)
    }

    /// # Errors
    ///
    /// See [`columns::set_role`].
    pub fn set_column_role(
        &self,
        ctx: &OpContext,
        role: ColumnRole,
        column: Option<ColumnId>,
    ) -> Result<Option<Column>> {
        columns::set_role(self.conn, ctx, role, column)
    }

    /// # Errors
    ///
    /// Lookup or storage failures.
    pub fn next_column(&self, ctx: &OpContext, id: ColumnId) -> Result<Option<Column>> {
        columns::next(self.conn, ctx, id)
    }

    /// # Errors
    ///
    /// Lookup or storage failures.
    pub fn prev_column(&self, ctx: &OpContext, id: ColumnId) -> Result<Option<Column>> {
        columns::prev(self.conn, ctx, id)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    fn default_column(&self, ctx: &OpContext) -> Result<Column> {
        if let Some(ready) = columns::role_column(self.conn, ctx, ColumnRole::Ready)? {
            return Ok(ready);
        }
        columns::list(self.conn, ctx)?
            .into_iter()
            .next()
            .ok_or(LanesError::NoRoleColumnConfigured(ColumnRole::Ready))
    }

    /// Append a task to a column and attach its requested relations.
    ///
    /// All-or-nothing: if any requested edge is rejected (unknown task,
    /// self-reference, cycle) the task row is rolled back with it.
    ///
    /// # Errors
    ///
    /// Validation, lookup, relation, interruption, or storage failures.
    pub fn create_task(&self, ctx: &OpContext, new: &NewTask) -> Result<Task> {
        let title = validate::title(&new.title)?;
        let description = validate::description(&new.description)?;
        let column = match new.column {
            Some(id) => column_in_scope(self.conn, ctx, id)?,
            None => self.default_column(ctx)?,
        };

        let task = db::atomically(self.conn, |tx| -> Result<Task> {
            ctx.check("insert task row")?;
            let position = positions::append_position(tx, column.id)?;
            let task = tasks::insert_task_row(
                tx,
                &tasks::TaskRow {
                    column_id: column.id,
                    title,
                    description,
                    priority: new.priority,
                    task_type: new.task_type,
                    position,
                },
            )?;

            let requested = new
                .parent_ids
                .iter()
                .map(|p| (*p, task.id, RelationKind::ParentChild))
                .chain(
                    new.blocked_by_ids
                        .iter()
                        .map(|b| (task.id, *b, RelationKind::Blocking)),
                )
                .chain(
                    new.blocks_ids
                        .iter()
                        .map(|k| (*k, task.id, RelationKind::Blocking)),
                );
            for (from, to, kind) in requested {
                graph::add_edge(tx, ctx, from, to, kind)?;
            }
            Ok(task)
        })?;

        debug!(task = %task.id, column = %task.column_id, position = task.position, "created task");
        Ok(task)
    }

    /// # Errors
    ///
    /// Validation, lookup, interruption, or storage failures.
    pub fn update_task(&self, ctx: &OpContext, id: TaskId, update: &TaskUpdate) -> Result<Task> {
        let mut task = task_in_scope(self.conn, ctx, id)?;
        if let Some(title) = &update.title {
            validate::title(title)?.clone_into(&mut task.title);
        }
        if let Some(description) = &update.description {
            validate::description(description)?.clone_into(&mut task.description);
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(task_type) = update.task_type {
            task.task_type = task_type;
        }

        ctx.check("update task fields")?;
        tasks::update_fields(
            self.conn,
            id,
            &task.title,
            &task.description,
            task.priority,
            task.task_type,
        )?;
        task_in_scope(self.conn, ctx, id)
    }

    /// # Errors
    ///
    /// Lookup failures.
    pub fn get_task(&self, ctx: &OpContext, id: TaskId) -> Result<Task> {
        task_in_scope(self.conn, ctx, id)
    }

    /// A task with its column, relations, labels and comments.
    ///
    /// # Errors
    ///
    /// Lookup or storage failures.
    pub fn task_details(&self, ctx: &OpContext, id: TaskId) -> Result<TaskDetails> {
        let task = task_in_scope(self.conn, ctx, id)?;
        let column = column_in_scope(self.conn, ctx, task.column_id)?;
        Ok(TaskDetails {
            blocked: relations::has_edge_from(self.conn, id, RelationKind::Blocking)?,
            relations: relations::list_edges_for_task(self.conn, id)?,
            neighbours: graph::neighbours(self.conn, ctx, id)?,
            labels: labels::labels_for_task(self.conn, id)?,
            comments: comments::comments_for_task(self.conn, id, None, None)?,
            task,
            column,
        })
    }

    /// Tasks of the project, or of one column, in board order.
    ///
    /// # Errors
    ///
    /// Lookup or storage failures.
    pub fn list_tasks(
        &self,
        ctx: &OpContext,
        column: Option<ColumnId>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Task>> {
        project_in_scope(self.conn, ctx)?;
        if let Some(id) = column {
            column_in_scope(self.conn, ctx, id)?;
        }
        let filter = tasks::TaskFilter {
            project_id: Some(ctx.project()),
            column_id: column,
            limit,
            offset,
            ..tasks::TaskFilter::default()
        };
        Ok(tasks::list_tasks(self.conn, &filter)?)
    }

    /// Delete a task with its relation edges, label attachments and
    /// comments, then renumber the rest of its column. Tasks on the other
    /// end of its edges are untouched.
    ///
    /// # Errors
    ///
    /// Lookup, interruption, or storage failures.
    pub fn delete_task(&self, ctx: &OpContext, id: TaskId) -> Result<Task> {
        let task = task_in_scope(self.conn, ctx, id)?;
        db::atomically(self.conn, |tx| -> Result<()> {
            ctx.check("delete task relations")?;
            relations::delete_edges_touching(tx, id)?;
            ctx.check("detach task labels")?;
            labels::detach_all(tx, id)?;
            ctx.check("delete task comments")?;
            comments::delete_comments_for_task(tx, id)?;
            ctx.check("delete task row")?;
            tasks::delete_task_row(tx, id)?;
            tasks::close_gap(tx, task.column_id, task.position)?;
            Ok(())
        })?;
        debug!(task = %id, column = %task.column_id, "deleted task");
        Ok(task)
    }

    // -----------------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------------

    /// Move to a column by case-insensitive name. Already there is success
    /// with [`MoveOutcome::AlreadyIn`].
    ///
    /// # Errors
    ///
    /// [`LanesError::NameNotFound`] or relocation failures.
    pub fn move_to_column_named(&self, ctx: &OpContext, id: TaskId, name: &str) -> Result<MoveOutcome> {
        let column = columns::find_by_name(self.conn, ctx, name)?;
        positions::move_to_column(self.conn, ctx, id, column.id)
    }

    /// Move to the column designated for `role`.
    ///
    /// # Errors
    ///
    /// [`LanesError::NoRoleColumnConfigured`] when no column holds the role;
    /// [`LanesError::AlreadyInTargetColumn`] (benign) when the task is there.
    pub fn move_to_role(&self, ctx: &OpContext, id: TaskId, role: ColumnRole) -> Result<MoveOutcome> {
        let task = task_in_scope(self.conn, ctx, id)?;
        let column = columns::role_column(self.conn, ctx, role)?
            .ok_or(LanesError::NoRoleColumnConfigured(role))?;
        if task.column_id == column.id {
            return Err(LanesError::AlreadyInTargetColumn {
                column: column.name,
            });
        }
        positions::relocate(self.conn, ctx, &task, column.id)
    }

    /// # Errors
    ///
    /// See [`positions::move_to_column`].
    pub fn move_to_column(&self, ctx: &OpContext, id: TaskId, column: ColumnId) -> Result<MoveOutcome> {
        positions::move_to_column(self.conn, ctx, id, column)
    }

    /// # Errors
    ///
    /// [`LanesError::NoNextColumn`] from the tail column.
    pub fn move_next(&self, ctx: &OpContext, id: TaskId) -> Result<MoveOutcome> {
        positions::move_to_next(self.conn, ctx, id)
    }

    /// # Errors
    ///
    /// [`LanesError::NoPrevColumn`] from the head column.
    pub fn move_prev(&self, ctx: &OpContext, id: TaskId) -> Result<MoveOutcome> {
        positions::move_to_prev(self.conn, ctx, id)
    }

    /// # Errors
    ///
    /// [`LanesError::AlreadyFirst`] at the top of the column.
    pub fn swap_up(&self, ctx: &OpContext, id: TaskId) -> Result<Task> {
        positions::swap_up(self.conn, ctx, id)
    }

    /// # Errors
    ///
    /// [`LanesError::AlreadyLast`] at the bottom of the column.
    pub fn swap_down(&self, ctx: &OpContext, id: TaskId) -> Result<Task> {
        positions::swap_down(self.conn, ctx, id)
    }

    // -----------------------------------------------------------------------
    // Relations
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// See [`graph::add_edge`].
    pub fn link(
        &self,
        ctx: &OpContext,
        from: TaskId,
        to: TaskId,
        kind: RelationKind,
    ) -> Result<Option<RelationKind>> {
        graph::add_edge(self.conn, ctx, from, to, kind)
    }

    /// # Errors
    ///
    /// See [`graph::remove_edge`].
    pub fn unlink(&self, ctx: &OpContext, from: TaskId, to: TaskId) -> Result<bool> {
        graph::remove_edge(self.conn, ctx, from, to)
    }

    /// # Errors
    ///
    /// See [`graph::edges_for`].
    pub fn relations_for(&self, ctx: &OpContext, id: TaskId) -> Result<Vec<Relation>> {
        graph::edges_for(self.conn, ctx, id)
    }

    /// # Errors
    ///
    /// See [`graph::neighbours`].
    pub fn neighbours(&self, ctx: &OpContext, id: TaskId) -> Result<Neighbours> {
        graph::neighbours(self.conn, ctx, id)
    }

    // -----------------------------------------------------------------------
    // Labels and comments
    // -----------------------------------------------------------------------

    /// Attach a label by name, creating it in the project if needed.
    ///
    /// # Errors
    ///
    /// Validation, lookup, or storage failures.
    pub fn add_label(&self, ctx: &OpContext, id: TaskId, name: &str) -> Result<Label> {
        task_in_scope(self.conn, ctx, id)?;
        let name = validate::name("label", name)?;
        db::atomically(self.conn, |tx| -> Result<Label> {
            ctx.check("attach label")?;
            let label = labels::ensure_label(tx, ctx.project(), name)?;
            labels::attach(tx, id, label.id)?;
            Ok(label)
        })
    }

    /// Detach a label by name. Returns whether it was attached.
    ///
    /// # Errors
    ///
    /// [`LanesError::NameNotFound`] for a label the project does not have.
    pub fn remove_label(&self, ctx: &OpContext, id: TaskId, name: &str) -> Result<bool> {
        task_in_scope(self.conn, ctx, id)?;
        let label = labels::find_label(self.conn, ctx.project(), name)?.ok_or_else(|| {
            LanesError::NameNotFound {
                entity: LabelId::LABEL,
                name: name.trim().to_string(),
            }
        })?;
        ctx.check("detach label")?;
        Ok(labels::detach(self.conn, id, label.id)?)
    }

    /// # Errors
    ///
    /// Lookup or storage failures.
    pub fn labels_for(&self, ctx: &OpContext, id: TaskId) -> Result<Vec<Label>> {
        task_in_scope(self.conn, ctx, id)?;
        Ok(labels::labels_for_task(self.conn, id)?)
    }

    /// # Errors
    ///
    /// Validation, lookup, or storage failures.
    pub fn add_comment(&self, ctx: &OpContext, id: TaskId, body: &str) -> Result<Comment> {
        task_in_scope(self.conn, ctx, id)?;
        let body = validate::comment(body)?;
        ctx.check("insert comment")?;
        Ok(comments::insert_comment(self.conn, id, body)?)
    }

    /// Comments on a task, newest first.
    ///
    /// # Errors
    ///
    /// Lookup or storage failures.
    pub fn comments_for(
        &self,
        ctx: &OpContext,
        id: TaskId,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Comment>> {
        task_in_scope(self.conn, ctx, id)?;
        Ok(comments::comments_for_task(self.conn, id, limit, offset)?)
    }

    // -----------------------------------------------------------------------
    // Derived sets and checks
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Storage failures.
    pub fn ready_tasks(&self, ctx: &OpContext) -> Result<Vec<Task>> {
        blocking::ready_set(self.conn, ctx)
    }

    /// # Errors
    ///
    /// Storage failures.
    pub fn blocked_tasks(&self, ctx: &OpContext) -> Result<Vec<BlockedTask>> {
        blocking::blocked_set(self.conn, ctx)
    }

    /// # Errors
    ///
    /// Lookup or storage failures.
    pub fn is_blocked(&self, ctx: &OpContext, id: TaskId) -> Result<bool> {
        blocking::is_blocked(self.conn, ctx, id)
    }

    /// # Errors
    ///
    /// Storage failures.
    pub fn check_integrity(&self, ctx: &OpContext) -> Result<IntegrityReport> {
        project_in_scope(self.conn, ctx)?;
        integrity::check_project(self.conn, ctx.project())
    }
}
