//! Persisted column sequence.
//!
//! Each operation loads the project's chain, applies the splice in memory
//! through [`ColumnChain`], then writes back only the links that changed,
//! all inside one transaction.

use rusqlite::Connection;
use tracing::debug;

use super::chain::{ColumnChain, Link};
use super::{column_in_scope, project_in_scope};
use crate::context::OpContext;
use crate::db::{self, columns as store};
use crate::error::{LanesError, Result};
use crate::model::{Column, ColumnId, ColumnRole, ColumnRoles, ProjectId};
use crate::validate;

const COLUMN_NAME: &str = "column name";

/// Load and validate a project's chain.
///
/// # Errors
///
/// [`LanesError::CorruptChain`] when the stored pointers are malformed.
pub fn load_chain(conn: &Connection, project: ProjectId) -> Result<(ColumnChain, Vec<Column>)> {
    let columns = store::list_project_columns(conn, project)?;
    let chain = ColumnChain::from_columns(&columns)?;
    Ok((chain, columns))
}

fn write_links(conn: &Connection, changed: &[(ColumnId, Link)]) -> Result<()> {
    for (id, link) in changed {
        store::update_links(conn, *id, link.prev, link.next)?;
    }
    Ok(())
}

fn ensure_unique_name(
    conn: &Connection,
    project: ProjectId,
    name: &str,
    except: Option<ColumnId>,
) -> Result<()> {
    match store::find_column_by_name(conn, project, name)? {
        Some(existing) if Some(existing.id) != except => Err(LanesError::DuplicateName {
            entity: ColumnId::LABEL,
            name: name.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Create a column and splice it in after `after`, or append it at the
/// tail. Requested roles move to the new column from wherever they were.
///
/// # Errors
///
/// Validation errors for the name or anchor, [`LanesError::DuplicateName`],
/// interruption, or storage failures. Nothing is written on error.
pub fn insert_after(
    conn: &Connection,
    ctx: &OpContext,
    name: &str,
    after: Option<ColumnId>,
    roles: ColumnRoles,
) -> Result<Column> {
    let project = project_in_scope(conn, ctx)?.id;
    let name = validate::name(COLUMN_NAME, name)?;
    if let Some(after) = after {
        column_in_scope(conn, ctx, after)?;
    }
    ensure_unique_name(conn, project, name, None)?;

    let column = db::atomically(conn, |tx| -> Result<Column> {
        let (mut chain, _) = load_chain(tx, project)?;
        ctx.check("insert column row")?;
        let row = store::insert_column_row(tx, project, name)?;

        ctx.check("splice column")?;
        let changed = chain.insert_after(row.id, after)?;
        write_links(tx, &changed)?;

        for role in roles.iter() {
            ctx.check("assign column role")?;
            store::clear_role(tx, project, role)?;
            store::set_role_flag(tx, row.id, role, true)?;
        }

        store::get_column(tx, row.id)?.ok_or(LanesError::not_found(ColumnId::LABEL, row.id.get()))
    })?;

    debug!(
        column = %column.id,
        project = %project,
        prev = ?column.prev_id,
        next = ?column.next_id,
        "inserted column"
    );
    Ok(column)
}

/// Remove an empty column and join its neighbours.
///
/// # Errors
///
/// [`LanesError::ColumnNotEmpty`] while tasks remain in the column.
pub fn remove(conn: &Connection, ctx: &OpContext, id: ColumnId) -> Result<Column> {
    let column = column_in_scope(conn, ctx, id)?;
    let tasks = db::tasks::count_in_column(conn, id)?;
    if tasks > 0 {
        return Err(LanesError::ColumnNotEmpty {
            column: column.name,
            tasks: usize::try_from(tasks).unwrap_or(usize::MAX),
        });
    }

    db::atomically(conn, |tx| -> Result<()> {
        let (mut chain, _) = load_chain(tx, column.project_id)?;
        ctx.check("unsplice column")?;
        let changed = chain.remove(id)?;
        write_links(tx, &changed)?;

        ctx.check("delete column row")?;
        store::update_links(tx, id, None, None)?;
        store::delete_column_row(tx, id)?;
        Ok(())
    })?;

    debug!(column = %id, project = %column.project_id, "removed column");
    Ok(column)
}

/// Column after `id`, if any. Follows the stored pointer directly.
///
/// # Errors
///
/// Lookup or storage failures.
pub fn next(conn: &Connection, ctx: &OpContext, id: ColumnId) -> Result<Option<Column>> {
    let column = column_in_scope(conn, ctx, id)?;
    neighbour(conn, column.next_id)
}

/// Column before `id`, if any.
///
/// # Errors
///
/// Lookup or storage failures.
pub fn prev(conn: &Connection, ctx: &OpContext, id: ColumnId) -> Result<Option<Column>> {
    let column = column_in_scope(conn, ctx, id)?;
    neighbour(conn, column.prev_id)
}

fn neighbour(conn: &Connection, id: Option<ColumnId>) -> Result<Option<Column>> {
    match id {
        Some(id) => Ok(Some(store::get_column(conn, id)?.ok_or_else(|| {
            LanesError::CorruptChain(format!("link points at missing column {id}"))
        })?)),
        None => Ok(None),
    }
}

/// The project's columns from head to tail.
///
/// # Errors
///
/// [`LanesError::CorruptChain`] or storage failures.
pub fn list(conn: &Connection, ctx: &OpContext) -> Result<Vec<Column>> {
    let project = project_in_scope(conn, ctx)?;
    let (chain, columns) = load_chain(conn, project.id)?;
    let mut by_id: std::collections::HashMap<ColumnId, Column> =
        columns.into_iter().map(|c| (c.id, c)).collect();
    Ok(chain.iter().filter_map(|id| by_id.remove(&id)).collect())
}

/// Case-insensitive lookup by name.
///
/// # Errors
///
/// [`LanesError::NameNotFound`] when no column matches.
pub fn find_by_name(conn: &Connection, ctx: &OpContext, name: &str) -> Result<Column> {
    let project = project_in_scope(conn, ctx)?;
    store::find_column_by_name(conn, project.id, name)?.ok_or_else(|| {
        LanesError::NameNotFound {
            entity: ColumnId::LABEL,
            name: name.trim().to_string(),
        }
    })
}

/// Rename a column, keeping names unique within the project.
///
/// # Errors
///
/// Validation errors, [`LanesError::DuplicateName`], or lookup failures.
pub fn rename(conn: &Connection, ctx: &OpContext, id: ColumnId, name: &str) -> Result<Column> {
    let mut column = column_in_scope(conn, ctx, id)?;
    let name = validate::name(COLUMN_NAME, name)?;
    ensure_unique_name(conn, ctx.project(), name, Some(id))?;
    ctx.check("rename column")?;
    store::rename_column(conn, id, name)?;
    name.clone_into(&mut column.name);
    Ok(column)
}

/// Designate `column` as the single holder of `role`, or clear the role
/// when `column` is `None`.
///
/// # Errors
///
/// Lookup, interruption, or storage failures.
pub fn set_role(
    conn: &Connection,
    ctx: &OpContext,
    role: ColumnRole,
    column: Option<ColumnId>,
) -> Result<Option<Column>> {
    let project = project_in_scope(conn, ctx)?.id;
    if let Some(id) = column {
        column_in_scope(conn, ctx, id)?;
    }

    db::atomically(conn, |tx| -> Result<()> {
        ctx.check("clear column role")?;
        store::clear_role(tx, project, role)?;
        if let Some(id) = column {
            ctx.check("set column role")?;
            store::set_role_flag(tx, id, role, true)?;
        }
        Ok(())
    })?;

    debug!(%role, project = %project, column = ?column, "column role updated");
    role_column(conn, ctx, role)
}

/// The column holding `role`, if one is designated.
///
/// # Errors
///
/// Storage failures.
pub fn role_column(conn: &Connection, ctx: &OpContext, role: ColumnRole) -> Result<Option<Column>> {
    let project = project_in_scope(conn, ctx)?;
    Ok(store::role_column(conn, project.id, role)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, projects::insert_project};

    fn setup() -> (Connection, OpContext) {
        let conn = open_in_memory().expect("db");
        let project = insert_project(&conn, "p", "").expect("project");
        (conn, OpContext::new(project.id))
    }

    fn names(conn: &Connection, ctx: &OpContext) -> Vec<String> {
        list(conn, ctx)
            .expect("list")
            .into_iter()
            .map(|c| c.name)
            .collect()
    }

    #[test]
    fn append_and_splice_keep_chain_order() {
        let (conn, ctx) = setup();
        let todo = insert_after(&conn, &ctx, "Todo", None, ColumnRoles::none()).expect("todo");
        insert_after(&conn, &ctx, "Done", None, ColumnRoles::none()).expect("done");
        insert_after(&conn, &ctx, "Doing", Some(todo.id), ColumnRoles::none()).expect("doing");

        assert_eq!(names(&conn, &ctx), vec!["Todo", "Doing", "Done"]);
    }

    #[test]
    fn remove_middle_relinks_neighbours() {
        let (conn, ctx) = setup();
        let a = insert_after(&conn, &ctx, "A", None, ColumnRoles::none()).expect("a");
        let mid = insert_after(&conn, &ctx, "Mid", None, ColumnRoles::none()).expect("mid");
        let b = insert_after(&conn, &ctx, "B", None, ColumnRoles::none()).expect("b");

        remove(&conn, &ctx, mid.id).expect("remove");
        assert_eq!(next(&conn, &ctx, a.id).expect("next").map(|c| c.id), Some(b.id));
        assert_eq!(prev(&conn, &ctx, b.id).expect("prev").map(|c| c.id), Some(a.id));
        assert!(prev(&conn, &ctx, a.id).expect("prev of head").is_none());
        assert!(next(&conn, &ctx, b.id).expect("next of tail").is_none());
    }

    #[test]
    fn remove_refuses_non_empty_column() {
        let (conn, ctx) = setup();
        let col = insert_after(&conn, &ctx, "Todo", None, ColumnRoles::none()).expect("col");
        conn.execute(
            "INSERT INTO tasks (column_id, title, position, created_at_us, updated_at_us)
             VALUES (?1, 'x', 0, 0, 0)",
            [col.id.get()],
        )
        .expect("task");

        let err = remove(&conn, &ctx, col.id).expect_err("not empty");
        assert!(matches!(err, LanesError::ColumnNotEmpty { tasks: 1, .. }));
        assert_eq!(names(&conn, &ctx), vec!["Todo"]);
    }

    #[test]
    fn duplicate_names_rejected_case_insensitively() {
        let (conn, ctx) = setup();
        insert_after(&conn, &ctx, "Todo", None, ColumnRoles::none()).expect("todo");
        let err = insert_after(&conn, &ctx, " todo ", None, ColumnRoles::none()).expect_err("dup");
        assert!(matches!(err, LanesError::DuplicateName { .. }));
    }

    #[test]
    fn roles_move_between_columns() {
        let (conn, ctx) = setup();
        let backlog = insert_after(&conn, &ctx, "Backlog", None, ColumnRoles::only(ColumnRole::Ready))
            .expect("backlog");
        assert!(backlog.roles.has(ColumnRole::Ready));

        let todo =
            insert_after(&conn, &ctx, "Todo", None, ColumnRoles::only(ColumnRole::Ready)).expect("todo");
        let ready = role_column(&conn, &ctx, ColumnRole::Ready).expect("role").expect("some");
        assert_eq!(ready.id, todo.id);

        set_role(&conn, &ctx, ColumnRole::Ready, Some(backlog.id)).expect("set");
        let ready = role_column(&conn, &ctx, ColumnRole::Ready).expect("role").expect("some");
        assert_eq!(ready.id, backlog.id);

        assert!(set_role(&conn, &ctx, ColumnRole::Ready, None).expect("clear").is_none());
    }

    #[test]
    fn rename_and_find() {
        let (conn, ctx) = setup();
        let col = insert_after(&conn, &ctx, "Todo", None, ColumnRoles::none()).expect("col");
        insert_after(&conn, &ctx, "Done", None, ColumnRoles::none()).expect("done");

        assert!(matches!(
            rename(&conn, &ctx, col.id, "done"),
            Err(LanesError::DuplicateName { .. })
        ));
        rename(&conn, &ctx, col.id, "TODO").expect("case-only rename of itself");
        assert_eq!(find_by_name(&conn, &ctx, "todo").expect("find").id, col.id);
        assert!(matches!(
            find_by_name(&conn, &ctx, "missing"),
            Err(LanesError::NameNotFound { .. })
        ));
    }

    #[test]
    fn other_project_columns_are_out_of_scope() {
        let (conn, ctx) = setup();
        let other = insert_project(&conn, "other", "").expect("other");
        let other_ctx = ctx.for_project(other.id);
        let foreign =
            insert_after(&conn, &other_ctx, "Todo", None, ColumnRoles::none()).expect("foreign");

        let err = insert_after(&conn, &ctx, "Mine", Some(foreign.id), ColumnRoles::none())
            .expect_err("cross project");
        assert!(matches!(err, LanesError::CrossProject { .. }));
        assert!(names(&conn, &ctx).is_empty());
    }
}
