//! `lanes column`: manage the column chain and role designations.

use clap::{Args, Subcommand};
use lanes_core::{ColumnRole, ColumnRoles};

use super::{Globals, Session, resolve_column};
use crate::output::{render_item, render_list, render_success};

#[derive(Subcommand, Debug)]
pub enum ColumnCommand {
    /// Add a column at the end, or after another column.
    Add(AddArgs),
    /// List columns in board order.
    List,
    /// Remove an empty column.
    Rm(ColumnRef),
    /// Rename a column.
    Rename(RenameArgs),
    /// Designate the column for a role, or clear the role with `none`.
    Role(RoleArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub name: String,

    /// Insert after this column (id or name) instead of at the end.
    #[arg(long)]
    pub after: Option<String>,

    /// Roles to move to the new column (ready, in_progress, completed).
    #[arg(long = "role")]
    pub roles: Vec<ColumnRole>,
}

#[derive(Args, Debug)]
pub struct ColumnRef {
    /// Column id or name.
    pub column: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Column id or name.
    pub column: String,
    pub name: String,
}

#[derive(Args, Debug)]
pub struct RoleArgs {
    /// ready, in_progress or completed.
    pub role: ColumnRole,
    /// Column id or name; `none` clears the role.
    pub column: String,
}

pub fn run_column(command: &ColumnCommand, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let board = session.board();
    let ctx = session.context()?;
    let output = session.output();

    match command {
        ColumnCommand::Add(args) => {
            let after = args
                .after
                .as_deref()
                .map(|key| resolve_column(&board, &ctx, key))
                .transpose()?
                .map(|c| c.id);
            let mut roles = ColumnRoles::none();
            for role in &args.roles {
                roles.set(*role, true);
            }
            let column = board.create_column(&ctx, &args.name, after, roles)?;
            render_item(&column, output)
        }
        ColumnCommand::List => render_list(&board.list_columns(&ctx)?, output),
        ColumnCommand::Rm(target) => {
            let column = resolve_column(&board, &ctx, &target.column)?;
            board.delete_column(&ctx, column.id)?;
            render_success(output, &format!("removed column '{}'", column.name))
        }
        ColumnCommand::Rename(args) => {
            let column = resolve_column(&board, &ctx, &args.column)?;
            let renamed = board.rename_column(&ctx, column.id, &args.name)?;
            render_item(&renamed, output)
        }
        ColumnCommand::Role(args) => {
            let target = if args.column.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(resolve_column(&board, &ctx, &args.column)?.id)
            };
            match board.set_column_role(&ctx, args.role, target)? {
                Some(column) => render_success(
                    output,
                    &format!("'{}' now holds the {} role", column.name, args.role),
                ),
                None => render_success(output, &format!("cleared the {} role", args.role)),
            }
        }
    }
}
