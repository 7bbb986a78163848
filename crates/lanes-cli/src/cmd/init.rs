//! `lanes init`: create the database and a first project.

use clap::Args;
use serde::Serialize;

use super::{Globals, Session};
use crate::output::{pretty_kv, render};
use lanes_core::{LanesError, Project};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Name of the first project.
    #[arg(long, default_value = "default")]
    pub name: String,

    /// Create the project without the Todo / In Progress / Done columns.
    #[arg(long)]
    pub empty: bool,
}

#[derive(Serialize)]
struct InitReport {
    project: Project,
    created: bool,
    columns: Vec<String>,
}

pub fn run_init(args: &InitArgs, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::create(globals)?;
    let board = session.board();

    let (project, created) = match board.find_project(&args.name) {
        Ok(project) => (project, false),
        Err(LanesError::NameNotFound { .. }) if args.empty => {
            (board.create_project(&args.name, "")?, true)
        }
        Err(LanesError::NameNotFound { .. }) => (
            board.create_project_with_defaults(&args.name, "", session.op_timeout())?,
            true,
        ),
        Err(err) => return Err(err.into()),
    };
    let ctx = session.context_for(project.id);
    let columns = board
        .list_columns(&ctx)?
        .into_iter()
        .map(|c| c.name)
        .collect();

    let report = InitReport {
        project,
        created,
        columns,
    };
    render(session.output(), &report, |r, w| {
        if r.created {
            writeln!(w, "✓ initialized project '{}'", r.project.name)?;
        } else {
            writeln!(w, "project '{}' already exists", r.project.name)?;
        }
        if !r.columns.is_empty() {
            pretty_kv(w, "columns", r.columns.join(" → "))?;
        }
        Ok(())
    })
}
