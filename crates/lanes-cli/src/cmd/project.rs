//! `lanes project`: add, list and remove projects.

use clap::{Args, Subcommand};

use super::{Globals, Session};
use crate::output::{render_item, render_list, render_success};

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project (with Todo / In Progress / Done unless --empty).
    Add(AddArgs),
    /// List projects.
    List,
    /// Delete a project with all of its columns, tasks and labels.
    Rm(RmArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub name: String,

    #[arg(long, short, default_value = "")]
    pub description: String,

    /// Skip the default columns.
    #[arg(long)]
    pub empty: bool,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Project id or name.
    pub project: String,
}

pub fn run_project(command: &ProjectCommand, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let board = session.board();
    let output = session.output();

    match command {
        ProjectCommand::Add(args) => {
            let project = if args.empty {
                board.create_project(&args.name, &args.description)?
            } else {
                board.create_project_with_defaults(
                    &args.name,
                    &args.description,
                    session.op_timeout(),
                )?
            };
            render_item(&project, output)
        }
        ProjectCommand::List => render_list(&board.list_projects()?, output),
        ProjectCommand::Rm(args) => {
            let project = board.find_project(&args.project)?;
            let ctx = session.context_for(project.id);
            board.delete_project(&ctx)?;
            render_success(output, &format!("deleted project '{}'", project.name))
        }
    }
}
