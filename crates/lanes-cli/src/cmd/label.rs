//! `lanes label`: attach and detach project labels.

use clap::{Args, Subcommand};
use lanes_core::{Label, TaskId};

use super::{Globals, Session};
use crate::output::render;

#[derive(Subcommand, Debug)]
pub enum LabelCommand {
    /// Attach labels, creating them in the project as needed.
    Add(LabelArgs),
    /// Detach labels.
    Rm(LabelArgs),
    /// Labels on a task.
    List(TaskArg),
}

#[derive(Args, Debug)]
pub struct LabelArgs {
    pub id: TaskId,
    #[arg(required = true)]
    pub labels: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TaskArg {
    pub id: TaskId,
}

fn render_labels(session: &Session, id: TaskId, labels: &[Label]) -> anyhow::Result<()> {
    render(session.output(), &labels, |labels, w| {
        if labels.is_empty() {
            return writeln!(w, "#{id} has no labels");
        }
        let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
        writeln!(w, "#{id}: {}", names.join(", "))
    })
}

pub fn run_label(command: &LabelCommand, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let board = session.board();
    let ctx = session.context()?;

    let id = match command {
        LabelCommand::Add(args) => {
            for name in &args.labels {
                board.add_label(&ctx, args.id, name)?;
            }
            args.id
        }
        LabelCommand::Rm(args) => {
            for name in &args.labels {
                board.remove_label(&ctx, args.id, name)?;
            }
            args.id
        }
        LabelCommand::List(args) => args.id,
    };
    render_labels(&session, id, &board.labels_for(&ctx, id)?)
}
