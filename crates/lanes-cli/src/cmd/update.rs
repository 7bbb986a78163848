//! `lanes update`: edit a task's fields.

use clap::Args;
use lanes_core::{Priority, TaskId, TaskType, TaskUpdate};

use super::{Globals, Session, TaskView};
use crate::output::render_item;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: TaskId,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, short)]
    pub description: Option<String>,

    #[arg(long, short)]
    pub priority: Option<Priority>,

    #[arg(long = "type", short = 't')]
    pub task_type: Option<TaskType>,
}

pub fn run_update(args: &UpdateArgs, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let board = session.board();
    let ctx = session.context()?;

    let task = board.update_task(
        &ctx,
        args.id,
        &TaskUpdate {
            title: args.title.clone(),
            description: args.description.clone(),
            priority: args.priority,
            task_type: args.task_type,
        },
    )?;
    let mut views = TaskView::collect(&board, &ctx, vec![task])?;
    render_item(&views.remove(0), session.output())
}
