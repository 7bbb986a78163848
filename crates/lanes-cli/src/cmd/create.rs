//! `lanes create`: add a task, optionally wired into the relation graph.

use clap::Args;
use lanes_core::{NewTask, Priority, TaskId, TaskType};

use super::{Globals, Session, TaskView, resolve_column};
use crate::output::render_item;

#[derive(Args, Debug)]
pub struct CreateArgs {
    pub title: String,

    #[arg(long, short, default_value = "")]
    pub description: String,

    /// Target column (id or name). Defaults to the ready column.
    #[arg(long, short)]
    pub column: Option<String>,

    #[arg(long, short, default_value = "medium")]
    pub priority: Priority,

    #[arg(long = "type", short = 't', default_value = "task")]
    pub task_type: TaskType,

    /// Parent task; repeatable.
    #[arg(long = "parent")]
    pub parents: Vec<TaskId>,

    /// Task the new one waits on; repeatable.
    #[arg(long = "blocked-by")]
    pub blocked_by: Vec<TaskId>,

    /// Task that waits on the new one; repeatable.
    #[arg(long = "blocks")]
    pub blocks: Vec<TaskId>,
}

pub fn run_create(args: &CreateArgs, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let board = session.board();
    let ctx = session.context()?;

    let column = args
        .column
        .as_deref()
        .map(|key| resolve_column(&board, &ctx, key))
        .transpose()?
        .map(|c| c.id);

    let task = board.create_task(
        &ctx,
        &NewTask {
            column,
            title: args.title.clone(),
            description: args.description.clone(),
            priority: args.priority,
            task_type: args.task_type,
            parent_ids: args.parents.clone(),
            blocked_by_ids: args.blocked_by.clone(),
            blocks_ids: args.blocks.clone(),
        },
    )?;

    let mut views = TaskView::collect(&board, &ctx, vec![task])?;
    render_item(&views.remove(0), session.output())
}
