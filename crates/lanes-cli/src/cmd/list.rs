//! `lanes list`: tasks in board order.

use clap::Args;

use super::{Globals, Session, TaskView, resolve_column};
use crate::output::render_list;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only this column (id or name).
    #[arg(long, short)]
    pub column: Option<String>,

    #[arg(long, short = 'n')]
    pub limit: Option<u32>,

    #[arg(long)]
    pub offset: Option<u32>,
}

pub fn run_list(args: &ListArgs, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let board = session.board();
    let ctx = session.context()?;

    let column = args
        .column
        .as_deref()
        .map(|key| resolve_column(&board, &ctx, key))
        .transpose()?
        .map(|c| c.id);
    let tasks = board.list_tasks(&ctx, column, args.limit, args.offset)?;
    render_list(&TaskView::collect(&board, &ctx, tasks)?, session.output())
}
