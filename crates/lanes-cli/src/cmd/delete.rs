//! `lanes delete`: remove a task with its relations, labels and comments.

use clap::Args;
use lanes_core::TaskId;

use super::{Globals, Session};
use crate::output::render_success;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: TaskId,
}

pub fn run_delete(args: &DeleteArgs, globals: &Globals) -> anyhow::Result<()> {
    let session = Session::open(globals)?;
    let ctx = session.context()?;
    let task = session.board().delete_task(&ctx, args.id)?;
    render_success(
        session.output(),
        &format!("deleted task #{} '{}'", task.id, task.title),
    )
}
